//! Ring buffer for grain accumulation.

// -------------------------------------------------------------------------------------------------

/// Fixed capacity mono sample ring buffer with independent read and write cursors.
///
/// Used as input buffer, from which grains are peeked, and as output buffer, into which
/// resampled grains are overlap-added. The storage can be re-dimensioned to any capacity up to
/// the maximum capacity it got created with, without reallocating.
#[derive(Debug, Clone)]
pub struct CircularSampleBuffer {
    buffer: Vec<f32>,
    max_capacity: usize,
    write_pos: usize,
    read_pos: usize,
    available: usize,
}

impl CircularSampleBuffer {
    /// Create a new, silent buffer with the given capacity in samples.
    pub fn new(capacity: usize) -> Self {
        Self::with_max_capacity(capacity, capacity)
    }

    /// Create a new, silent buffer with the given capacity, which can later be resized up to
    /// `max_capacity` samples without allocating.
    pub fn with_max_capacity(capacity: usize, max_capacity: usize) -> Self {
        assert!(capacity > 0, "Invalid buffer capacity");
        assert!(capacity <= max_capacity, "Capacity exceeds max capacity");
        let mut buffer = Vec::with_capacity(max_capacity);
        buffer.resize(capacity, 0.0);
        Self {
            buffer,
            max_capacity,
            write_pos: 0,
            read_pos: 0,
            available: 0,
        }
    }

    /// Buffer size in samples.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Max buffer size in samples this buffer can be resized to without allocating.
    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    /// Number of written, but not yet read or skipped samples.
    #[inline]
    pub fn available(&self) -> usize {
        self.available
    }

    #[inline]
    pub fn write_pos(&self) -> usize {
        self.write_pos
    }

    #[inline]
    pub fn read_pos(&self) -> usize {
        self.read_pos
    }

    /// Change the buffer's capacity and clear it. The new capacity must not exceed the
    /// buffer's max capacity.
    pub fn resize(&mut self, capacity: usize) {
        assert!(capacity > 0, "Invalid buffer capacity");
        assert!(capacity <= self.max_capacity, "Capacity exceeds max capacity");
        self.buffer.clear();
        self.buffer.resize(capacity, 0.0);
        self.write_pos = 0;
        self.read_pos = 0;
        self.available = 0;
    }

    /// Fill the buffer with silence and rewind all cursors.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
        self.read_pos = 0;
        self.available = 0;
    }

    /// Copy the given samples into the buffer at the write cursor and advance it.
    pub fn write(&mut self, samples: &[f32]) {
        let capacity = self.capacity();
        debug_assert!(
            self.available + samples.len() <= capacity,
            "Ring buffer overflow"
        );
        let first = (capacity - self.write_pos).min(samples.len());
        let (head, tail) = samples.split_at(first);
        self.buffer[self.write_pos..self.write_pos + first].copy_from_slice(head);
        self.buffer[..tail.len()].copy_from_slice(tail);
        self.write_pos = (self.write_pos + samples.len()) % capacity;
        self.available += samples.len();
    }

    /// Add the given samples to the existing buffer content, starting `offset` samples ahead
    /// of the write cursor. Does not move the write cursor.
    pub fn accumulate(&mut self, offset: usize, samples: &[f32]) {
        let capacity = self.capacity();
        debug_assert!(offset + samples.len() <= capacity, "Ring buffer overflow");
        let mut pos = (self.write_pos + offset) % capacity;
        for sample in samples {
            self.buffer[pos] += *sample;
            pos += 1;
            if pos == capacity {
                pos = 0;
            }
        }
    }

    /// Advance the write cursor by `count` samples, making them available for reading.
    pub fn advance_write(&mut self, count: usize) {
        debug_assert!(
            self.available + count <= self.capacity(),
            "Ring buffer overflow"
        );
        self.write_pos = (self.write_pos + count) % self.capacity();
        self.available += count;
    }

    /// Copy `dest.len()` samples, starting `offset` samples ahead of the read cursor,
    /// multiplied with the given window into `dest`. Does not move the read cursor.
    pub fn peek_windowed(&self, offset: usize, window: &[f32], dest: &mut [f32]) {
        debug_assert!(window.len() >= dest.len(), "Window is too short");
        let capacity = self.capacity();
        let mut pos = (self.read_pos + offset) % capacity;
        for (d, w) in dest.iter_mut().zip(window) {
            *d = self.buffer[pos] * *w;
            pos += 1;
            if pos == capacity {
                pos = 0;
            }
        }
    }

    /// Advance the read cursor by `count` samples without reading them.
    pub fn skip(&mut self, count: usize) {
        debug_assert!(count <= self.available, "Ring buffer underrun");
        let count = count.min(self.available);
        self.read_pos = (self.read_pos + count) % self.capacity();
        self.available -= count;
    }

    /// Read up to `dest.len()` available samples into `dest` and advance the read cursor.
    /// Returns the number of samples that got read.
    pub fn read(&mut self, dest: &mut [f32]) -> usize {
        self.read_with(dest, false)
    }

    /// Like [`Self::read`], but also zeroes the consumed slots, so accumulating into them
    /// later on starts from silence.
    pub fn read_and_clear(&mut self, dest: &mut [f32]) -> usize {
        self.read_with(dest, true)
    }

    fn read_with(&mut self, dest: &mut [f32], clear: bool) -> usize {
        let capacity = self.capacity();
        let count = dest.len().min(self.available);
        let first = (capacity - self.read_pos).min(count);
        let (head, tail) = dest[..count].split_at_mut(first);
        let head_range = self.read_pos..self.read_pos + first;
        let tail_range = 0..tail.len();
        head.copy_from_slice(&self.buffer[head_range.clone()]);
        tail.copy_from_slice(&self.buffer[tail_range.clone()]);
        if clear {
            self.buffer[head_range].fill(0.0);
            self.buffer[tail_range].fill(0.0);
        }
        self.read_pos = (self.read_pos + count) % capacity;
        self.available -= count;
        count
    }
}

// -------------------------------------------------------------------------------------------------
