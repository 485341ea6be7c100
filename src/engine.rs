//! Real-time granular pitch shifter.

use std::{sync::Arc, time::Duration};

use crossbeam_queue::ArrayQueue;

use crate::{
    utils::{dsp::circular::CircularSampleBuffer, semitones_to_ratio},
    Error, GrainSize, PitchShiftConfig,
};

pub(crate) mod control;
pub(crate) mod grain;

pub use control::{ControlHandle, ControlMessage};

use control::validate_semitones;
use grain::{GrainProcessor, PrimingState};

// -------------------------------------------------------------------------------------------------

/// Shifts the pitch of a mono audio stream by a fixed ratio without changing its duration.
///
/// Incoming blocks are accumulated in an input ring buffer. Whenever a full grain is buffered,
/// it gets windowed, resampled with the current pitch ratio and overlap-added into an output
/// ring buffer, one hop (a quarter grain) apart. Output is held back as silence until one full
/// grain of output got accumulated. The shifted stream thus is delayed by one grain plus three
/// hops, regardless of the size of the processed blocks. See [`Self::latency_frames`].
///
/// Pitch ratios within [`Self::BYPASS_EPSILON`] of 1 bypass processing entirely and pass the
/// input through without latency.
///
/// Parameters can be changed directly via [`Self::apply_control_message`] or from other
/// threads via a [`ControlHandle`]. Changes are applied between grains, never within.
///
/// NB: all `process_XXX` functions are called in realtime audio threads, so they never block
/// or allocate. All buffers are preallocated for the largest supported grain size.
pub struct PitchShiftEngine {
    config: PitchShiftConfig,
    semitones: f32,
    pitch_ratio: f64,
    input: CircularSampleBuffer,
    output: CircularSampleBuffer,
    grains: GrainProcessor,
    priming: PrimingState,
    control_queue: Arc<ArrayQueue<ControlMessage>>,
    processed_frames: u64,
    // frames fed into the input buffer since the last reset
    written_frames: u64,
}

impl PitchShiftEngine {
    /// Pitch ratios closer than this to 1 bypass processing.
    pub const BYPASS_EPSILON: f64 = 0.001;

    /// Number of control messages which can be pending at once.
    pub const CONTROL_QUEUE_SIZE: usize = 64;

    /// Input buffer size in grains.
    const INPUT_BUFFER_GRAINS: usize = 4;
    /// Output buffer size in grains. Must fit the longest resampled grain plus pending output.
    const OUTPUT_BUFFER_GRAINS: usize = 8;

    /// Blocks are processed in chunks of at most one hop, so a chunk triggers at most one
    /// grain. This caps grain cycles per chunk in case that ever changes.
    const MAX_GRAINS_PER_CHUNK: usize = 2;

    /// Create a new engine with the given configuration.
    pub fn new(config: PitchShiftConfig) -> Result<Self, Error> {
        config.validate()?;
        let grain_size = config.grain_size;
        let max_grain_len = GrainSize::MAX.samples();
        let input = CircularSampleBuffer::with_max_capacity(
            grain_size.samples() * Self::INPUT_BUFFER_GRAINS,
            max_grain_len * Self::INPUT_BUFFER_GRAINS,
        );
        let output = CircularSampleBuffer::with_max_capacity(
            grain_size.samples() * Self::OUTPUT_BUFFER_GRAINS,
            max_grain_len * Self::OUTPUT_BUFFER_GRAINS,
        );
        debug_assert!(
            GrainProcessor::max_resampled_len(GrainSize::MAX) + max_grain_len
                <= output.max_capacity()
        );
        log::debug!(
            "Creating pitch shifter: {} Hz, grain size {}, {} semitones",
            config.sample_rate,
            grain_size,
            config.semitones
        );
        Ok(Self {
            config,
            semitones: config.semitones,
            pitch_ratio: config.pitch_ratio(),
            input,
            output,
            grains: GrainProcessor::new(grain_size),
            priming: PrimingState::default(),
            control_queue: Arc::new(ArrayQueue::new(Self::CONTROL_QUEUE_SIZE)),
            processed_frames: 0,
            written_frames: 0,
        })
    }

    /// Create a new handle to send control messages from other threads.
    pub fn control_handle(&self) -> ControlHandle {
        ControlHandle::new(Arc::clone(&self.control_queue))
    }

    /// The stream's sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    /// Current pitch offset in semitones.
    pub fn semitones(&self) -> f32 {
        self.semitones
    }

    /// Current pitch ratio: `2^(semitones / 12)`.
    pub fn pitch_ratio(&self) -> f64 {
        self.pitch_ratio
    }

    pub fn grain_size(&self) -> GrainSize {
        self.grains.grain_size()
    }

    pub fn hop_size(&self) -> usize {
        self.grain_size().hop_size()
    }

    /// True when the pitch ratio is close enough to 1 to pass audio through unprocessed.
    pub fn is_bypassed(&self) -> bool {
        (self.pitch_ratio - 1.0).abs() < Self::BYPASS_EPSILON
    }

    /// True when enough output got accumulated to emit processed audio.
    pub fn is_primed(&self) -> bool {
        self.priming.is_ready()
    }

    /// Number of buffered input samples which have not yet been consumed by grains.
    pub fn input_available(&self) -> usize {
        self.input.available()
    }

    /// Number of overlap-added output samples which have not yet been emitted.
    pub fn output_available(&self) -> usize {
        self.output.available()
    }

    /// Delay of the output stream in sample frames: the index of the first output frame which
    /// carries processed input. Zero when bypassed.
    pub fn latency_frames(&self) -> usize {
        if self.is_bypassed() {
            0
        } else {
            self.grain_size().latency_frames()
        }
    }

    /// Delay of the output stream.
    pub fn latency(&self) -> Duration {
        self.config.frames_to_duration(self.latency_frames() as u64)
    }

    /// Total number of sample frames processed since creation or the last reset.
    pub fn processed_frames(&self) -> u64 {
        self.processed_frames
    }

    /// Total duration of the audio processed since creation or the last reset.
    pub fn processed_duration(&self) -> Duration {
        self.config.frames_to_duration(self.processed_frames)
    }

    /// Apply a single control message. Invalid messages are logged and ignored.
    pub fn apply_control_message(&mut self, message: ControlMessage) {
        match message {
            ControlMessage::SetPitch(semitones) => self.set_pitch(semitones),
            ControlMessage::SetGrainSize(samples) => match GrainSize::from_samples(samples) {
                Some(grain_size) => self.set_grain_size(grain_size),
                None => log::warn!("Ignoring unsupported grain size: {samples}"),
            },
            ControlMessage::Reset => self.reset(),
        }
    }

    /// Change the pitch offset in semitones. Takes effect with the next grain.
    fn set_pitch(&mut self, semitones: f32) {
        if let Some(semitones) = validate_semitones(semitones) {
            self.semitones = semitones;
            self.pitch_ratio = semitones_to_ratio(semitones);
        } else {
            log::warn!("Ignoring invalid pitch offset: {semitones}");
        }
    }

    /// Change the grain size, resizing all buffers and windows, and reset.
    fn set_grain_size(&mut self, grain_size: GrainSize) {
        log::debug!("Changing pitch shifter grain size to {grain_size}");
        self.grains.set_grain_size(grain_size);
        self.input
            .resize(grain_size.samples() * Self::INPUT_BUFFER_GRAINS);
        self.output
            .resize(grain_size.samples() * Self::OUTPUT_BUFFER_GRAINS);
        self.reset();
    }

    /// Clear all buffers and cursors and restart priming.
    pub fn reset(&mut self) {
        self.input.clear();
        self.output.clear();
        self.priming.reset();
        self.processed_frames = 0;
        self.written_frames = 0;
    }

    /// Apply all pending control messages from [`ControlHandle`]s.
    pub fn process_control_messages(&mut self) {
        while let Some(message) = self.control_queue.pop() {
            self.apply_control_message(message);
        }
    }

    /// Process a single block of mono samples. `input` and `output` must have the same length.
    pub fn process_block(&mut self, input: &[f32], output: &mut [f32]) {
        debug_assert_eq!(input.len(), output.len(), "Block sizes must match");
        Self::assert_no_alloc(|| self.process_block_unchecked(input, output));
    }

    fn process_block_unchecked(&mut self, input: &[f32], output: &mut [f32]) {
        self.process_control_messages();

        let frames = input.len().min(output.len());
        let (input, output) = (&input[..frames], &mut output[..frames]);
        self.processed_frames += frames as u64;

        if self.is_bypassed() {
            output.copy_from_slice(input);
            return;
        }

        let hop_size = self.hop_size();
        for (input_chunk, output_chunk) in input.chunks(hop_size).zip(output.chunks_mut(hop_size))
        {
            self.process_chunk(input_chunk, output_chunk);
        }
    }

    /// Process a single block of planar samples. Only the first input channel gets processed.
    /// Its result is written to all output channels.
    pub fn process_planar(&mut self, input: &[&[f32]], output: &mut [&mut [f32]]) {
        let Some((first_output, other_outputs)) = output.split_first_mut() else {
            return;
        };
        match input.first() {
            Some(first_input) => self.process_block(first_input, first_output),
            None => first_output.fill(0.0),
        }
        for channel in other_outputs {
            let frames = channel.len().min(first_output.len());
            channel[..frames].copy_from_slice(&first_output[..frames]);
        }
    }

    fn process_chunk(&mut self, input: &[f32], output: &mut [f32]) {
        let chunk_start = self.written_frames;
        self.input.write(input);
        self.written_frames += input.len() as u64;

        let grain_len = self.grain_size().samples();
        let mut grains = 0;
        while self.input.available() >= grain_len && grains < Self::MAX_GRAINS_PER_CHUNK {
            self.grains.process(
                &mut self.input,
                &mut self.output,
                self.pitch_ratio,
                &mut self.priming,
            );
            grains += 1;
        }

        if self.priming.is_ready() {
            // the engine primes within the chunk which crosses the latency: keep its head silent
            let latency = self.grain_size().latency_frames() as u64;
            let silent = (latency.saturating_sub(chunk_start) as usize).min(output.len());
            output[..silent].fill(0.0);
            let read = self.output.read_and_clear(&mut output[silent..]);
            output[silent + read..].fill(0.0);
        } else {
            output.fill(0.0);
        }
    }

    fn assert_no_alloc<T, F: FnOnce() -> T>(func: F) -> T {
        #[cfg(feature = "assert-allocs")]
        return assert_no_alloc::assert_no_alloc::<T, F>(func);

        #[cfg(not(feature = "assert-allocs"))]
        return func();
    }
}

// -------------------------------------------------------------------------------------------------
