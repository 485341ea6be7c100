//! Precomputed grain windows.

use std::f64::consts::PI;

// -------------------------------------------------------------------------------------------------

/// Precomputed, symmetric Hann window coefficients for a given length.
///
/// Tables are created with a max length. Rebuilding a table for another length up to the max
/// length reuses the table's memory, so synthesis windows can be adjusted to resampled grain
/// lengths in real-time threads.
#[derive(Debug, Clone)]
pub struct WindowTable {
    coefficients: Vec<f32>,
    max_len: usize,
}

impl WindowTable {
    /// Create a Hann window table with the given length.
    pub fn hann(len: usize) -> Self {
        Self::hann_with_max_len(len, len)
    }

    /// Create a Hann window table with the given length, which can later be rebuilt for any
    /// length up to `max_len` without allocating.
    pub fn hann_with_max_len(len: usize, max_len: usize) -> Self {
        assert!(len <= max_len, "Window length exceeds max length");
        let mut window = Self {
            coefficients: Vec::with_capacity(max_len),
            max_len,
        };
        window.rebuild(len);
        window
    }

    /// Recompute the table for the given length.
    pub fn rebuild(&mut self, len: usize) {
        assert!(len <= self.max_len, "Window length exceeds max length");
        self.coefficients.clear();
        self.coefficients
            .extend((0..len).map(|index| hann_coefficient(index, len)));
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    #[inline]
    pub fn coefficients(&self) -> &[f32] {
        &self.coefficients
    }
}

// -------------------------------------------------------------------------------------------------

/// Hann window coefficient `0.5 * (1 - cos(2π·i / (len - 1)))` for the given index.
/// A single sample window is a unity gain window.
#[inline]
pub fn hann_coefficient(index: usize, len: usize) -> f32 {
    debug_assert!(index < len);
    if len <= 1 {
        return 1.0;
    }
    (0.5 * (1.0 - (2.0 * PI * index as f64 / (len - 1) as f64).cos())) as f32
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hann_window() {
        let window = WindowTable::hann(5);
        let expected = [0.0, 0.5, 1.0, 0.5, 0.0];
        for (c, e) in window.coefficients().iter().zip(expected) {
            assert!((c - e).abs() < 1e-6, "{c} != {e}");
        }

        let window = WindowTable::hann(1024);
        let coefficients = window.coefficients();
        assert_eq!(coefficients[0], 0.0);
        for i in 0..512 {
            assert!((coefficients[i] - coefficients[1023 - i]).abs() < 1e-6);
        }
    }

    #[test]
    fn degenerate_lengths() {
        assert_eq!(WindowTable::hann(1).coefficients(), &[1.0]);
        assert!(WindowTable::hann(0).is_empty());
    }

    #[test]
    fn rebuild_reuses_memory() {
        let mut window = WindowTable::hann_with_max_len(16, 64);
        let ptr = window.coefficients().as_ptr();
        window.rebuild(64);
        assert_eq!(window.len(), 64);
        assert_eq!(window.coefficients().as_ptr(), ptr);
        window.rebuild(3);
        assert_eq!(window.coefficients(), &[0.0, 1.0, 0.0]);
    }
}
