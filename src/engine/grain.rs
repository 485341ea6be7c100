//! Grain extraction, resampling and overlap-add resynthesis.

use crate::{
    utils::{
        dsp::{circular::CircularSampleBuffer, window::WindowTable},
        resampler::CubicResampler,
    },
    GrainSize,
};

// -------------------------------------------------------------------------------------------------

/// Smallest supported pitch ratio (-24 semitones). Defines the longest resampled grain.
pub(crate) const MIN_PITCH_RATIO: f64 = 0.25;

// -------------------------------------------------------------------------------------------------

/// Tracks how much processed output got accumulated, to delay output until a full grain of
/// overlap-added samples is available.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PrimingState {
    ready: bool,
    accumulated: usize,
}

impl PrimingState {
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    #[cfg(test)]
    pub fn accumulated(&self) -> usize {
        self.accumulated
    }

    /// Account `count` newly accumulated output samples and get ready as soon as `threshold`
    /// samples got accumulated.
    pub fn advance(&mut self, count: usize, threshold: usize) {
        self.accumulated += count;
        if !self.ready && self.accumulated >= threshold {
            self.ready = true;
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// -------------------------------------------------------------------------------------------------

/// Runs single grain cycles: extracts an analysis windowed grain from the input buffer,
/// resamples it, applies the synthesis window and overlap-adds it into the output buffer.
///
/// Analysis and synthesis hops are equal, so grains are emitted at the same cadence they are
/// read: the pitch ratio only changes the content of each grain, never the stream's duration.
///
/// All scratch buffers and windows are preallocated for [`GrainSize::MAX`] and the smallest
/// supported pitch ratio, so grain cycles never allocate.
#[derive(Debug, Clone)]
pub(crate) struct GrainProcessor {
    grain_size: GrainSize,
    normalization_gain: f32,
    analysis_window: WindowTable,
    synthesis_window: WindowTable,
    grain: Vec<f32>,
    resampled_grain: Vec<f32>,
}

impl GrainProcessor {
    pub fn new(grain_size: GrainSize) -> Self {
        let max_grain_len = GrainSize::MAX.samples();
        let max_resampled_len = Self::max_resampled_len(GrainSize::MAX);
        Self {
            grain_size,
            normalization_gain: grain_size.normalization_gain(),
            analysis_window: WindowTable::hann_with_max_len(grain_size.samples(), max_grain_len),
            synthesis_window: WindowTable::hann_with_max_len(
                grain_size.samples(),
                max_resampled_len,
            ),
            grain: vec![0.0; max_grain_len],
            resampled_grain: vec![0.0; max_resampled_len],
        }
    }

    /// Longest possible resampled grain for the given grain size.
    pub fn max_resampled_len(grain_size: GrainSize) -> usize {
        CubicResampler::output_len(grain_size.samples(), MIN_PITCH_RATIO)
    }

    #[inline]
    pub fn grain_size(&self) -> GrainSize {
        self.grain_size
    }

    #[cfg(test)]
    pub fn normalization_gain(&self) -> f32 {
        self.normalization_gain
    }

    #[cfg(test)]
    pub fn synthesis_window_len(&self) -> usize {
        self.synthesis_window.len()
    }

    /// Apply a new grain size: recomputes the normalization gain and the windows.
    pub fn set_grain_size(&mut self, grain_size: GrainSize) {
        self.grain_size = grain_size;
        self.normalization_gain = grain_size.normalization_gain();
        self.analysis_window.rebuild(grain_size.samples());
        self.synthesis_window.rebuild(grain_size.samples());
    }

    /// Process a single grain. The input buffer must contain at least one grain of unread
    /// samples. Returns the number of samples the output buffer's write cursor advanced.
    pub fn process(
        &mut self,
        input: &mut CircularSampleBuffer,
        output: &mut CircularSampleBuffer,
        pitch_ratio: f64,
        priming: &mut PrimingState,
    ) -> usize {
        let grain_len = self.grain_size.samples();
        let hop_size = self.grain_size.hop_size();
        debug_assert!(input.available() >= grain_len, "Not enough input for a grain");
        debug_assert!(pitch_ratio >= MIN_PITCH_RATIO, "Pitch ratio out of range");

        // extract
        let grain = &mut self.grain[..grain_len];
        input.peek_windowed(0, self.analysis_window.coefficients(), grain);
        input.skip(hop_size);

        // resample
        let resampled_len =
            CubicResampler::process(grain, pitch_ratio, &mut self.resampled_grain)
                .unwrap_or_else(|err| {
                    log::error!("Grain resampling failed: {err}");
                    0
                });

        // apply synthesis window
        if resampled_len > 0 {
            if self.synthesis_window.len() != resampled_len {
                self.synthesis_window.rebuild(resampled_len);
            }
            let gain = self.normalization_gain;
            for (sample, window) in self.resampled_grain[..resampled_len]
                .iter_mut()
                .zip(self.synthesis_window.coefficients())
            {
                *sample *= window * gain;
            }
        }

        // overlap-add and move on by one hop
        output.accumulate(0, &self.resampled_grain[..resampled_len]);
        output.advance_write(hop_size);
        priming.advance(hop_size, grain_len);

        hop_size
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priming_state() {
        let mut priming = PrimingState::default();
        priming.advance(256, 1024);
        priming.advance(512, 1024);
        assert!(!priming.is_ready());
        priming.advance(256, 1024);
        assert!(priming.is_ready());
        assert_eq!(priming.accumulated(), 1024);
        priming.reset();
        assert!(!priming.is_ready());
        assert_eq!(priming.accumulated(), 0);
    }

    #[test]
    fn grain_cycle() {
        let grain_size = GrainSize::Samples512;
        let mut processor = GrainProcessor::new(grain_size);
        let mut input = CircularSampleBuffer::new(grain_size.samples() * 4);
        let mut output = CircularSampleBuffer::new(grain_size.samples() * 8);
        let mut priming = PrimingState::default();

        input.write(&vec![1.0; grain_size.samples() + grain_size.hop_size() * 3]);
        for grain in 0..4 {
            assert!(!priming.is_ready());
            let advanced = processor.process(&mut input, &mut output, 2.0, &mut priming);
            assert_eq!(advanced, grain_size.hop_size());
            assert_eq!(input.read_pos(), (grain + 1) * grain_size.hop_size());
            assert_eq!(output.write_pos(), (grain + 1) * grain_size.hop_size());
        }
        assert!(priming.is_ready());
        assert_eq!(input.available(), grain_size.hop_size() * 3);
        assert_eq!(output.available(), grain_size.samples());
        assert_eq!(processor.synthesis_window_len(), 256);

        // half length grains overlap-add at the grain's hop size:
        // the first hop only contains the first grain's rising edge
        let mut rendered = vec![0.0; grain_size.samples()];
        output.read_and_clear(&mut rendered);
        assert_eq!(rendered[0], 0.0);
        assert!(rendered[1..grain_size.samples()].iter().all(|s| *s > 0.0));
        let peak = rendered.iter().cloned().fold(0.0, f32::max);
        assert!(peak <= processor.normalization_gain() * 1.01);
    }

    #[test]
    fn grain_size_change() {
        let mut processor = GrainProcessor::new(GrainSize::Samples1024);
        assert_eq!(processor.normalization_gain(), 0.5);
        processor.set_grain_size(GrainSize::Samples4096);
        assert_eq!(processor.grain_size(), GrainSize::Samples4096);
        assert_eq!(processor.synthesis_window_len(), 4096);

        let mut input = CircularSampleBuffer::new(4096 * 4);
        let mut output = CircularSampleBuffer::new(4096 * 8);
        let mut priming = PrimingState::default();
        input.write(&vec![0.5; 4096]);
        processor.process(&mut input, &mut output, MIN_PITCH_RATIO, &mut priming);
        assert_eq!(processor.synthesis_window_len(), 4096 * 4);
        assert_eq!(GrainProcessor::max_resampled_len(GrainSize::MAX), 4096 * 4);
    }
}
