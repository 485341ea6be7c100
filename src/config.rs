use std::time::Duration;

use crate::{utils::semitones_to_ratio, Error};

// -------------------------------------------------------------------------------------------------

/// Supported grain sizes in samples.
///
/// Larger grains sound smoother, but add more latency: the pitch shifter delays its output by
/// one grain plus three hops, see [`GrainSize::latency_frames`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::EnumString,
    strum::Display,
    strum::EnumIter,
    strum::VariantNames,
)]
#[repr(usize)]
pub enum GrainSize {
    #[strum(serialize = "512")]
    Samples512 = 512,
    #[default]
    #[strum(serialize = "1024")]
    Samples1024 = 1024,
    #[strum(serialize = "2048")]
    Samples2048 = 2048,
    #[strum(serialize = "4096")]
    Samples4096 = 4096,
}

impl GrainSize {
    /// The largest supported grain size. Buffers are preallocated for this size.
    pub const MAX: GrainSize = GrainSize::Samples4096;

    /// Analysis to synthesis overlap factor.
    pub const OVERLAP_FACTOR: usize = 4;

    /// Grain size in samples.
    #[inline]
    pub const fn samples(self) -> usize {
        self as usize
    }

    /// Number of samples the grain cursors advance between two grains.
    #[inline]
    pub const fn hop_size(self) -> usize {
        self.samples() / Self::OVERLAP_FACTOR
    }

    /// Number of grains that overlap at any time.
    #[inline]
    pub const fn overlap_factor(self) -> usize {
        self.samples() / self.hop_size()
    }

    /// Delay of the pitch shifted stream in sample frames, independent of the host's block size.
    ///
    /// The first grain needs a full grain of input, and output only gets emitted once all
    /// overlapping grains for the first hop got accumulated: one grain plus three hops.
    #[inline]
    pub const fn latency_frames(self) -> usize {
        self.samples() + (Self::OVERLAP_FACTOR - 1) * self.hop_size()
    }

    /// Look up the grain size with the given number of samples, if supported.
    /// Unlike `try_from`, this never allocates, so it can be used in real-time threads.
    pub const fn from_samples(samples: usize) -> Option<Self> {
        match samples {
            512 => Some(Self::Samples512),
            1024 => Some(Self::Samples1024),
            2048 => Some(Self::Samples2048),
            4096 => Some(Self::Samples4096),
            _ => None,
        }
    }

    /// Gain which compensates the energy sum of overlapping grains.
    #[inline]
    pub fn normalization_gain(self) -> f32 {
        1.0 / (self.overlap_factor() as f32).sqrt()
    }
}

impl TryFrom<usize> for GrainSize {
    type Error = Error;

    fn try_from(samples: usize) -> Result<Self, Self::Error> {
        Self::from_samples(samples).ok_or_else(|| {
            Error::ParameterError(format!(
                "unsupported grain size '{samples}' (must be 512, 1024, 2048 or 4096)"
            ))
        })
    }
}

impl From<GrainSize> for usize {
    fn from(grain_size: GrainSize) -> Self {
        grain_size.samples()
    }
}

// -------------------------------------------------------------------------------------------------

/// Initial configuration of a [`PitchShiftEngine`](crate::PitchShiftEngine).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchShiftConfig {
    /// Stream sample rate. Only used to convert sample frame counts to durations.
    /// By default 44100.
    pub sample_rate: u32,
    /// Initial grain size. By default 1024 samples.
    pub grain_size: GrainSize,
    /// Initial pitch offset in semitones. By default 0, which bypasses processing.
    pub semitones: f32,
}

impl Default for PitchShiftConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            grain_size: GrainSize::default(),
            semitones: 0.0,
        }
    }
}

impl PitchShiftConfig {
    /// Max absolute pitch offset in semitones.
    pub const MAX_SEMITONES: f32 = 24.0;

    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            ..Self::default()
        }
    }

    pub fn grain_size(mut self, grain_size: GrainSize) -> Self {
        self.grain_size = grain_size;
        self
    }

    pub fn semitones(mut self, semitones: f32) -> Self {
        self.semitones = semitones;
        self
    }

    /// Pitch ratio of the configured semitones.
    pub fn pitch_ratio(&self) -> f64 {
        semitones_to_ratio(self.semitones)
    }

    /// Duration of the given number of sample frames at the configured sample rate.
    pub fn frames_to_duration(&self, frames: u64) -> Duration {
        Duration::from_secs_f64(frames as f64 / self.sample_rate as f64)
    }

    /// Validate all parameters. Returns Error::ParameterError on errors.
    pub fn validate(&self) -> Result<(), Error> {
        if self.sample_rate == 0 {
            return Err(Error::ParameterError(
                "config 'sample_rate' must be > 0".to_string(),
            ));
        }
        if !self.semitones.is_finite() || self.semitones.abs() > Self::MAX_SEMITONES {
            return Err(Error::ParameterError(format!(
                "config 'semitones' value is '{}' (must be in range -{max}..={max})",
                self.semitones,
                max = Self::MAX_SEMITONES
            )));
        }
        Ok(())
    }
}

// -------------------------------------------------------------------------------------------------
