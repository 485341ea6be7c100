//! Shared buffer, DSP and resampling helpers.

pub mod buffer;
pub mod dsp;
pub mod resampler;

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
macro_rules! assert_eq_with_epsilon {
    ($x:expr, $y:expr, $d:expr) => {
        if ($x - $y).abs() >= $d {
            panic!("{} != {} (epsilon: {})", $x, $y, $d);
        }
    };
}

// -------------------------------------------------------------------------------------------------

/// Convert a pitch offset in semitones to a playback speed ratio.
pub fn semitones_to_ratio(semitones: f32) -> f64 {
    if semitones == 0.0 {
        return 1.0; // avoid rounding errors at unity
    }
    2.0_f64.powf(semitones as f64 / 12.0)
}

/// Convert a playback speed ratio to a pitch offset in semitones.
pub fn ratio_to_semitones(ratio: f64) -> f32 {
    debug_assert!(ratio > 0.0, "Invalid pitch ratio");
    if ratio == 1.0 {
        return 0.0;
    }
    (12.0 * ratio.log2()) as f32
}

// -------------------------------------------------------------------------------------------------
