use crate::Error;

// -------------------------------------------------------------------------------------------------

/// Stateless Catmull-Rom resampler for fixed length grains.
///
/// Resamples a whole grain at once by reading it at `ratio` times the original speed: ratios
/// above 1 shorten and raise the grain's pitch, ratios below 1 lengthen and lower it. Neighbour
/// samples at the grain edges are clamped (duplicated), so reads never leave the grain.
#[derive(Debug, Default, Clone, Copy)]
pub struct CubicResampler;

impl CubicResampler {
    /// Number of output samples a grain of `input_len` samples resamples to with `ratio`.
    #[inline]
    pub fn output_len(input_len: usize, ratio: f64) -> usize {
        debug_assert!(ratio > 0.0);
        (input_len as f64 / ratio).floor() as usize
    }

    /// Resample the given grain with the given ratio into `output`.
    ///
    /// `output` must be at least [`Self::output_len`] samples long. Returns the number of
    /// written output samples on success.
    pub fn process(input: &[f32], ratio: f64, output: &mut [f32]) -> Result<usize, Error> {
        if input.is_empty() {
            return Err(Error::ResamplingError("empty input grain".to_string()));
        }
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(Error::ResamplingError(format!(
                "invalid resampling ratio: {ratio}"
            )));
        }
        let input_len = input.len();
        let output_len = Self::output_len(input_len, ratio);
        if output.len() < output_len {
            return Err(Error::ResamplingError(format!(
                "output buffer too small: {} < {output_len}",
                output.len()
            )));
        }

        let last = input_len - 1;
        for (index, sample) in output[..output_len].iter_mut().enumerate() {
            let source_pos = index as f64 * ratio;
            let source_index = source_pos.floor() as usize;
            let fraction = (source_pos - source_index as f64) as f32;

            let y0 = input[source_index.saturating_sub(1).min(last)];
            let y1 = input[source_index.min(last)];
            let y2 = input[(source_index + 1).min(last)];
            let y3 = input[(source_index + 2).min(last)];
            *sample = interpolate(y0, y1, y2, y3, fraction);
        }
        Ok(output_len)
    }
}

// -------------------------------------------------------------------------------------------------

/// Catmull-Rom spline between `y1` and `y2` at the given fraction in range `0.0..1.0`.
#[inline]
fn interpolate(y0: f32, y1: f32, y2: f32, y3: f32, t: f32) -> f32 {
    let a = -0.5 * y0 + 1.5 * y1 - 1.5 * y2 + 0.5 * y3;
    let b = y0 - 2.5 * y1 + 2.0 * y2 - 0.5 * y3;
    let c = -0.5 * y0 + 0.5 * y2;
    let d = y1;
    a * t * t * t + b * t * t + c * t + d
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_length() {
        let ratios = [0.25, 0.5, 1.0, 2.0_f64.powf(5.0 / 12.0), 2.0, 4.0];
        let expected = [4096, 2048, 1024, 767, 512, 256];
        let input = vec![0.0; 1024];
        let mut output = vec![0.0; 4096];
        for (ratio, expected) in ratios.into_iter().zip(expected) {
            assert_eq!(CubicResampler::output_len(1024, ratio), expected);
            assert_eq!(
                CubicResampler::process(&input, ratio, &mut output),
                Ok(expected)
            );
        }
    }

    #[test]
    fn unity_ratio_is_identity() {
        let input = (0..64).map(|i| (i as f32 * 0.3).sin()).collect::<Vec<_>>();
        let mut output = vec![0.0; 64];
        assert_eq!(CubicResampler::process(&input, 1.0, &mut output), Ok(64));
        assert_eq!(input, output);
    }

    #[test]
    fn clamps_at_grain_edges() {
        let ramp = (0..8).map(|i| i as f32).collect::<Vec<_>>();

        // upsampling: first and last positions need neighbours outside of the grain
        let mut output = vec![f32::NAN; 16];
        assert_eq!(CubicResampler::process(&ramp, 0.5, &mut output), Ok(16));
        assert_eq!(output[0], 0.0);
        assert_eq!(output[1], 0.4375);
        assert_eq!(output[8], 4.0);
        assert_eq!(output[14], 7.0);
        assert_eq!(output[15], 7.0625);

        // downsampling: reads up to the last grain sample
        let mut output = vec![f32::NAN; 2];
        assert_eq!(CubicResampler::process(&ramp, 3.5, &mut output), Ok(2));
        assert_eq!(output[0], 0.0);
        assert!(output[1].is_finite());

        // constant grains stay constant, also at the edges
        let constant = [0.25; 8];
        for ratio in [0.3, 0.5, 1.7, 7.9] {
            let mut output = vec![0.0; 32];
            let len = CubicResampler::process(&constant, ratio, &mut output).unwrap();
            assert!(output[..len].iter().all(|s| *s == 0.25));
        }
    }

    #[test]
    fn rejects_invalid_input() {
        let mut output = vec![0.0; 16];
        assert!(CubicResampler::process(&[], 1.0, &mut output).is_err());
        for ratio in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(CubicResampler::process(&[1.0; 8], ratio, &mut output).is_err());
        }
        assert!(CubicResampler::process(&[1.0; 8], 0.25, &mut output).is_err());
    }
}
