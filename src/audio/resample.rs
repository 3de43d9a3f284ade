//! Anti-aliased PCM downsampling.
//!
//! The avatar renderer expects **16 kHz** 16-bit PCM while the realtime
//! speech API produces **24 kHz**.  [`downsample`] bridges the two in two
//! steps:
//!
//! 1. [`apply_filter`] with a 31-tap windowed-sinc low-pass kernel from
//!    [`design_low_pass`], cut off at 45 % of the target rate.
//! 2. Linear interpolation at the (possibly non-integral) rate ratio.
//!
//! Upsampling is not supported.

use thiserror::Error;

use super::buffer::{round_half_up, saturate, AudioBuffer};

/// Number of taps in the anti-aliasing kernel.  Must be odd.
pub const NUM_TAPS: usize = 31;

/// Cutoff as a fraction of the output rate; keeps the passband a little
/// below the target Nyquist frequency.
pub const CUTOFF_RATIO: f64 = 0.45;

// ---------------------------------------------------------------------------
// ResampleError
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResampleError {
    /// The output rate is above the input rate.
    #[error("upsampling is not supported ({input_rate} Hz -> {output_rate} Hz)")]
    UnsupportedOperation { input_rate: u32, output_rate: u32 },

    /// A sample rate of zero was supplied.
    #[error("sample rates must be positive (got {input_rate} Hz -> {output_rate} Hz)")]
    InvalidRate { input_rate: u32, output_rate: u32 },
}

// ---------------------------------------------------------------------------
// FilterKernel
// ---------------------------------------------------------------------------

/// FIR low-pass coefficients, odd length, symmetric, summing to 1.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterKernel {
    coefficients: Vec<f64>,
}

impl FilterKernel {
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }

    /// Index of the centre tap.
    pub fn center(&self) -> usize {
        (self.coefficients.len() - 1) / 2
    }
}

// ---------------------------------------------------------------------------
// design_low_pass
// ---------------------------------------------------------------------------

/// Build a [`NUM_TAPS`]-tap Hamming-windowed sinc low-pass kernel.
///
/// The result is normalised for unity DC gain.
///
/// ```rust
/// use avatar_assistant::audio::design_low_pass;
///
/// let kernel = design_low_pass(7_200.0, 24_000.0);
/// let sum: f64 = kernel.coefficients().iter().sum();
/// assert!((sum - 1.0).abs() < 1e-9);
/// ```
pub fn design_low_pass(cutoff_freq: f64, sample_rate: f64) -> FilterKernel {
    use std::f64::consts::PI;

    let fc = cutoff_freq / sample_rate;
    let middle = (NUM_TAPS - 1) / 2;
    let span = (NUM_TAPS - 1) as f64;

    let mut coefficients: Vec<f64> = (0..NUM_TAPS)
        .map(|i| {
            let sinc = if i == middle {
                2.0 * PI * fc
            } else {
                let offset = i as f64 - middle as f64;
                (2.0 * PI * fc * offset).sin() / offset
            };
            let window = 0.54 - 0.46 * (2.0 * PI * i as f64 / span).cos();
            sinc * window
        })
        .collect();

    let sum: f64 = coefficients.iter().sum();
    for c in &mut coefficients {
        *c /= sum;
    }

    FilterKernel { coefficients }
}

// ---------------------------------------------------------------------------
// apply_filter
// ---------------------------------------------------------------------------

/// Convolve `data` with `kernel`, keeping the input length.
///
/// Taps that fall outside the input contribute nothing (implicit zero
/// padding).
pub fn apply_filter(data: &[i16], kernel: &FilterKernel) -> AudioBuffer {
    let len = data.len() as isize;
    let center = kernel.center() as isize;

    let filtered = (0..len)
        .map(|i| {
            let acc: f64 = kernel
                .coefficients()
                .iter()
                .enumerate()
                .filter_map(|(j, &c)| {
                    let idx = i - j as isize + center;
                    (0..len)
                        .contains(&idx)
                        .then(|| c * f64::from(data[idx as usize]))
                })
                .sum();
            saturate(round_half_up(acc))
        })
        .collect::<Vec<i16>>();

    AudioBuffer::from(filtered)
}

// ---------------------------------------------------------------------------
// downsample
// ---------------------------------------------------------------------------

/// Number of samples [`downsample`] produces for `input_len` samples.
///
/// Returns `0` when either rate is zero.
pub fn output_len(input_len: usize, input_rate: u32, output_rate: u32) -> usize {
    if input_rate == 0 || output_rate == 0 {
        return 0;
    }
    (input_len as u64 * u64::from(output_rate) / u64::from(input_rate)) as usize
}

/// Downsample `audio_data` from `input_rate` Hz to `output_rate` Hz.
///
/// * Equal rates return the input unchanged, without filtering.
/// * `output_rate > input_rate` fails with
///   [`ResampleError::UnsupportedOperation`].
///
/// The output holds `floor(len * output_rate / input_rate)` samples.
///
/// ```rust
/// use avatar_assistant::audio::downsample;
///
/// let speech = vec![0_i16; 2_400]; // 100 ms @ 24 kHz
/// let out = downsample(&speech, 24_000, 16_000).unwrap();
/// assert_eq!(out.len(), 1_600);
/// ```
pub fn downsample(
    audio_data: &[i16],
    input_rate: u32,
    output_rate: u32,
) -> Result<AudioBuffer, ResampleError> {
    if input_rate == 0 || output_rate == 0 {
        return Err(ResampleError::InvalidRate {
            input_rate,
            output_rate,
        });
    }

    if input_rate == output_rate {
        return Ok(AudioBuffer::from(audio_data.to_vec()));
    }

    if output_rate > input_rate {
        return Err(ResampleError::UnsupportedOperation {
            input_rate,
            output_rate,
        });
    }

    let kernel = design_low_pass(
        f64::from(output_rate) * CUTOFF_RATIO,
        f64::from(input_rate),
    );
    let filtered = apply_filter(audio_data, &kernel);
    let filtered = filtered.samples();

    let ratio = f64::from(input_rate) / f64::from(output_rate);
    let new_len = output_len(audio_data.len(), input_rate, output_rate);
    let last = filtered.len().saturating_sub(1);

    let result = (0..new_len)
        .map(|i| {
            let position = i as f64 * ratio;
            let index = (position.floor() as usize).min(last);
            let fraction = position - index as f64;

            if index + 1 < filtered.len() {
                let a = f64::from(filtered[index]);
                let b = f64::from(filtered[index + 1]);
                saturate(round_half_up(a + fraction * (b - a)))
            } else {
                filtered[index]
            }
        })
        .collect::<Vec<i16>>();

    Ok(AudioBuffer::from(result))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // ---- design_low_pass ---------------------------------------------------

    #[test]
    fn kernel_has_31_taps_and_centre_15() {
        let kernel = design_low_pass(7_200.0, 24_000.0);
        assert_eq!(kernel.len(), NUM_TAPS);
        assert_eq!(kernel.center(), 15);
    }

    #[test]
    fn kernel_sums_to_one_for_any_cutoff_below_nyquist() {
        let sample_rate = 48_000.0;
        for cutoff in [100.0, 1_000.0, 7_200.0, 10_000.0, 19_845.0, 23_900.0] {
            let kernel = design_low_pass(cutoff, sample_rate);
            let sum: f64 = kernel.coefficients().iter().sum();
            assert!((sum - 1.0).abs() < 1e-9, "cutoff {cutoff}: sum {sum}");
        }
    }

    #[test]
    fn kernel_is_symmetric() {
        let kernel = design_low_pass(7_200.0, 24_000.0);
        let c = kernel.coefficients();
        for i in 0..c.len() {
            let mirrored = c[c.len() - 1 - i];
            assert!((c[i] - mirrored).abs() < 1e-12, "tap {i}");
        }
    }

    #[test]
    fn kernel_is_deterministic() {
        assert_eq!(
            design_low_pass(7_200.0, 24_000.0),
            design_low_pass(7_200.0, 24_000.0)
        );
    }

    #[test]
    fn kernel_centre_tap_is_largest() {
        let kernel = design_low_pass(7_200.0, 24_000.0);
        let c = kernel.coefficients();
        let centre = c[kernel.center()];
        assert!(c.iter().all(|&v| v <= centre));
    }

    #[test]
    fn kernel_matches_reference_taps_for_24k_to_16k() {
        let kernel = design_low_pass(7_200.0, 24_000.0);
        let c = kernel.coefficients();
        let expected = [
            (0, 1.869_046_397_359_26e-18),
            (1, 0.001_945_091_992_007_828_7),
            (14, 0.299_355_096_250_097_8),
            (15, 0.599_334_276_957_495_3),
            (16, 0.299_355_096_250_097_8),
            (30, 1.869_046_397_359_26e-18),
        ];
        for (tap, want) in expected {
            assert!((c[tap] - want).abs() < 1e-12, "tap {tap}: {} != {want}", c[tap]);
        }
    }

    // ---- apply_filter ------------------------------------------------------

    #[test]
    fn filter_of_silence_is_silence() {
        let kernel = design_low_pass(7_200.0, 24_000.0);
        let out = apply_filter(&[0_i16; 500], &kernel);
        assert_eq!(out.len(), 500);
        assert!(out.samples().iter().all(|&s| s == 0));
    }

    #[test]
    fn filter_of_empty_input_is_empty() {
        let kernel = design_low_pass(7_200.0, 24_000.0);
        assert!(apply_filter(&[], &kernel).is_empty());
    }

    #[test]
    fn filter_preserves_dc_away_from_edges() {
        let kernel = design_low_pass(7_200.0, 24_000.0);
        let out = apply_filter(&[1_000_i16; 200], &kernel);
        // Edges see zero padding; the interior sees the full kernel.
        for &s in &out.samples()[NUM_TAPS..200 - NUM_TAPS] {
            assert_eq!(s, 1_000);
        }
        assert!(out.samples()[0] < 1_000);
    }

    #[test]
    fn filter_attenuates_nyquist_tone() {
        let kernel = design_low_pass(7_200.0, 48_000.0);
        let tone: Vec<i16> = (0..400)
            .map(|i| if i % 2 == 0 { 10_000 } else { -10_000 })
            .collect();
        let out = apply_filter(&tone, &kernel);
        for &s in &out.samples()[NUM_TAPS..400 - NUM_TAPS] {
            assert!(s.abs() < 500, "residual {s}");
        }
    }

    #[test]
    fn filter_output_matches_reference_values() {
        let kernel = design_low_pass(7_200.0, 24_000.0);
        let input = [0_i16, 1_000, -1_000, 500, 2_000, -3_000, 1_500, 0, -500, 250, 4_000, -4_000];
        let out = apply_filter(&input, &kernel);
        assert_eq!(
            out.samples(),
            &[403, -109, 57, 701, 116, -492, 16, -54, -142, 1_258, 1_330, -1_040]
        );
    }

    #[test]
    fn full_scale_input_does_not_wrap() {
        let kernel = design_low_pass(7_200.0, 24_000.0);
        let out = apply_filter(&[i16::MAX; 100], &kernel);
        assert!(out.samples().iter().all(|&s| s >= 0));
    }

    // ---- downsample --------------------------------------------------------

    #[test]
    fn equal_rates_are_identity() {
        let input = [100_i16, -100, 100];
        let out = downsample(&input, 48_000, 48_000).unwrap();
        assert_eq!(out.samples(), &input);
    }

    #[test]
    fn upsampling_is_rejected() {
        let err = downsample(&[0_i16; 10], 16_000, 24_000).unwrap_err();
        assert_eq!(
            err,
            ResampleError::UnsupportedOperation {
                input_rate: 16_000,
                output_rate: 24_000
            }
        );
    }

    #[test]
    fn zero_rates_are_rejected() {
        assert!(matches!(
            downsample(&[0_i16; 10], 0, 16_000),
            Err(ResampleError::InvalidRate { .. })
        ));
        assert!(matches!(
            downsample(&[0_i16; 10], 16_000, 0),
            Err(ResampleError::InvalidRate { .. })
        ));
    }

    #[test]
    fn silence_24k_to_16k() {
        let out = downsample(&[0_i16; 2_400], 24_000, 16_000).unwrap();
        assert_eq!(out.len(), 1_600);
        assert!(out.samples().iter().all(|&s| s == 0));
    }

    #[test]
    fn output_length_follows_rate_ratio() {
        let cases = [
            (2_400, 24_000, 16_000),
            (2_048, 48_000, 24_000),
            (1_000, 44_100, 16_000),
            (441, 44_100, 22_050),
            (7, 48_000, 16_000),
            (1, 24_000, 16_000),
            (0, 24_000, 16_000),
        ];
        for (len, input_rate, output_rate) in cases {
            let out = downsample(&vec![0_i16; len], input_rate, output_rate).unwrap();
            let expected = len * output_rate as usize / input_rate as usize;
            assert_eq!(out.len(), expected, "{len} @ {input_rate} -> {output_rate}");
        }
    }

    #[test]
    fn constant_signal_keeps_amplitude_in_interior() {
        let input = vec![2_000_i16; 960];
        let out = downsample(&input, 48_000, 16_000).unwrap();
        assert_eq!(out.len(), 320);
        for &s in &out.samples()[20..300] {
            assert_eq!(s, 2_000);
        }
    }

    #[test]
    fn interpolates_between_filtered_samples() {
        // A slow ramp passes the filter almost untouched, so the 1.5 ratio
        // lands halfway between neighbours on odd outputs.
        let input: Vec<i16> = (0..300).map(|i| (i * 10) as i16).collect();
        let out = downsample(&input, 24_000, 16_000).unwrap();
        // out[11] sits at position 16.5 → between 160 and 170.
        assert_eq!(out.samples()[11], 165);
        // The first output still sees the zero-padded edge.
        assert_eq!(&out.samples()[..4], &[1, 15, 30, 45]);
    }

    #[test]
    fn downsample_matches_reference_output() {
        let input = [0_i16, 1_000, -1_000, 500, 2_000, -3_000, 1_500, 0, -500, 250, 4_000, -4_000];
        let out = downsample(&input, 24_000, 16_000).unwrap();
        assert_eq!(out.samples(), &[403, -26, 701, -188, 16, -98, 1_258, 145]);
    }

    #[test]
    fn output_len_helper_matches_floor_law() {
        assert_eq!(output_len(2_400, 24_000, 16_000), 1_600);
        assert_eq!(output_len(5, 48_000, 16_000), 1);
        assert_eq!(output_len(10, 0, 16_000), 0);
    }
}
