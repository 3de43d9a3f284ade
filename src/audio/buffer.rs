//! 16-bit PCM sample buffers.
//!
//! [`AudioBuffer`] is the unit of audio exchanged between microphone
//! capture, the resampler, the outbound queue and the external clients.
//! Samples are clamped to the signed 16-bit range when a buffer is built, so
//! every constructor saturates rather than wraps.
//!
//! # Example
//!
//! ```rust
//! use avatar_assistant::audio::AudioBuffer;
//!
//! let buf = AudioBuffer::from_f32(&[0.0, 1.5, -1.0]);
//! assert_eq!(buf.samples(), &[0, 32_767, -32_767]);
//!
//! let bytes = buf.to_le_bytes();
//! assert_eq!(AudioBuffer::from_le_bytes(&bytes), buf);
//! ```

// ---------------------------------------------------------------------------
// Sample helpers
// ---------------------------------------------------------------------------

/// Round to the nearest integer, with halves going towards positive infinity
/// (`-2.5 → -2`, `2.5 → 3`).
pub(crate) fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Clamp `value` into the `i16` range.
pub(crate) fn saturate(value: f64) -> i16 {
    value.clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16
}

// ---------------------------------------------------------------------------
// AudioBuffer
// ---------------------------------------------------------------------------

/// An ordered, fixed-length run of mono signed 16-bit samples.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioBuffer {
    samples: Vec<i16>,
}

impl AudioBuffer {
    /// Convert normalised `f32` samples.
    ///
    /// Each sample is clamped to `[-1.0, 1.0]` and scaled by `32767`,
    /// rounding towards negative infinity.
    pub fn from_f32(samples: &[f32]) -> Self {
        let samples = samples
            .iter()
            .map(|&s| (f64::from(s.clamp(-1.0, 1.0)) * 32_767.0).floor() as i16)
            .collect();
        Self { samples }
    }

    /// Build from wider integers, clamping each into the `i16` range.
    pub fn from_wide(samples: &[i32]) -> Self {
        let samples = samples
            .iter()
            .map(|&s| s.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16)
            .collect();
        Self { samples }
    }

    /// Decode little-endian 16-bit PCM.  A trailing odd byte is ignored.
    pub fn from_le_bytes(bytes: &[u8]) -> Self {
        let samples = bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        Self { samples }
    }

    /// Encode as little-endian 16-bit PCM.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn into_inner(self) -> Vec<i16> {
        self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Playback duration in milliseconds at `sample_rate` Hz.
    ///
    /// Returns `0.0` for a zero sample rate.
    pub fn duration_ms(&self, sample_rate: u32) -> f64 {
        if sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / f64::from(sample_rate) * 1_000.0
    }
}

impl From<Vec<i16>> for AudioBuffer {
    fn from(samples: Vec<i16>) -> Self {
        Self { samples }
    }
}

impl AsRef<[i16]> for AudioBuffer {
    fn as_ref(&self) -> &[i16] {
        &self.samples
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // ---- from_f32 ----------------------------------------------------------

    #[test]
    fn from_f32_scales_and_floors() {
        let buf = AudioBuffer::from_f32(&[0.0, 0.5, -0.5, 1.0, -1.0]);
        assert_eq!(buf.samples(), &[0, 16_383, -16_384, 32_767, -32_767]);
    }

    #[test]
    fn from_f32_clamps_out_of_range() {
        let buf = AudioBuffer::from_f32(&[2.0, -3.0]);
        assert_eq!(buf.samples(), &[32_767, -32_767]);
    }

    // ---- from_wide ---------------------------------------------------------

    #[test]
    fn from_wide_clamps_to_i16() {
        let buf = AudioBuffer::from_wide(&[40_000, -40_000, 12]);
        assert_eq!(buf.samples(), &[i16::MAX, i16::MIN, 12]);
    }

    // ---- byte conversion ---------------------------------------------------

    #[test]
    fn le_bytes_layout() {
        let buf = AudioBuffer::from(vec![1_i16, -2]);
        assert_eq!(buf.to_le_bytes(), vec![0x01, 0x00, 0xFE, 0xFF]);
    }

    #[test]
    fn from_le_bytes_ignores_trailing_byte() {
        let buf = AudioBuffer::from_le_bytes(&[0x01, 0x00, 0x02]);
        assert_eq!(buf.samples(), &[1]);
    }

    // ---- helpers -----------------------------------------------------------

    #[test]
    fn duration_of_one_chunk() {
        let buf = AudioBuffer::from(vec![0_i16; 1_600]);
        assert!((buf.duration_ms(16_000) - 100.0).abs() < 1e-9);
        assert_eq!(buf.duration_ms(0), 0.0);
    }

    #[test]
    fn round_half_up_matches_positive_bias() {
        assert_eq!(round_half_up(2.5), 3.0);
        assert_eq!(round_half_up(-2.5), -2.0);
        assert_eq!(round_half_up(-2.6), -3.0);
    }

    #[test]
    fn saturate_clamps() {
        assert_eq!(saturate(40_000.0), i16::MAX);
        assert_eq!(saturate(-40_000.0), i16::MIN);
        assert_eq!(saturate(-5.0), -5);
    }
}
