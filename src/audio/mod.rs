//! Audio path: capture → resample → outbound queue.
//!
//! # Pipeline
//!
//! ```text
//! Microphone → cpal callback → CapturedChunk (mpsc) → downsample (24 kHz)
//!           → RealtimeClient::append_input_audio
//!
//! Assistant speech (24 kHz) → downsample (16 kHz) → ChunkQueue
//!           → AvatarClient::send_audio
//! ```

pub mod buffer;
pub mod capture;
pub mod queue;
pub mod resample;

pub use buffer::AudioBuffer;
pub use capture::{prepare_for_realtime, AudioCapture, CaptureError, CapturedChunk, StreamHandle};
pub use queue::ChunkQueue;
pub use resample::{
    apply_filter, design_low_pass, downsample, output_len, FilterKernel, ResampleError,
    CUTOFF_RATIO, NUM_TAPS,
};
