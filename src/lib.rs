//! Audio core of a conversational talking-avatar assistant.
//!
//! ```text
//! Microphone → AudioCapture → downsample → RealtimeClient
//! RealtimeClient (assistant speech, 24 kHz)
//!           → downsample (16 kHz) → ChunkQueue → AvatarClient
//! ```
//!
//! * [`audio`]: PCM buffers, the anti-aliased downsampler, the outbound
//!   chunk queue and microphone capture.
//! * [`config`]: TOML-backed settings.
//! * [`session`]: the explicitly owned assistant session and its event loop.

pub mod audio;
pub mod config;
pub mod session;
