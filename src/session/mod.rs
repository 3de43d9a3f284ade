//! Assistant session: the explicitly owned object that connects the
//! realtime speech API to the avatar renderer.
//!
//! # Architecture
//!
//! ```text
//! service callbacks ──▶ SessionEvent (mpsc) ──▶ AssistantSession::run()
//!                                                  │
//!                                                  ├─ RealtimeClient
//!                                                  └─ ChunkQueue ─▶ AvatarClient
//! Microphone ─▶ spawn_capture_bridge ─▶ SessionEvent::MicrophoneAudio
//! ```

pub mod client;
pub mod event;
pub mod runner;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use client::{AvatarClient, ClientError, RealtimeClient};
pub use event::SessionEvent;
pub use runner::{spawn_capture_bridge, AssistantSession, SessionError};
pub use state::SessionState;
