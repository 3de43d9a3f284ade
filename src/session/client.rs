//! Seams to the two external services.
//!
//! The realtime speech API and the avatar renderer own their wire formats;
//! the session only sees these traits.  Implementors must be `Send + Sync`
//! so they can be shared as `Arc<dyn …>`.

use async_trait::async_trait;
use thiserror::Error;

use crate::audio::AudioBuffer;
use crate::config::{AvatarConfig, RealtimeConfig};

// ---------------------------------------------------------------------------
// ClientError
// ---------------------------------------------------------------------------

/// Failure reported by an external client.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Could not reach or authenticate with the service.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The service refused a request.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// The connection is already closed.
    #[error("connection closed")]
    Closed,
}

// ---------------------------------------------------------------------------
// AvatarClient
// ---------------------------------------------------------------------------

/// Talking-avatar renderer.  Consumes 16-bit mono PCM at the avatar rate.
#[async_trait]
pub trait AvatarClient: Send + Sync {
    /// Open the rendering session.  The renderer reports readiness later
    /// through a `SessionEvent::AvatarConnected` message.
    async fn start(&self, config: &AvatarConfig) -> Result<(), ClientError>;

    async fn send_audio(&self, audio: &AudioBuffer) -> Result<(), ClientError>;

    /// Drop any speech the renderer has buffered but not yet played.
    async fn clear_buffer(&self);

    async fn close(&self);
}

// ---------------------------------------------------------------------------
// RealtimeClient
// ---------------------------------------------------------------------------

/// Realtime speech/LLM API.  Exchanges 16-bit mono PCM at the realtime rate.
#[async_trait]
pub trait RealtimeClient: Send + Sync {
    /// Connect and configure instructions, voice and turn detection.
    async fn connect(&self, config: &RealtimeConfig) -> Result<(), ClientError>;

    /// Ask the model to speak first.
    async fn create_response(&self) -> Result<(), ClientError>;

    async fn append_input_audio(&self, audio: &AudioBuffer) -> Result<(), ClientError>;

    async fn cancel_response(&self);

    async fn disconnect(&self);
}
