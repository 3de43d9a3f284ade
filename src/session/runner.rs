//! Assistant session: owns both clients and drives the event loop.
//!
//! [`AssistantSession`] is created explicitly, started explicitly and torn
//! down explicitly; nothing is set up by module load order.
//!
//! # Event flow
//!
//! ```text
//! start()               → AvatarClient::start                 [Connecting]
//! AvatarConnected       → RealtimeClient::connect + create_response [Active]
//! AssistantAudio(24k)   → downsample(16k) → ChunkQueue → AvatarClient::send_audio
//! MicrophoneAudio(24k)  → RealtimeClient::append_input_audio
//! Interrupted           → clear avatar buffer + queue, cancel response
//! AvatarDisconnected    → RealtimeClient::disconnect (if connected) [Stopped]
//! Stop / stop()         → close avatar, disconnect realtime     [Stopped]
//! ```
//!
//! Queued chunks are forwarded as soon as they are enqueued, oldest first,
//! with no pacing between them.

use std::sync::mpsc as std_mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::audio::{
    downsample, prepare_for_realtime, AudioBuffer, CapturedChunk, ChunkQueue, ResampleError,
};
use crate::config::AssistantConfig;

use super::client::{AvatarClient, ClientError, RealtimeClient};
use super::event::SessionEvent;
use super::state::SessionState;

// ---------------------------------------------------------------------------
// SessionError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("avatar client failed: {0}")]
    Avatar(ClientError),

    #[error("realtime client failed: {0}")]
    Realtime(ClientError),

    #[error("resampling failed: {0}")]
    Resample(#[from] ResampleError),

    #[error("cannot {action} while session is {state}")]
    InvalidState {
        action: &'static str,
        state: SessionState,
    },
}

// ---------------------------------------------------------------------------
// AssistantSession
// ---------------------------------------------------------------------------

/// One conversation between a visitor and the talking avatar.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use avatar_assistant::config::AssistantConfig;
/// use avatar_assistant::session::{AssistantSession, AvatarClient, RealtimeClient};
///
/// # async fn example() {
/// # fn make_avatar() -> Arc<dyn AvatarClient> { unimplemented!() }
/// # fn make_realtime() -> Arc<dyn RealtimeClient> { unimplemented!() }
/// let (event_tx, event_rx) = tokio::sync::mpsc::channel(64);
/// let mut session = AssistantSession::new(
///     AssistantConfig::default(),
///     make_avatar(),
///     make_realtime(),
/// );
/// session.start().await.unwrap();
///
/// // event_tx is handed to whatever receives the services' callbacks.
/// # drop(event_tx);
/// let session = session.run(event_rx).await;
/// session.dispose().await;
/// # }
/// ```
pub struct AssistantSession {
    config: AssistantConfig,
    avatar: Arc<dyn AvatarClient>,
    realtime: Arc<dyn RealtimeClient>,
    queue: ChunkQueue,
    state: SessionState,
    user_transcript: Option<String>,
    error_message: Option<String>,
    chunks_sent: u64,
    /// Set once `RealtimeClient::connect` succeeded; cleared on disconnect.
    realtime_connected: bool,
}

impl AssistantSession {
    pub fn new(
        config: AssistantConfig,
        avatar: Arc<dyn AvatarClient>,
        realtime: Arc<dyn RealtimeClient>,
    ) -> Self {
        Self {
            config,
            avatar,
            realtime,
            queue: ChunkQueue::new(),
            state: SessionState::Idle,
            user_transcript: None,
            error_message: None,
            chunks_sent: 0,
            realtime_connected: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Most recent transcript of the user's speech.
    pub fn user_transcript(&self) -> Option<&str> {
        self.user_transcript.as_deref()
    }

    /// Set when the session entered [`SessionState::Error`].
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Number of speech chunks the avatar accepted.
    pub fn chunks_sent(&self) -> u64 {
        self.chunks_sent
    }

    pub fn queued_chunks(&self) -> usize {
        self.queue.len()
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Start the avatar renderer.  Only valid from [`SessionState::Idle`].
    pub async fn start(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::Idle {
            return Err(SessionError::InvalidState {
                action: "start",
                state: self.state,
            });
        }

        log::info!("session: starting avatar renderer");
        self.state = SessionState::Connecting;

        if let Err(e) = self.avatar.start(&self.config.avatar).await {
            let err = SessionError::Avatar(e);
            self.fail(err.to_string());
            return Err(err);
        }
        Ok(())
    }

    /// Process events until `Stop`, an avatar disconnect, or the channel
    /// closing.  Returns the session so the caller can inspect and dispose
    /// of it.
    pub async fn run(mut self, mut events: mpsc::Receiver<SessionEvent>) -> Self {
        while let Some(event) = events.recv().await {
            if let Err(e) = self.handle(event).await {
                self.fail(e.to_string());
            }
            if self.state == SessionState::Stopped {
                break;
            }
        }

        log::info!("session: event loop finished ({})", self.state);
        self
    }

    /// Close the avatar, disconnect the realtime client if it ever connected,
    /// and drop queued speech.  Idempotent.
    pub async fn stop(&mut self) {
        if self.state == SessionState::Stopped {
            return;
        }

        if self.state != SessionState::Idle {
            self.avatar.close().await;
        }
        self.disconnect_realtime().await;

        self.queue.clear();
        self.state = SessionState::Stopped;
        log::info!("session: stopped after {} chunks", self.chunks_sent);
    }

    /// Stop if needed and release the session.
    pub async fn dispose(mut self) {
        self.stop().await;
    }

    // -----------------------------------------------------------------------
    // Event handling
    // -----------------------------------------------------------------------

    /// Apply a single event.
    pub async fn handle(&mut self, event: SessionEvent) -> Result<(), SessionError> {
        match event {
            SessionEvent::AvatarConnected => self.on_avatar_connected().await,
            SessionEvent::AvatarDisconnected => {
                log::info!("session: avatar disconnected");
                self.disconnect_realtime().await;
                self.queue.clear();
                self.state = SessionState::Stopped;
                Ok(())
            }
            SessionEvent::AssistantAudio(audio) => {
                if self.state != SessionState::Active {
                    log::debug!("session: dropping assistant audio while {}", self.state);
                    return Ok(());
                }

                let rates = &self.config.audio;
                match downsample(audio.samples(), rates.realtime_rate, rates.avatar_rate) {
                    Ok(resampled) => {
                        self.queue.push(resampled);
                        self.flush_queue().await;
                    }
                    Err(e) => log::warn!("session: dropping assistant chunk: {e}"),
                }
                Ok(())
            }
            SessionEvent::MicrophoneAudio(audio) => {
                if self.state != SessionState::Active {
                    return Ok(());
                }
                if let Err(e) = self.realtime.append_input_audio(&audio).await {
                    log::warn!("session: realtime rejected microphone audio: {e}");
                }
                Ok(())
            }
            SessionEvent::UserTranscript(text) => {
                log::debug!("session: user said {text:?}");
                self.user_transcript = Some(text);
                Ok(())
            }
            SessionEvent::Interrupted => {
                if self.state != SessionState::Active {
                    return Ok(());
                }
                log::warn!("session: user interrupted the assistant");
                self.avatar.clear_buffer().await;
                self.queue.clear();
                self.realtime.cancel_response().await;
                Ok(())
            }
            SessionEvent::SpeechStopped => {
                log::debug!("session: user speech stopped");
                Ok(())
            }
            SessionEvent::Stop => {
                self.stop().await;
                Ok(())
            }
        }
    }

    async fn on_avatar_connected(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::Connecting {
            return Err(SessionError::InvalidState {
                action: "connect the realtime client",
                state: self.state,
            });
        }

        log::info!(
            "session: avatar connected, opening realtime session ({}, voice {})",
            self.config.realtime.model,
            self.config.realtime.voice.as_str()
        );

        self.realtime
            .connect(&self.config.realtime)
            .await
            .map_err(SessionError::Realtime)?;
        self.realtime_connected = true;
        self.realtime
            .create_response()
            .await
            .map_err(SessionError::Realtime)?;

        self.state = SessionState::Active;
        Ok(())
    }

    /// Forward queued chunks to the avatar, oldest first.
    ///
    /// `&mut self` keeps the drain exclusive: events are applied one at a
    /// time, so a new chunk is only queued after the previous drain returned.
    async fn flush_queue(&mut self) {
        let avatar_rate = self.config.audio.avatar_rate;
        let pending: Vec<AudioBuffer> = self.queue.drain_in_order().collect();
        for chunk in pending {
            match self.avatar.send_audio(&chunk).await {
                Ok(()) => {
                    self.chunks_sent += 1;
                    log::debug!(
                        "session: sent {:.2} ms chunk to avatar",
                        chunk.duration_ms(avatar_rate)
                    );
                }
                Err(e) => log::warn!("session: avatar rejected chunk: {e}"),
            }
        }
    }

    async fn disconnect_realtime(&mut self) {
        if self.realtime_connected {
            self.realtime.disconnect().await;
            self.realtime_connected = false;
        }
    }

    fn fail(&mut self, message: String) {
        log::error!("session error: {message}");
        self.state = SessionState::Error;
        self.error_message = Some(message);
    }
}

// ---------------------------------------------------------------------------
// Capture bridge
// ---------------------------------------------------------------------------

/// Spawn a thread that converts captured microphone chunks to the realtime
/// rate and delivers them to the session as
/// [`SessionEvent::MicrophoneAudio`].
///
/// The thread exits when either channel closes.  Chunks that cannot be
/// downsampled are logged and skipped.
pub fn spawn_capture_bridge(
    chunks: std_mpsc::Receiver<CapturedChunk>,
    events: mpsc::Sender<SessionEvent>,
    realtime_rate: u32,
) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("capture-bridge".into())
        .spawn(move || {
            while let Ok(chunk) = chunks.recv() {
                let audio = match prepare_for_realtime(&chunk, realtime_rate) {
                    Ok(audio) => audio,
                    Err(e) => {
                        log::warn!("capture-bridge: skipping chunk: {e}");
                        continue;
                    }
                };
                if events
                    .blocking_send(SessionEvent::MicrophoneAudio(audio))
                    .is_err()
                {
                    break;
                }
            }
            log::debug!("capture-bridge: exiting");
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
