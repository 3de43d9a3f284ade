//! Messages delivered to the session's event loop.
//!
//! Every callback the external services would fire (connection changes,
//! conversation updates, interruptions) arrives as one [`SessionEvent`] on a
//! `tokio::sync::mpsc` channel.  The session handles them one at a time, in
//! arrival order.

use crate::audio::AudioBuffer;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The avatar renderer is ready to receive audio.
    AvatarConnected,
    /// The avatar renderer went away; the session ends.
    AvatarDisconnected,
    /// A delta of assistant speech at the realtime rate.
    AssistantAudio(AudioBuffer),
    /// Latest transcript of what the user said.
    UserTranscript(String),
    /// Microphone audio already converted to the realtime rate.
    MicrophoneAudio(AudioBuffer),
    /// The user talked over the assistant.
    Interrupted,
    /// Server-side voice detection saw the user stop speaking.
    SpeechStopped,
    /// Tear the session down.
    Stop,
}
