//! Session lifecycle state.
//!
//! ```text
//! Idle ──start()──▶ Connecting ──AvatarConnected──▶ Active
//! Connecting / Active ──Stop | AvatarDisconnected | stop()──▶ Stopped
//! any state ──client failure──▶ Error
//! ```

/// Lifecycle phase of an [`AssistantSession`](super::AssistantSession).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Constructed, not started.
    #[default]
    Idle,
    /// Avatar renderer is starting; waiting for its connection event.
    Connecting,
    /// Both clients are connected and audio flows in both directions.
    Active,
    /// Torn down.  Terminal.
    Stopped,
    /// A client failed.  Call `stop()` to release the clients.
    Error,
}

impl SessionState {
    /// Returns `true` while external clients may hold open connections.
    ///
    /// ```
    /// use avatar_assistant::session::SessionState;
    ///
    /// assert!(!SessionState::Idle.is_live());
    /// assert!(SessionState::Connecting.is_live());
    /// assert!(SessionState::Active.is_live());
    /// assert!(!SessionState::Stopped.is_live());
    /// assert!(!SessionState::Error.is_live());
    /// ```
    pub fn is_live(&self) -> bool {
        matches!(self, SessionState::Connecting | SessionState::Active)
    }

    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Idle => "Idle",
            SessionState::Connecting => "Connecting",
            SessionState::Active => "Active",
            SessionState::Stopped => "Stopped",
            SessionState::Error => "Error",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
