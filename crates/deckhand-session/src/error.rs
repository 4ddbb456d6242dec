//! Error types for the session layer.

use deckhand_protocol::{ErrorId, PlayerId};

/// Errors from session bookkeeping: registration, lookup, capacity.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The directory refuses new players.
    #[error("server is full ({0} players connected)")]
    ServerFull(usize),

    /// The presented name violates the naming rules.
    #[error("invalid player name: {0}")]
    InvalidName(&'static str),

    /// No registered player with that id.
    #[error("no such player {0}")]
    NotFound(PlayerId),
}

impl SessionError {
    /// The wire error id reported for this failure.
    pub fn error_id(&self) -> ErrorId {
        match self {
            Self::ServerFull(_) => ErrorId::ServerFull,
            Self::InvalidName(_) => ErrorId::InvalidPlayerName,
            Self::NotFound(_) => ErrorId::InvalidPlayerId,
        }
    }
}
