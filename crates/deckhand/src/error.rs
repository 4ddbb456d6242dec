//! Unified error type for the deckhand facade.

use deckhand_engine::EngineError;
use deckhand_protocol::{CommandId, ErrorId, ProtocolError};
use deckhand_session::SessionError;

/// Top-level error wrapping every layer's failures, plus the two outcomes
/// only a client can observe: a semantic rejection and a frame that makes
/// no sense at the current point of the conversation.
#[derive(Debug, thiserror::Error)]
pub enum DeckhandError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The server answered with `NOTIFY_INPUT_ERROR`.
    #[error("server rejected the request: {0:?}")]
    Rejected(ErrorId),

    /// The server sent a frame the client did not expect here.
    #[error("unexpected {0:?} frame from the server")]
    UnexpectedFrame(CommandId),
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckhand_protocol::PlayerId;

    #[test]
    fn test_layer_errors_convert_with_question_mark() {
        let err: DeckhandError = ProtocolError::UnknownCommand(0).into();
        assert!(matches!(err, DeckhandError::Protocol(_)));

        let err: DeckhandError = SessionError::ServerFull(3).into();
        assert!(matches!(err, DeckhandError::Session(_)));
        assert!(err.to_string().contains("full"));

        let err: DeckhandError = EngineError::UnknownPlayer(PlayerId(4)).into();
        assert!(matches!(err, DeckhandError::Engine(_)));
    }
}
