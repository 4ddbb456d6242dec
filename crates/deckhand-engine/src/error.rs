//! Error types for the game engine.

use deckhand_protocol::{CardId, ErrorId, GameId, PlayerId};

use crate::spec::SpecError;

/// Semantic failures raised by game operations. None of these mutate state;
/// each maps onto a wire error id for the `NOTIFY_INPUT_ERROR` reply.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// No game with that id exists.
    #[error("no such game {0}")]
    UnknownGame(GameId),

    /// The named player is not seated in this game.
    #[error("player {0} is not in this game")]
    UnknownPlayer(PlayerId),

    /// A sentinel player selector arrived where one is not permitted.
    #[error("player selector not permitted for this operation")]
    BadPlayerSelector,

    /// Source and target must differ for this operation.
    #[error("source and target are the same player")]
    SelfTarget,

    /// The card is not in the caller's hand.
    #[error("card {0} is not in the caller's hand")]
    CardNotHeld(CardId),

    /// A sentinel card selector arrived where one is not permitted.
    #[error("card selector not permitted for this operation")]
    BadCardSelector,

    /// No deck with that id exists in this game.
    #[error("no such deck in this game")]
    UnknownDeck,

    /// `cards_from_top` reaches below the bottom of the deck.
    #[error("putback depth {depth} exceeds deck size {deck_size}")]
    DepthOutOfRange { depth: u16, deck_size: usize },

    /// The spec envelope failed to decode or validate.
    #[error("game specification rejected: {0}")]
    Spec(#[from] SpecError),

    /// Another member of the game already uses this name.
    #[error("name {0:?} is already taken in this game")]
    NameTaken(String),

    /// The name matches a card name in this game's spec.
    #[error("name {0:?} collides with a card name")]
    NameCollidesWithCard(String),

    /// Joining a game requires a non-empty name.
    #[error("a non-empty name is required to join a game")]
    NameRequired,
}

impl EngineError {
    /// The wire error id reported for this failure.
    pub fn error_id(&self) -> ErrorId {
        match self {
            Self::UnknownGame(_) => ErrorId::InvalidGameId,
            Self::UnknownPlayer(_) | Self::BadPlayerSelector | Self::SelfTarget => {
                ErrorId::InvalidPlayerId
            }
            Self::CardNotHeld(_) | Self::BadCardSelector => ErrorId::InvalidCardId,
            Self::UnknownDeck => ErrorId::InvalidDeckId,
            Self::DepthOutOfRange { .. } | Self::Spec(_) => ErrorId::InvalidData,
            Self::NameTaken(_) | Self::NameCollidesWithCard(_) | Self::NameRequired => {
                ErrorId::InvalidPlayerName
            }
        }
    }
}
