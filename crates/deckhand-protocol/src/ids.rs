//! Identifier spaces and their reserved sentinels.
//!
//! deckhand uses four unsigned id spaces. Each reserves the three values at
//! the top of its range as in-band sentinels rather than errors:
//!
//! - `ALL`  - "apply to every member of this category"
//! - `ANY`  - "server's choice, uniformly at random"
//! - `NONE` - "not applicable to this action"
//!
//! Raw sentinel integers are easy to misuse (pass `ANY` where only a concrete
//! id is legal, store a sentinel in a hand), so they exist in two forms:
//!
//! - The id newtypes ([`PlayerId`], [`GameId`], [`DeckId`], [`CardId`]) carry
//!   whatever arrived on the wire. Notification payloads use these, because a
//!   notification legitimately carries sentinels (a redacted card list is
//!   `ANY` repeated).
//! - The selector enums ([`PlayerSelector`], [`DeckSelector`],
//!   [`CardSelector`]) are the *request-side* view: every id-valued command
//!   parameter is converted to a selector at the codec boundary, so code that
//!   resolves a target matches on `Specific`/`Any`/`All`/`None` instead of
//!   comparing against magic constants.

use std::fmt;

// ---------------------------------------------------------------------------
// Id newtypes
// ---------------------------------------------------------------------------

/// A server-assigned player identifier (64-bit, monotonically increasing
/// from 1, never reused within one server lifetime).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlayerId(pub u64);

impl PlayerId {
    /// "Every player" sentinel.
    pub const ALL: PlayerId = PlayerId(u64::MAX);
    /// "Server picks a player at random" sentinel.
    pub const ANY: PlayerId = PlayerId(u64::MAX - 1);
    /// "No player" sentinel.
    pub const NONE: PlayerId = PlayerId(u64::MAX - 2);
    /// Highest id the server may ever assign.
    pub const MAX_ASSIGNABLE: PlayerId = PlayerId(u64::MAX - 3);

    /// Returns `true` if this value is one of the reserved sentinels.
    pub fn is_sentinel(self) -> bool {
        self >= Self::NONE
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::ALL => write!(f, "P-all"),
            Self::ANY => write!(f, "P-any"),
            Self::NONE => write!(f, "P-none"),
            Self(id) => write!(f, "P-{id}"),
        }
    }
}

/// A server-assigned game identifier (64-bit, monotonically increasing
/// from 1, never reused within one server lifetime).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GameId(pub u64);

impl GameId {
    pub const ALL: GameId = GameId(u64::MAX);
    pub const ANY: GameId = GameId(u64::MAX - 1);
    pub const NONE: GameId = GameId(u64::MAX - 2);
    pub const MAX_ASSIGNABLE: GameId = GameId(u64::MAX - 3);
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "G-{}", self.0)
    }
}

/// A deck identifier within a game (16-bit). Only deck 0 exists in this
/// protocol version; the id space is reserved for multi-deck games.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeckId(pub u16);

impl DeckId {
    pub const ALL: DeckId = DeckId(u16::MAX);
    pub const ANY: DeckId = DeckId(u16::MAX - 1);
    pub const NONE: DeckId = DeckId(u16::MAX - 2);
    pub const MAX_ASSIGNABLE: DeckId = DeckId(u16::MAX - 3);

    pub fn is_sentinel(self) -> bool {
        self >= Self::NONE
    }
}

impl fmt::Display for DeckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "D-{}", self.0)
    }
}

/// A card identifier within a game (16-bit).
///
/// A card id is the index of a card name in the game specification's deck
/// list. It is stable for the life of the game and identifies one physical
/// card instance, so a spec with duplicate names still yields distinct ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CardId(pub u16);

impl CardId {
    pub const ALL: CardId = CardId(u16::MAX);
    pub const ANY: CardId = CardId(u16::MAX - 1);
    pub const NONE: CardId = CardId(u16::MAX - 2);
    pub const MAX_ASSIGNABLE: CardId = CardId(u16::MAX - 3);

    pub fn is_sentinel(self) -> bool {
        self >= Self::NONE
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::ANY => write!(f, "C-hidden"),
            Self(id) => write!(f, "C-{id}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Selectors: the request-side view of an id parameter
// ---------------------------------------------------------------------------

/// An id-valued player parameter as sent by a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerSelector {
    Specific(PlayerId),
    Any,
    All,
    None,
}

impl PlayerSelector {
    pub fn from_wire(raw: u64) -> Self {
        match PlayerId(raw) {
            PlayerId::ALL => Self::All,
            PlayerId::ANY => Self::Any,
            PlayerId::NONE => Self::None,
            id => Self::Specific(id),
        }
    }

    pub fn to_wire(self) -> u64 {
        match self {
            Self::All => PlayerId::ALL.0,
            Self::Any => PlayerId::ANY.0,
            Self::None => PlayerId::NONE.0,
            Self::Specific(id) => id.0,
        }
    }
}

/// An id-valued deck parameter as sent by a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeckSelector {
    Specific(DeckId),
    Any,
    All,
    None,
}

impl DeckSelector {
    pub fn from_wire(raw: u16) -> Self {
        match DeckId(raw) {
            DeckId::ALL => Self::All,
            DeckId::ANY => Self::Any,
            DeckId::NONE => Self::None,
            id => Self::Specific(id),
        }
    }

    pub fn to_wire(self) -> u16 {
        match self {
            Self::All => DeckId::ALL.0,
            Self::Any => DeckId::ANY.0,
            Self::None => DeckId::NONE.0,
            Self::Specific(id) => id.0,
        }
    }
}

/// An id-valued card parameter as sent by a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardSelector {
    Specific(CardId),
    Any,
    All,
    None,
}

impl CardSelector {
    pub fn from_wire(raw: u16) -> Self {
        match CardId(raw) {
            CardId::ALL => Self::All,
            CardId::ANY => Self::Any,
            CardId::NONE => Self::None,
            id => Self::Specific(id),
        }
    }

    pub fn to_wire(self) -> u16 {
        match self {
            Self::All => CardId::ALL.0,
            Self::Any => CardId::ANY.0,
            Self::None => CardId::NONE.0,
            Self::Specific(id) => id.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels_sit_at_the_top_of_each_range() {
        assert_eq!(PlayerId::ALL.0, u64::MAX);
        assert_eq!(PlayerId::ANY.0, u64::MAX - 1);
        assert_eq!(PlayerId::NONE.0, u64::MAX - 2);
        assert_eq!(CardId::ALL.0, u16::MAX);
        assert_eq!(CardId::ANY.0, u16::MAX - 1);
        assert_eq!(CardId::NONE.0, u16::MAX - 2);
    }

    #[test]
    fn test_is_sentinel_only_for_reserved_values() {
        assert!(PlayerId::ALL.is_sentinel());
        assert!(PlayerId::ANY.is_sentinel());
        assert!(PlayerId::NONE.is_sentinel());
        assert!(!PlayerId::MAX_ASSIGNABLE.is_sentinel());
        assert!(!PlayerId(1).is_sentinel());
    }

    #[test]
    fn test_player_selector_wire_round_trip() {
        for raw in [0u64, 1, 42, u64::MAX - 3, u64::MAX - 2, u64::MAX - 1, u64::MAX] {
            assert_eq!(PlayerSelector::from_wire(raw).to_wire(), raw);
        }
        assert_eq!(PlayerSelector::from_wire(u64::MAX), PlayerSelector::All);
        assert_eq!(PlayerSelector::from_wire(u64::MAX - 1), PlayerSelector::Any);
        assert_eq!(PlayerSelector::from_wire(u64::MAX - 2), PlayerSelector::None);
        assert_eq!(
            PlayerSelector::from_wire(7),
            PlayerSelector::Specific(PlayerId(7))
        );
    }

    #[test]
    fn test_card_selector_wire_round_trip() {
        for raw in [0u16, 51, u16::MAX - 3, u16::MAX - 2, u16::MAX - 1, u16::MAX] {
            assert_eq!(CardSelector::from_wire(raw).to_wire(), raw);
        }
    }

    #[test]
    fn test_display_marks_sentinels() {
        assert_eq!(PlayerId(3).to_string(), "P-3");
        assert_eq!(PlayerId::ALL.to_string(), "P-all");
        assert_eq!(CardId::ANY.to_string(), "C-hidden");
        assert_eq!(GameId(9).to_string(), "G-9");
    }
}
