//! Game specifications and their wire envelope.
//!
//! A specification is an ordered list of card display names; a card's id is
//! its position in that list, so duplicates are fine and each entry is one
//! physical card. The spec is immutable for the life of a game.
//!
//! On the wire the spec travels as an opaque envelope: gzip-compressed UTF-8
//! containing a minimal YAML document of the form `deck: [names]`. The
//! server decodes it for exactly two reasons: to build the card table and to
//! enforce the name rules (player names must not collide with card names).

use std::io::Read;
use std::sync::Arc;

use deckhand_protocol::{CardId, MAX_SPEC_DATA_LEN};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};

/// Reasons a spec envelope is rejected. All of them surface to the client as
/// `INVALID_DATA`.
#[derive(Debug, thiserror::Error)]
pub enum SpecError {
    #[error("envelope is not gzip-compressed data")]
    Envelope(#[source] std::io::Error),

    #[error("document is not a valid specification: {0}")]
    Document(#[from] serde_yaml::Error),

    #[error("deck list is empty")]
    EmptyDeck,

    #[error("deck lists {0} cards; at most {max} are addressable", max = GameSpec::MAX_CARDS)]
    TooManyCards(usize),

    #[error("encoded envelope is {0} bytes; the frame allows {MAX_SPEC_DATA_LEN}")]
    EnvelopeTooLarge(usize),
}

/// An ordered list of card names. Position is card id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSpec {
    pub deck: Vec<String>,
}

impl GameSpec {
    /// Card ids are `u16` minus the three sentinels.
    pub const MAX_CARDS: usize = CardId::MAX_ASSIGNABLE.0 as usize + 1;

    /// Builds a spec from a deck list, enforcing the card-count limits.
    pub fn new(deck: Vec<String>) -> Result<Arc<Self>, SpecError> {
        if deck.is_empty() {
            return Err(SpecError::EmptyDeck);
        }
        if deck.len() > Self::MAX_CARDS {
            return Err(SpecError::TooManyCards(deck.len()));
        }
        Ok(Arc::new(Self { deck }))
    }

    /// Decodes a wire envelope: gunzip, parse YAML, validate.
    pub fn decode(envelope: &[u8]) -> Result<Arc<Self>, SpecError> {
        let mut text = String::new();
        GzDecoder::new(envelope)
            .read_to_string(&mut text)
            .map_err(SpecError::Envelope)?;
        let spec: GameSpec = serde_yaml::from_str(&text)?;
        Self::new(spec.deck)
    }

    /// Encodes this spec as a wire envelope. Used by clients and tests; the
    /// server only ever echoes the bytes it was given.
    pub fn encode(&self) -> Result<Vec<u8>, SpecError> {
        use std::io::Write as _;
        let text = serde_yaml::to_string(self)?;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(text.as_bytes())
            .and_then(|()| encoder.finish())
            .map_err(SpecError::Envelope)
            .and_then(|bytes| {
                if bytes.len() > MAX_SPEC_DATA_LEN {
                    Err(SpecError::EnvelopeTooLarge(bytes.len()))
                } else {
                    Ok(bytes)
                }
            })
    }

    pub fn card_count(&self) -> u16 {
        self.deck.len() as u16
    }

    /// The display name for a card id, if the id is in range.
    pub fn card_name(&self, id: CardId) -> Option<&str> {
        self.deck.get(id.0 as usize).map(String::as_str)
    }

    /// Returns `true` if `name` matches any card name, ignoring case.
    /// Player names must not shadow card names within one game.
    pub fn name_collides(&self, name: &str) -> bool {
        let lowered = name.to_lowercase();
        self.deck.iter().any(|card| card.to_lowercase() == lowered)
    }

    /// The bundled default deck, for clients that ask for a game without
    /// writing a spec of their own: 14 ranks per suit, with "Ace" and "1"
    /// as distinct cards. 56 cards, not the conventional 52.
    pub fn standard() -> Arc<Self> {
        const SUITS: [&str; 4] = ["Spades", "Clubs", "Diamonds", "Hearts"];
        const RANKS: [&str; 14] = [
            "Ace", "1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "Jack",
            "Queen", "King",
        ];
        let deck = SUITS
            .iter()
            .flat_map(|suit| RANKS.iter().map(move |rank| format!("{rank} Of {suit}")))
            .collect();
        Arc::new(Self { deck })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_round_trip() {
        let spec = GameSpec::new(vec!["A".into(), "B".into(), "C".into()]).unwrap();
        let envelope = spec.encode().unwrap();
        let decoded = GameSpec::decode(&envelope).unwrap();
        assert_eq!(*decoded, *spec);
    }

    #[test]
    fn test_decode_rejects_non_gzip_bytes() {
        let err = GameSpec::decode(b"deck: [A, B]").unwrap_err();
        assert!(matches!(err, SpecError::Envelope(_)));
    }

    #[test]
    fn test_decode_rejects_non_spec_yaml() {
        use std::io::Write as _;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"not: [a, spec]").unwrap();
        let envelope = encoder.finish().unwrap();
        let err = GameSpec::decode(&envelope).unwrap_err();
        assert!(matches!(err, SpecError::Document(_)));
    }

    #[test]
    fn test_empty_deck_is_rejected() {
        assert!(matches!(
            GameSpec::new(vec![]),
            Err(SpecError::EmptyDeck)
        ));
    }

    #[test]
    fn test_card_ids_are_positions() {
        let spec = GameSpec::new(vec!["X".into(), "X".into(), "Y".into()]).unwrap();
        assert_eq!(spec.card_name(CardId(0)), Some("X"));
        assert_eq!(spec.card_name(CardId(1)), Some("X"));
        assert_eq!(spec.card_name(CardId(2)), Some("Y"));
        assert_eq!(spec.card_name(CardId(3)), None);
        assert_eq!(spec.card_count(), 3);
    }

    #[test]
    fn test_name_collision_is_case_insensitive() {
        let spec = GameSpec::new(vec!["Alice".into(), "Bob".into()]).unwrap();
        assert!(spec.name_collides("alice"));
        assert!(spec.name_collides("ALICE"));
        assert!(!spec.name_collides("carol"));
    }

    #[test]
    fn test_standard_deck_has_fifty_six_distinct_cards() {
        let spec = GameSpec::standard();
        assert_eq!(spec.card_count(), 56);
        let mut names: Vec<_> = spec.deck.clone();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 56);
        // "Ace" and "1" are distinct cards in every suit.
        assert!(spec.deck.contains(&"Ace Of Spades".to_string()));
        assert!(spec.deck.contains(&"1 Of Spades".to_string()));
        assert!(spec.deck.contains(&"10 Of Hearts".to_string()));
    }
}
