//! Per-game state and every mutation the protocol can request.
//!
//! A game owns its deck, its seats (one per member, holding that player's
//! hidden hand), and its RNG. All mutation happens with the game's lock held
//! by the caller; nothing here locks or blocks. The deck is stored bottom
//! first: the *top* of the deck is the last element.
//!
//! Hands are multisets with no externally defined order, so removal is
//! swap-remove. The engine accounts for every card at all times: cards are
//! in the deck, in a hand, or removed from play (discards and the hands of
//! departed players), and the three together always equal the multiset the
//! spec induced. Sentinels never enter any of these collections; redaction
//! happens in the visibility layer on the way out.

use std::sync::Arc;

use deckhand_protocol::{
    CardId, CardSelector, DeckId, DeckSelector, FrameSink, GameId, PlayerId,
    PlayerSelector,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::{EngineError, GameSpec};

/// One member of a game.
pub struct Seat {
    pub player: PlayerId,
    pub name: String,
    pub hand: Vec<CardId>,
    pub sink: FrameSink,
}

/// A single game: spec, deck, seats, RNG.
pub struct Game {
    id: GameId,
    spec: Arc<GameSpec>,
    /// The spec envelope exactly as the creator sent it. Echoed in the full
    /// `NOTIFY_GAME_JOINED` snapshot; never re-encoded.
    envelope: Vec<u8>,
    deck: Vec<CardId>,
    seats: Vec<Seat>,
    removed: Vec<CardId>,
    rng: StdRng,
}

impl Game {
    /// Builds a game with the deck in spec order (card 0 at the bottom).
    /// The directory shuffles once right after creation; tests construct
    /// games directly to pin deck arrangements.
    pub fn new(id: GameId, spec: Arc<GameSpec>, envelope: Vec<u8>, seed: u64) -> Self {
        let deck = (0..spec.card_count()).map(CardId).collect();
        Self {
            id,
            spec,
            envelope,
            deck,
            seats: Vec::new(),
            removed: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn id(&self) -> GameId {
        self.id
    }

    pub fn spec(&self) -> &Arc<GameSpec> {
        &self.spec
    }

    pub fn envelope(&self) -> &[u8] {
        &self.envelope
    }

    pub fn deck(&self) -> &[CardId] {
        &self.deck
    }

    pub fn deck_size(&self) -> u16 {
        self.deck.len() as u16
    }

    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    /// Every card the spec induced is in the deck, a hand, or removed from
    /// play, exactly once. Checked after each mutation in debug builds.
    pub fn cards_accounted(&self) -> bool {
        let mut all: Vec<u16> = self
            .deck
            .iter()
            .chain(self.seats.iter().flat_map(|s| s.hand.iter()))
            .chain(self.removed.iter())
            .map(|c| c.0)
            .collect();
        all.sort_unstable();
        all.len() == self.spec.card_count() as usize
            && all.iter().enumerate().all(|(i, &c)| c == i as u16)
    }

    // -----------------------------------------------------------------------
    // Membership
    // -----------------------------------------------------------------------

    /// The seat index of a member, or `UnknownPlayer`.
    pub fn seat_of(&self, player: PlayerId) -> Result<usize, EngineError> {
        self.seats
            .iter()
            .position(|s| s.player == player)
            .ok_or(EngineError::UnknownPlayer(player))
    }

    /// Seats a player, enforcing the name rules: non-empty, unique among
    /// members ignoring case, and not shadowing any card name.
    pub fn seat_player(
        &mut self,
        player: PlayerId,
        name: &str,
        sink: FrameSink,
    ) -> Result<(), EngineError> {
        if name.is_empty() {
            return Err(EngineError::NameRequired);
        }
        let lowered = name.to_lowercase();
        if self
            .seats
            .iter()
            .any(|s| s.name.to_lowercase() == lowered)
        {
            return Err(EngineError::NameTaken(name.to_string()));
        }
        if self.spec.name_collides(name) {
            return Err(EngineError::NameCollidesWithCard(name.to_string()));
        }

        self.seats.push(Seat {
            player,
            name: name.to_string(),
            hand: Vec::new(),
            sink,
        });
        tracing::info!(game_id = %self.id, player_id = %player, name, "player seated");
        Ok(())
    }

    /// Removes a player's seat. Their hand leaves play with them.
    pub fn unseat_player(&mut self, player: PlayerId) -> Result<Seat, EngineError> {
        let index = self.seat_of(player)?;
        let mut seat = self.seats.swap_remove(index);
        self.removed.append(&mut seat.hand);
        debug_assert!(self.cards_accounted());
        tracing::info!(game_id = %self.id, player_id = %player, "player unseated");
        Ok(seat)
    }

    // -----------------------------------------------------------------------
    // Resolve helpers (lock already held by the caller)
    // -----------------------------------------------------------------------

    /// Resolves a player selector to a seat index. `Any` samples uniformly;
    /// `All` and `None` are not resolvable to one seat and are rejected
    /// here, so operations that allow them must handle them first.
    pub fn resolve_seat(&mut self, sel: PlayerSelector) -> Result<usize, EngineError> {
        match sel {
            PlayerSelector::Specific(id) => self.seat_of(id),
            PlayerSelector::Any => {
                if self.seats.is_empty() {
                    return Err(EngineError::BadPlayerSelector);
                }
                Ok(self.rng.random_range(0..self.seats.len()))
            }
            PlayerSelector::All | PlayerSelector::None => {
                Err(EngineError::BadPlayerSelector)
            }
        }
    }

    /// Resolves a deck selector. Only deck 0 exists in this protocol
    /// version; `Any` picks it, anything else is unknown.
    pub fn resolve_deck(&self, sel: DeckSelector) -> Result<DeckId, EngineError> {
        match sel {
            DeckSelector::Specific(DeckId(0)) | DeckSelector::Any => Ok(DeckId(0)),
            _ => Err(EngineError::UnknownDeck),
        }
    }

    /// Resolves a card selector to an index in a seat's hand.
    fn resolve_card_in_hand(
        &mut self,
        seat: usize,
        sel: CardSelector,
    ) -> Result<usize, EngineError> {
        let hand = &self.seats[seat].hand;
        match sel {
            CardSelector::Specific(id) => hand
                .iter()
                .position(|&c| c == id)
                .ok_or(EngineError::CardNotHeld(id)),
            CardSelector::Any => {
                if hand.is_empty() {
                    return Err(EngineError::CardNotHeld(CardId::ANY));
                }
                Ok(self.rng.random_range(0..hand.len()))
            }
            CardSelector::All | CardSelector::None => Err(EngineError::BadCardSelector),
        }
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Permutes the deck uniformly at random.
    pub fn shuffle(&mut self) {
        self.deck.shuffle(&mut self.rng);
        debug_assert!(self.cards_accounted());
    }

    /// Moves up to `count` cards from the top of the deck into a member's
    /// hand. The card that was on top is handed over first. Drawing from an
    /// empty deck yields an empty list, not an error.
    pub fn draw(&mut self, seat: usize, count: u16) -> Vec<CardId> {
        let take = (count as usize).min(self.deck.len());
        let mut drawn = Vec::with_capacity(take);
        for _ in 0..take {
            let Some(card) = self.deck.pop() else { break };
            drawn.push(card);
        }
        self.seats[seat].hand.extend_from_slice(&drawn);
        debug_assert!(self.cards_accounted());
        drawn
    }

    /// Resolves the cards a `CARD_SHOW` reveals: the whole hand for `All`,
    /// otherwise one resolved card. No state changes.
    pub fn shown_cards(
        &mut self,
        seat: usize,
        sel: CardSelector,
    ) -> Result<Vec<CardId>, EngineError> {
        if sel == CardSelector::All {
            return Ok(self.seats[seat].hand.clone());
        }
        let index = self.resolve_card_in_hand(seat, sel)?;
        Ok(vec![self.seats[seat].hand[index]])
    }

    /// Returns a held card into the deck, `depth` cards from the top.
    /// Depth 0 is the top; depth `|deck|` is the bottom; anything deeper is
    /// `INVALID_DATA` and nothing changes.
    pub fn putback(
        &mut self,
        seat: usize,
        sel: CardSelector,
        depth: u16,
    ) -> Result<CardId, EngineError> {
        if depth as usize > self.deck.len() {
            return Err(EngineError::DepthOutOfRange {
                depth,
                deck_size: self.deck.len(),
            });
        }
        let index = self.resolve_card_in_hand(seat, sel)?;
        let card = self.seats[seat].hand.swap_remove(index);
        self.deck.insert(self.deck.len() - depth as usize, card);
        debug_assert!(self.cards_accounted());
        Ok(card)
    }

    /// Removes a held card from play.
    pub fn discard(
        &mut self,
        seat: usize,
        sel: CardSelector,
    ) -> Result<CardId, EngineError> {
        let index = self.resolve_card_in_hand(seat, sel)?;
        let card = self.seats[seat].hand.swap_remove(index);
        self.removed.push(card);
        debug_assert!(self.cards_accounted());
        Ok(card)
    }

    /// Moves a held card from one member's hand to another's.
    pub fn give(
        &mut self,
        from: usize,
        to: usize,
        sel: CardSelector,
    ) -> Result<CardId, EngineError> {
        if from == to {
            return Err(EngineError::SelfTarget);
        }
        let index = self.resolve_card_in_hand(from, sel)?;
        let card = self.seats[from].hand.swap_remove(index);
        self.seats[to].hand.push(card);
        debug_assert!(self.cards_accounted());
        Ok(card)
    }

    /// Reads up to `count` cards from the top of the deck, top to bottom
    /// (the reverse of storage order). No state changes.
    pub fn peek(&self, count: u16) -> Vec<CardId> {
        self.deck
            .iter()
            .rev()
            .take(count as usize)
            .copied()
            .collect()
    }
}
