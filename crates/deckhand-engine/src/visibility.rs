//! The visibility router.
//!
//! Every committed action is described to the table as up to three copies of
//! the same `NOTIFY_PLAYER_ACTION` payload, differing only in the card list:
//!
//! - the **source view**, full fidelity, always sent to the actor;
//! - the **target view**, full fidelity, sent to the named target of a
//!   private transfer or show (never for source-only actions);
//! - the **public view**, redacted to `ANY` unless the action was explicitly
//!   face-up, sent to every other member.
//!
//! The public broadcast skips the source and the target regardless of seat
//! order, so nobody ever receives two copies of one action. Sentinel targets
//! resolve before any of this: `ANY` became a concrete player when the
//! action executed, and `ALL` means the source view itself is broadcast and
//! no separate redaction exists.

use deckhand_protocol::{
    CardId, CommandId, DeckId, FrameSink, Notification, NotifyPlayerAction, PlayerId,
};

use crate::game::Seat;

/// A card list with every id replaced by `ANY`, preserving length.
fn redacted(cards: &[CardId]) -> Vec<CardId> {
    vec![CardId::ANY; cards.len()]
}

/// The three views of one committed action, ready for dispatch.
#[derive(Debug, Clone)]
pub struct ActionViews {
    pub actor: PlayerId,
    pub action: CommandId,
    pub deck: DeckId,
    /// The resolved target: a concrete player for shows and gives, `ALL`
    /// for a public show, `NONE` for source-only actions.
    pub target: PlayerId,
    /// Full-fidelity card list.
    pub source_cards: Vec<CardId>,
    /// Redacted (or face-up) card list for the table.
    pub public_cards: Vec<CardId>,
    /// Whether the target receives its own full-fidelity copy.
    pub target_copy: bool,
}

impl ActionViews {
    /// `CARD_DRAW`: the table learns how many cards moved; it learns which
    /// ones only if the draw was face-up.
    pub fn draw(actor: PlayerId, deck: DeckId, drawn: &[CardId], face_up: bool) -> Self {
        Self {
            actor,
            action: CommandId::CardDraw,
            deck,
            target: PlayerId::NONE,
            source_cards: drawn.to_vec(),
            public_cards: if face_up {
                drawn.to_vec()
            } else {
                redacted(drawn)
            },
            target_copy: false,
        }
    }

    /// `CARD_SHOW`: to one player, or to the whole table when `target` is
    /// `ALL` (the source view is broadcast and nothing is redacted).
    pub fn show(actor: PlayerId, target: PlayerId, shown: &[CardId]) -> Self {
        let to_all = target == PlayerId::ALL;
        Self {
            actor,
            action: CommandId::CardShow,
            deck: DeckId::NONE,
            target,
            source_cards: shown.to_vec(),
            public_cards: if to_all {
                shown.to_vec()
            } else {
                redacted(shown)
            },
            target_copy: !to_all,
        }
    }

    /// `CARD_PUTBACK`: the table only ever learns that one card went back.
    pub fn putback(actor: PlayerId, deck: DeckId, card: CardId) -> Self {
        Self {
            actor,
            action: CommandId::CardPutback,
            deck,
            target: PlayerId::NONE,
            source_cards: vec![card],
            public_cards: vec![CardId::ANY],
            target_copy: false,
        }
    }

    /// `CARD_DISCARD`: face-up discards reveal the card to the table.
    pub fn discard(actor: PlayerId, card: CardId, face_up: bool) -> Self {
        Self {
            actor,
            action: CommandId::CardDiscard,
            deck: DeckId::NONE,
            target: PlayerId::NONE,
            source_cards: vec![card],
            public_cards: if face_up { vec![card] } else { vec![CardId::ANY] },
            target_copy: false,
        }
    }

    /// `CARD_GIVE`: source and target always see the real card; the table
    /// sees it only when the transfer was face-up.
    pub fn give(actor: PlayerId, target: PlayerId, card: CardId, face_up: bool) -> Self {
        Self {
            actor,
            action: CommandId::CardGive,
            deck: DeckId::NONE,
            target,
            source_cards: vec![card],
            public_cards: if face_up { vec![card] } else { vec![CardId::ANY] },
            target_copy: true,
        }
    }

    /// `DECK_PEEK`: the caller always gets the real ids; the table always
    /// gets its own copy, redacted unless the peek was public.
    pub fn peek(actor: PlayerId, deck: DeckId, seen: &[CardId], public: bool) -> Self {
        Self {
            actor,
            action: CommandId::DeckPeek,
            deck,
            target: PlayerId::NONE,
            source_cards: seen.to_vec(),
            public_cards: if public { seen.to_vec() } else { redacted(seen) },
            target_copy: false,
        }
    }

    /// `DECK_SHUFFLE`: no cards to report.
    pub fn shuffle(actor: PlayerId, deck: DeckId) -> Self {
        Self {
            actor,
            action: CommandId::DeckShuffle,
            deck,
            target: PlayerId::NONE,
            source_cards: Vec::new(),
            public_cards: Vec::new(),
            target_copy: false,
        }
    }

    /// `GAME_LEAVE` (or a mid-game disconnect, which the table cannot tell
    /// apart).
    pub fn leave(actor: PlayerId) -> Self {
        Self {
            actor,
            action: CommandId::GameLeave,
            deck: DeckId::NONE,
            target: PlayerId::NONE,
            source_cards: Vec::new(),
            public_cards: Vec::new(),
            target_copy: false,
        }
    }

    fn frame_with(&self, cards: &[CardId]) -> Option<Vec<u8>> {
        // A card list near the top of the id space can outgrow the 16-bit
        // frame length. Notification failures never roll back a committed
        // mutation, so an unframeable view is logged and dropped.
        Notification::PlayerAction(NotifyPlayerAction {
            actor: self.actor,
            action: self.action,
            deck: self.deck,
            target: self.target,
            cards: cards.to_vec(),
        })
        .to_frame()
        .map_err(|e| {
            tracing::error!(actor = %self.actor, action = ?self.action, error = %e,
                "player-action view does not fit a frame; not sent");
        })
        .ok()
    }

    /// Delivers this action to the table.
    ///
    /// `source_sink` is passed separately because for a leave the actor no
    /// longer holds a seat; every other action passes the actor's own sink.
    /// Enqueue failures mean the recipient's session is already tearing
    /// down; the mutation stands and the failure is only logged.
    pub fn dispatch(&self, seats: &[Seat], source_sink: &FrameSink) {
        let Some(source_frame) = self.frame_with(&self.source_cards) else {
            return;
        };
        if source_sink.send(source_frame.clone()).is_err() {
            tracing::debug!(actor = %self.actor, action = ?self.action,
                "source view dropped; session closing");
        }

        if self.target_copy {
            if let Some(seat) = seats.iter().find(|s| s.player == self.target) {
                if seat.sink.send(source_frame.clone()).is_err() {
                    tracing::debug!(target = %self.target, action = ?self.action,
                        "target view dropped; session closing");
                }
            }
        }

        let Some(public_frame) = self.frame_with(&self.public_cards) else {
            return;
        };
        for seat in seats {
            if seat.player == self.actor || seat.player == self.target {
                continue;
            }
            if seat.sink.send(public_frame.clone()).is_err() {
                tracing::debug!(recipient = %seat.player, action = ?self.action,
                    "public view dropped; session closing");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckhand_protocol::{CommandId, FRAME_HEADER_LEN};
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    fn seat(player: PlayerId) -> (Seat, UnboundedReceiver<Vec<u8>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Seat {
                player,
                name: format!("p{}", player.0),
                hand: Vec::new(),
                sink: tx,
            },
            rx,
        )
    }

    fn recv_action(rx: &mut UnboundedReceiver<Vec<u8>>) -> NotifyPlayerAction {
        let bytes = rx.try_recv().expect("a frame should be queued");
        let cmd = CommandId::from_u8(bytes[0]).unwrap();
        match Notification::decode(cmd, &bytes[FRAME_HEADER_LEN..]).unwrap() {
            Notification::PlayerAction(action) => action,
            other => panic!("expected PlayerAction, got {other:?}"),
        }
    }

    fn assert_empty(rx: &mut UnboundedReceiver<Vec<u8>>) {
        assert!(rx.try_recv().is_err(), "unexpected extra frame");
    }

    #[test]
    fn test_face_down_draw_redacts_only_the_public_view() {
        let (actor, mut actor_rx) = seat(PlayerId(1));
        let (other, mut other_rx) = seat(PlayerId(2));
        let seats = vec![actor, other];

        let views = ActionViews::draw(
            PlayerId(1),
            DeckId(0),
            &[CardId(4), CardId(9)],
            false,
        );
        views.dispatch(&seats, &seats[0].sink);

        let source = recv_action(&mut actor_rx);
        assert_eq!(source.cards, vec![CardId(4), CardId(9)]);
        assert_eq!(source.target, PlayerId::NONE);
        assert_empty(&mut actor_rx);

        let public = recv_action(&mut other_rx);
        assert_eq!(public.cards, vec![CardId::ANY, CardId::ANY]);
        assert_empty(&mut other_rx);
    }

    #[test]
    fn test_sole_member_draw_yields_exactly_one_notification() {
        // The public broadcast skips the source, so a lone player sees only
        // the full-fidelity copy of their own draw.
        let (actor, mut actor_rx) = seat(PlayerId(1));
        let seats = vec![actor];

        ActionViews::draw(PlayerId(1), DeckId(0), &[CardId(0)], false)
            .dispatch(&seats, &seats[0].sink);

        let source = recv_action(&mut actor_rx);
        assert_eq!(source.cards, vec![CardId(0)]);
        assert_empty(&mut actor_rx);
    }

    #[test]
    fn test_private_show_reaches_source_and_target_in_full() {
        let (p1, mut rx1) = seat(PlayerId(1));
        let (p2, mut rx2) = seat(PlayerId(2));
        let (p3, mut rx3) = seat(PlayerId(3));
        let seats = vec![p1, p2, p3];

        ActionViews::show(PlayerId(1), PlayerId(2), &[CardId(7)])
            .dispatch(&seats, &seats[0].sink);

        assert_eq!(recv_action(&mut rx1).cards, vec![CardId(7)]);
        assert_empty(&mut rx1);

        let target = recv_action(&mut rx2);
        assert_eq!(target.cards, vec![CardId(7)]);
        assert_eq!(target.target, PlayerId(2));
        assert_empty(&mut rx2);

        // Bystanders learn that a show happened and to whom, not what.
        let public = recv_action(&mut rx3);
        assert_eq!(public.cards, vec![CardId::ANY]);
        assert_eq!(public.target, PlayerId(2));
        assert_empty(&mut rx3);
    }

    #[test]
    fn test_show_to_two_player_table_sends_no_public_view() {
        let (p1, mut rx1) = seat(PlayerId(1));
        let (p2, mut rx2) = seat(PlayerId(2));
        let seats = vec![p1, p2];

        ActionViews::show(PlayerId(1), PlayerId(2), &[CardId(3)])
            .dispatch(&seats, &seats[0].sink);

        assert_eq!(recv_action(&mut rx1).cards, vec![CardId(3)]);
        assert_empty(&mut rx1);
        assert_eq!(recv_action(&mut rx2).cards, vec![CardId(3)]);
        assert_empty(&mut rx2);
    }

    #[test]
    fn test_show_all_broadcasts_the_source_view() {
        let (p1, mut rx1) = seat(PlayerId(1));
        let (p2, mut rx2) = seat(PlayerId(2));
        let (p3, mut rx3) = seat(PlayerId(3));
        let seats = vec![p1, p2, p3];

        ActionViews::show(PlayerId(1), PlayerId::ALL, &[CardId(5), CardId(6)])
            .dispatch(&seats, &seats[0].sink);

        for rx in [&mut rx1, &mut rx2, &mut rx3] {
            let action = recv_action(rx);
            assert_eq!(action.cards, vec![CardId(5), CardId(6)]);
            assert_eq!(action.target, PlayerId::ALL);
            assert_empty(rx);
        }
    }

    #[test]
    fn test_face_down_give_shows_the_card_to_both_ends_only() {
        let (p1, mut rx1) = seat(PlayerId(1));
        let (p2, mut rx2) = seat(PlayerId(2));
        let (p3, mut rx3) = seat(PlayerId(3));
        let seats = vec![p1, p2, p3];

        ActionViews::give(PlayerId(1), PlayerId(2), CardId(8), false)
            .dispatch(&seats, &seats[0].sink);

        // Real id to source and target even though the give is face-down;
        // only the public copy is redacted.
        assert_eq!(recv_action(&mut rx1).cards, vec![CardId(8)]);
        assert_eq!(recv_action(&mut rx2).cards, vec![CardId(8)]);
        assert_eq!(recv_action(&mut rx3).cards, vec![CardId::ANY]);
        for rx in [&mut rx1, &mut rx2, &mut rx3] {
            assert_empty(rx);
        }
    }

    #[test]
    fn test_public_peek_still_sends_both_views() {
        let (p1, mut rx1) = seat(PlayerId(1));
        let (p2, mut rx2) = seat(PlayerId(2));
        let seats = vec![p1, p2];

        ActionViews::peek(PlayerId(1), DeckId(0), &[CardId(2)], true)
            .dispatch(&seats, &seats[0].sink);

        assert_eq!(recv_action(&mut rx1).cards, vec![CardId(2)]);
        assert_empty(&mut rx1);
        assert_eq!(recv_action(&mut rx2).cards, vec![CardId(2)]);
        assert_empty(&mut rx2);
    }

    #[test]
    fn test_leave_notifies_departed_player_through_their_own_sink() {
        let (p2, mut rx2) = seat(PlayerId(2));
        let seats = vec![p2];
        let (gone_tx, mut gone_rx) = mpsc::unbounded_channel();

        ActionViews::leave(PlayerId(1)).dispatch(&seats, &gone_tx);

        let departed = recv_action(&mut gone_rx);
        assert_eq!(departed.action, CommandId::GameLeave);
        assert!(departed.cards.is_empty());

        let public = recv_action(&mut rx2);
        assert_eq!(public.actor, PlayerId(1));
        assert_eq!(public.action, CommandId::GameLeave);
    }

    #[test]
    fn test_dispatch_survives_a_closed_sink() {
        let (p1, rx1) = seat(PlayerId(1));
        let (p2, mut rx2) = seat(PlayerId(2));
        drop(rx1);
        let seats = vec![p1, p2];

        ActionViews::shuffle(PlayerId(2), DeckId(0)).dispatch(&seats, &seats[1].sink);
        assert_eq!(recv_action(&mut rx2).action, CommandId::DeckShuffle);
    }
}
