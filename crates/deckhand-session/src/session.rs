//! The per-connection session state machine.
//!
//! Every connection walks the same four states:
//!
//! ```text
//!   Unauthenticated ──(valid HANDSHAKE)──→ Lobby ──(create/join)──→ InGame
//!         │                                  ↑                        │
//!         │                                  └──────(GAME_LEAVE)──────┘
//!         └──────────────── any fatal condition ────────────→ Closed
//! ```
//!
//! The state decides which commands a frame may carry. A command outside the
//! current state's set is answered with `INVALID_CMD_ID` and the connection
//! closes; the one exception is `Unauthenticated`, where anything but a
//! handshake closes the connection with no reply at all.

use std::fmt;

use deckhand_protocol::CommandId;

/// The lifecycle state of one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Socket is open but no handshake has been accepted yet.
    Unauthenticated,
    /// Handshake done; the player exists but sits in no game.
    Lobby,
    /// The player is seated in exactly one game.
    InGame,
    /// Terminal. The socket is gone or about to be.
    Closed,
}

impl SessionState {
    /// Returns `true` if a client frame carrying `cmd` is legal in this
    /// state. Server-to-client ids are never legal from a client.
    pub fn permits(self, cmd: CommandId) -> bool {
        use CommandId::*;
        match self {
            Self::Unauthenticated => matches!(cmd, Handshake),
            Self::Lobby => matches!(cmd, Keepalive | Disconnect | GameCreate | GameJoin),
            Self::InGame => matches!(
                cmd,
                Keepalive
                    | Disconnect
                    | InfoPlayers
                    | InfoDecks
                    | InfoCards
                    | CardDraw
                    | CardShow
                    | CardPutback
                    | CardDiscard
                    | CardGive
                    | DeckPeek
                    | DeckShuffle
                    | GameLeave
            ),
            Self::Closed => false,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Lobby => "lobby",
            Self::InGame => "in-game",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckhand_protocol::CommandId::*;

    #[test]
    fn test_unauthenticated_accepts_only_handshake() {
        let s = SessionState::Unauthenticated;
        assert!(s.permits(Handshake));
        assert!(!s.permits(Keepalive));
        assert!(!s.permits(GameCreate));
        assert!(!s.permits(CardDraw));
    }

    #[test]
    fn test_lobby_accepts_game_setup_but_not_card_actions() {
        let s = SessionState::Lobby;
        assert!(s.permits(Keepalive));
        assert!(s.permits(GameCreate));
        assert!(s.permits(GameJoin));
        assert!(s.permits(Disconnect));
        assert!(!s.permits(Handshake));
        assert!(!s.permits(CardDraw));
        assert!(!s.permits(GameLeave));
        assert!(!s.permits(InfoPlayers));
    }

    #[test]
    fn test_in_game_accepts_actions_but_not_game_setup() {
        let s = SessionState::InGame;
        for cmd in [
            Keepalive, Disconnect, InfoPlayers, InfoDecks, InfoCards, CardDraw,
            CardShow, CardPutback, CardDiscard, CardGive, DeckPeek, DeckShuffle,
            GameLeave,
        ] {
            assert!(s.permits(cmd), "{cmd:?} should be legal in-game");
        }
        assert!(!s.permits(Handshake));
        assert!(!s.permits(GameCreate));
        assert!(!s.permits(GameJoin));
    }

    #[test]
    fn test_server_to_client_ids_are_never_permitted() {
        for state in [
            SessionState::Unauthenticated,
            SessionState::Lobby,
            SessionState::InGame,
            SessionState::Closed,
        ] {
            for cmd in [
                HandshakeResponse,
                InfoPlayersResponse,
                NotifyPlayerAction,
                NotifyGameJoined,
                NotifyServerShutdown,
                NotifyInputError,
            ] {
                assert!(!state.permits(cmd), "{cmd:?} illegal in {state}");
            }
        }
    }

    #[test]
    fn test_closed_permits_nothing() {
        assert!(!SessionState::Closed.permits(Keepalive));
        assert!(SessionState::Closed.is_terminal());
    }
}
