//! The player registry: the player half of the server directory.
//!
//! Tracks every connected player, allocates their ids, and holds the frame
//! sink each connection's writer task drains. Like the game directory, the
//! registry is a plain map owned by a mutex one layer up; it does no locking
//! of its own and is only ever touched with the directory lock held.

use std::collections::HashMap;

use deckhand_protocol::{FrameSink, GameId, PlayerId, MAX_PLAYER_NAME_LEN};

use crate::SessionError;

/// Registry limits.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Connected-player cap; registration beyond it is refused with
    /// `SERVER_FULL`.
    pub max_players: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self { max_players: 512 }
    }
}

/// One connected player.
#[derive(Debug)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub sink: FrameSink,
    /// The game this player is seated in, if any. Kept in lockstep with the
    /// game's seat list: non-`None` exactly when a seat exists.
    pub game: Option<GameId>,
}

/// All connected players, keyed by id.
pub struct PlayerRegistry {
    config: RegistryConfig,
    next_id: u64,
    players: HashMap<PlayerId, Player>,
}

impl PlayerRegistry {
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            next_id: 1,
            players: HashMap::new(),
        }
    }

    /// Validates a handshake name: at most 64 bytes, no ASCII whitespace.
    /// Empty is allowed at handshake time; games demand a real name later.
    pub fn validate_handshake_name(name: &str) -> Result<(), SessionError> {
        if name.len() > MAX_PLAYER_NAME_LEN {
            return Err(SessionError::InvalidName("longer than 64 bytes"));
        }
        if name.contains([' ', '\t', '\r', '\n']) {
            return Err(SessionError::InvalidName("contains whitespace"));
        }
        Ok(())
    }

    /// Registers a new player, allocating the next id.
    ///
    /// Ids increase monotonically and are never reused within one server
    /// lifetime, so a stale id can never alias a different player.
    pub fn register(
        &mut self,
        name: &str,
        sink: FrameSink,
    ) -> Result<PlayerId, SessionError> {
        Self::validate_handshake_name(name)?;
        if self.players.len() >= self.config.max_players {
            return Err(SessionError::ServerFull(self.players.len()));
        }

        let id = PlayerId(self.next_id);
        if id > PlayerId::MAX_ASSIGNABLE {
            return Err(SessionError::ServerFull(self.players.len()));
        }
        self.next_id += 1;

        self.players.insert(
            id,
            Player {
                id,
                name: name.to_string(),
                sink,
                game: None,
            },
        );
        tracing::info!(player_id = %id, name, "player registered");
        Ok(id)
    }

    /// Removes a player, returning their entry if they were registered.
    pub fn remove(&mut self, id: PlayerId) -> Option<Player> {
        let player = self.players.remove(&id);
        if player.is_some() {
            tracing::info!(player_id = %id, "player removed");
        }
        player
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    /// Records which game a player is seated in. Callers update this in the
    /// same operation that adds or removes the seat.
    pub fn set_game(
        &mut self,
        id: PlayerId,
        game: Option<GameId>,
    ) -> Result<(), SessionError> {
        let player = self
            .players
            .get_mut(&id)
            .ok_or(SessionError::NotFound(id))?;
        player.game = game;
        Ok(())
    }

    /// Enqueues one frame to every connected player. Returns how many sinks
    /// accepted it; a closed sink means that session is already tearing down.
    pub fn broadcast(&self, bytes: &[u8]) -> usize {
        let mut delivered = 0;
        for player in self.players.values() {
            if player.sink.send(bytes.to_vec()).is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    /// Drops every entry. Sinks close as they are dropped, which ends each
    /// connection's writer task after it drains what was already queued.
    pub fn clear(&mut self) {
        self.players.clear();
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
