//! The game directory: the game half of the server directory.
//!
//! Allocates game ids, hands out the per-game locks, and sweeps games whose
//! last member left. The directory itself lives behind the server's
//! directory lock; lock order is always directory before game, and no
//! operation ever holds two game locks.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use deckhand_protocol::GameId;
use tokio::sync::Mutex;

use crate::{Game, GameSpec};

/// Directory configuration.
#[derive(Debug, Clone, Default)]
pub struct DirectoryConfig {
    /// Fixed RNG seed for every created game. Production leaves this unset
    /// and seeds from the wall clock; tests inject a constant to make
    /// shuffles and random picks reproducible.
    pub rng_seed: Option<u64>,
}

/// All live games, keyed by id.
pub struct GameDirectory {
    config: DirectoryConfig,
    next_id: u64,
    games: HashMap<GameId, Arc<Mutex<Game>>>,
}

impl GameDirectory {
    pub fn new(config: DirectoryConfig) -> Self {
        Self {
            config,
            next_id: 1,
            games: HashMap::new(),
        }
    }

    fn next_seed(&self) -> u64 {
        self.config.rng_seed.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or_default()
        })
    }

    /// Creates a game from a decoded spec and the envelope it arrived in,
    /// and shuffles its deck once. The caller seats the creator under the
    /// new game's lock.
    pub fn create(
        &mut self,
        spec: Arc<GameSpec>,
        envelope: Vec<u8>,
    ) -> (GameId, Arc<Mutex<Game>>) {
        let id = GameId(self.next_id);
        self.next_id += 1;

        let mut game = Game::new(id, spec, envelope, self.next_seed());
        game.shuffle();

        let handle = Arc::new(Mutex::new(game));
        self.games.insert(id, Arc::clone(&handle));
        tracing::info!(game_id = %id, "game created");
        (id, handle)
    }

    pub fn get(&self, id: GameId) -> Option<Arc<Mutex<Game>>> {
        self.games.get(&id).cloned()
    }

    /// Detaches every game with no members left. Each game's lock is taken
    /// exactly once and the emptiness check and the detach happen under it,
    /// so a join racing the sweep either lands before the check or finds
    /// the game already gone.
    pub async fn sweep_empty(&mut self) {
        let mut empty = Vec::new();
        for (&id, handle) in &self.games {
            if handle.lock().await.is_empty() {
                empty.push(id);
            }
        }
        for id in empty {
            self.games.remove(&id);
            tracing::info!(game_id = %id, "empty game swept");
        }
    }

    /// Drops every game. Used by server shutdown after the shutdown
    /// notification has been broadcast.
    pub fn clear(&mut self) {
        self.games.clear();
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckhand_protocol::PlayerId;
    use tokio::sync::mpsc;

    fn spec() -> Arc<GameSpec> {
        GameSpec::new(vec!["A".into(), "B".into(), "C".into()]).unwrap()
    }

    fn directory() -> GameDirectory {
        GameDirectory::new(DirectoryConfig { rng_seed: Some(42) })
    }

    #[tokio::test]
    async fn test_game_ids_start_at_one_and_increase() {
        let mut dir = directory();
        let (a, _) = dir.create(spec(), Vec::new());
        let (b, _) = dir.create(spec(), Vec::new());
        assert_eq!(a, GameId(1));
        assert_eq!(b, GameId(2));
        assert!(dir.get(a).is_some());
        assert!(dir.get(GameId(99)).is_none());
    }

    #[tokio::test]
    async fn test_creation_shuffle_is_seeded() {
        let mut dir_a = directory();
        let mut dir_b = directory();
        let (_, game_a) = dir_a.create(spec(), Vec::new());
        let (_, game_b) = dir_b.create(spec(), Vec::new());
        assert_eq!(
            game_a.lock().await.deck(),
            game_b.lock().await.deck(),
            "same seed must give the same creation shuffle"
        );
    }

    #[tokio::test]
    async fn test_sweep_removes_only_empty_games() {
        let mut dir = directory();
        let (empty_id, _) = dir.create(spec(), Vec::new());
        let (occupied_id, occupied) = dir.create(spec(), Vec::new());

        let (tx, _rx) = mpsc::unbounded_channel();
        occupied
            .lock()
            .await
            .seat_player(PlayerId(1), "ana", tx)
            .unwrap();

        dir.sweep_empty().await;
        assert!(dir.get(empty_id).is_none());
        assert!(dir.get(occupied_id).is_some());
        assert_eq!(dir.len(), 1);
    }

    #[tokio::test]
    async fn test_swept_ids_are_never_reallocated() {
        let mut dir = directory();
        let (first, _) = dir.create(spec(), Vec::new());
        dir.sweep_empty().await;
        let (second, _) = dir.create(spec(), Vec::new());
        assert_eq!(first, GameId(1));
        assert_eq!(second, GameId(2));
    }
}
