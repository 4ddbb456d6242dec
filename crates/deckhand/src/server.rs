//! The deckhand server: configuration, accept loop, and shutdown.
//!
//! One task per accepted connection, plus the accept loop itself and (in the
//! binary) the admin stdin loop. Shared state is two short-lived directory
//! mutexes; per-game state hides behind each game's own lock.
//!
//! Lock order, everywhere in this crate: player registry, then game
//! directory, then at most one game lock. Neither directory mutex is ever
//! held across a socket write; notifications are enqueued on per-connection
//! sinks and written by each connection's writer task.

use std::net::SocketAddr;
use std::sync::Arc;

use deckhand_engine::{DirectoryConfig, GameDirectory};
use deckhand_protocol::{empty_frame, CommandId, DEFAULT_PORT};
use deckhand_session::{PlayerRegistry, RegistryConfig};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::{watch, Mutex};

use crate::handler::handle_connection;
use crate::DeckhandError;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind_addr: String,
    /// Connected-player cap.
    pub max_players: usize,
    /// Fixed per-game RNG seed; tests only.
    pub rng_seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: format!("0.0.0.0:{DEFAULT_PORT}"),
            max_players: RegistryConfig::default().max_players,
            rng_seed: None,
        }
    }
}

/// Shared state handed to every connection handler.
pub(crate) struct ServerState {
    pub(crate) players: Mutex<PlayerRegistry>,
    pub(crate) games: Mutex<GameDirectory>,
}

/// A handle that triggers the shutdown sequence from outside the accept
/// loop (the admin loop, tests, signal handlers).
#[derive(Clone)]
pub struct ShutdownHandle(watch::Sender<bool>);

impl ShutdownHandle {
    pub fn shutdown(&self) {
        let _ = self.0.send(true);
    }
}

/// A bound deckhand server. Call [`run`](Self::run) to accept connections.
pub struct Server {
    listener: TcpListener,
    state: Arc<ServerState>,
    shutdown_tx: watch::Sender<bool>,
}

impl Server {
    /// Binds the listener and prepares the shared state.
    pub async fn bind(config: ServerConfig) -> Result<Self, DeckhandError> {
        let listener = TcpListener::bind(&config.bind_addr).await?;
        tracing::info!(addr = %config.bind_addr, "deckhand listening");

        let state = Arc::new(ServerState {
            players: Mutex::new(PlayerRegistry::new(RegistryConfig {
                max_players: config.max_players,
            })),
            games: Mutex::new(GameDirectory::new(DirectoryConfig {
                rng_seed: config.rng_seed,
            })),
        });
        let (shutdown_tx, _) = watch::channel(false);

        Ok(Self {
            listener,
            state,
            shutdown_tx,
        })
    }

    /// The actual bound address; useful when binding port 0.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle(self.shutdown_tx.clone())
    }

    /// Accepts connections until shutdown is requested, then runs the
    /// shutdown sequence: stop accepting, notify every player, close every
    /// socket, clear the directory.
    pub async fn run(self) -> Result<(), DeckhandError> {
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => break,
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, addr)) => {
                            tracing::debug!(%addr, "connection accepted");
                            let state = Arc::clone(&self.state);
                            let shutdown = self.shutdown_tx.subscribe();
                            tokio::spawn(async move {
                                handle_connection(stream, state, shutdown).await;
                            });
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "accept failed");
                        }
                    }
                }
            }
        }

        tracing::info!("shutting down");
        drop(self.listener);

        // Notify everyone, then drop every sink. Each writer task drains
        // what is queued (the shutdown frame last) and closes its socket.
        let shutdown_frame = empty_frame(CommandId::NotifyServerShutdown);
        {
            let mut players = self.state.players.lock().await;
            let notified = players.broadcast(&shutdown_frame);
            tracing::info!(notified, "shutdown broadcast sent");
            players.clear();
        }
        self.state.games.lock().await.clear();
        Ok(())
    }
}

/// Reads line-oriented admin input from stdin. The single recognised
/// command is `quit`, which triggers the shutdown sequence.
pub async fn run_admin_loop(handle: ShutdownHandle) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line.trim() == "quit" {
                    tracing::info!("admin requested shutdown");
                    handle.shutdown();
                    return;
                }
                tracing::warn!(input = %line.trim(), "unrecognised admin command");
            }
            Ok(None) => return,
            Err(e) => {
                tracing::error!(error = %e, "admin input failed");
                return;
            }
        }
    }
}
