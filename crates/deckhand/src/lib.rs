//! # deckhand
//!
//! A coordination service for card and board games played over TCP. The
//! server owns the shared deck and every player's hidden hand, mutates them
//! on request, and routes per-recipient redacted notifications so each
//! client sees exactly what it is entitled to see and nothing more.
//!
//! Rule enforcement is deliberately absent, mirroring the trust model of
//! players around a physical table: the service will let you draw out of
//! turn, but it will never let you peek at a hand you were not shown.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use deckhand::prelude::*;
//!
//! # async fn run() -> Result<(), DeckhandError> {
//! let server = Server::bind(ServerConfig::default()).await?;
//! let admin = server.shutdown_handle();
//! tokio::spawn(run_admin_loop(admin));
//! server.run().await
//! # }
//! ```

mod client;
mod error;
mod handler;
mod server;

pub use client::Client;
pub use error::DeckhandError;
pub use server::{run_admin_loop, Server, ServerConfig, ShutdownHandle};

/// Re-exports everything a deckhand integrator needs.
pub mod prelude {
    pub use crate::{
        run_admin_loop, Client, DeckhandError, Server, ServerConfig,
        ShutdownHandle,
    };

    pub use deckhand_protocol::{
        CardId, CardSelector, CommandId, DeckId, DeckSelector, ErrorId, GameId,
        Notification, PlayerId, PlayerSelector, Request, DEFAULT_PORT,
    };

    pub use deckhand_engine::{EngineError, GameSpec};
    pub use deckhand_session::{SessionError, SessionState};
}
