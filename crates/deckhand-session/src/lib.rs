//! Session management for deckhand.
//!
//! Two concerns live here:
//!
//! 1. **The session state machine** ([`SessionState`]) - which commands a
//!    connection may send at each point in its life.
//! 2. **The player registry** ([`PlayerRegistry`]) - the player half of the
//!    server directory: id allocation, name rules, capacity, and the frame
//!    sink for each connection.
//!
//! ```text
//! Server facade (above)  ← owns the registry behind the directory lock
//!     ↕
//! Session layer (this crate)
//!     ↕
//! Protocol layer (below) ← provides PlayerId, CommandId, FrameSink
//! ```

mod error;
mod registry;
mod session;

pub use error::SessionError;
pub use registry::{Player, PlayerRegistry, RegistryConfig};
pub use session::SessionState;
