//! The deckhand game engine.
//!
//! This crate owns everything that happens after a command has been decoded
//! and found legal for its session state:
//!
//! - **Specs** ([`GameSpec`]) - the ordered card-name list and its gzip+YAML
//!   wire envelope.
//! - **Games** ([`Game`]) - deck, seats, hands, and the RNG, mutated only
//!   with the game's lock held.
//! - **Visibility** ([`ActionViews`]) - the source/target/public redaction
//!   triple computed for every action, and its delivery rules.
//! - **The directory** ([`GameDirectory`]) - game id allocation, lookup,
//!   and the empty-game sweep.
//!
//! The engine enforces *mechanics*, never rules: it will happily draw the
//! whole deck into one hand or shuffle mid-trick, exactly like a table of
//! humans would let you. What it guarantees is accounting (no card is ever
//! duplicated or lost) and visibility (nobody learns a hidden card id they
//! were not shown).

mod directory;
mod error;
mod game;
mod spec;
mod visibility;

pub use directory::{DirectoryConfig, GameDirectory};
pub use error::EngineError;
pub use game::{Game, Seat};
pub use spec::{GameSpec, SpecError};
pub use visibility::ActionViews;
