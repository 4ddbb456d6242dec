//! Wire protocol for deckhand.
//!
//! This crate defines the language clients and servers speak:
//!
//! - **Id spaces** ([`PlayerId`], [`GameId`], [`DeckId`], [`CardId`]) with
//!   their reserved sentinels, plus the selector enums that request-side
//!   code uses instead of raw sentinel integers.
//! - **Wire primitives** ([`WireReader`], [`WireWriter`], [`WirePayload`]) -
//!   strict little-endian encode/decode for every composite field.
//! - **Frames** ([`read_frame`], [`write_frame`]) - the
//!   `id:u8 | length:u16 | payload` unit, with length bounds enforced before
//!   payload bytes are read.
//! - **Commands** ([`CommandId`], [`Request`], [`Notification`]) - the
//!   registry and every payload shape.
//!
//! The protocol layer knows nothing about sessions, games, or sockets beyond
//! reading and writing frames; higher layers give the bytes meaning.

mod command;
mod error;
mod frame;
mod ids;
mod wire;

pub use command::{
    CardDiscard, CardDraw, CardGive, CardInfoResponse, CardPutback, CardShow,
    CommandId, DeckInfoResponse, DeckPeek, DeckShuffle, Direction, ErrorId,
    GameCreate, GameJoin, Handshake, HandshakeResponse, Notification,
    NotifyGameJoined, NotifyInputError, NotifyPlayerAction, PlayerInfoResponse,
    Request, DEFAULT_PORT, MAX_PLAYER_NAME_LEN, MAX_SPEC_DATA_LEN,
    PROTOCOL_ID, PROTOCOL_MAGIC,
};
pub use error::ProtocolError;
pub use frame::{
    empty_frame, frame, read_frame, write_frame, FrameHeader, FrameSink,
    FRAME_HEADER_LEN,
};
pub use ids::{
    CardId, CardSelector, DeckId, DeckSelector, GameId, PlayerId, PlayerSelector,
};
pub use wire::{WirePayload, WireReader, WireWriter};
