//! Error types for the protocol layer.
//!
//! Every variant here is a *fatal* condition for the connection that produced
//! it: a peer that sends an unknown id, lies about a payload length, or
//! produces bytes the payload walker cannot account for is not speaking the
//! protocol, and the session is closed without a reply. Semantic errors
//! (valid frames asking for impossible things) are a different animal and
//! travel the other way, as `NOTIFY_INPUT_ERROR` frames.

use crate::command::CommandId;

/// Errors produced while framing, encoding, or decoding protocol traffic.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The header named a command id outside the registry.
    #[error("unknown command id {0}")]
    UnknownCommand(u8),

    /// The header's payload length falls outside the command's registered
    /// bounds. Checked before the payload is read, so a peer cannot pin the
    /// reader by claiming a huge payload it never sends.
    #[error("length {len} outside [{min}, {max}] for {cmd:?}")]
    LengthOutOfBounds {
        cmd: CommandId,
        len: u16,
        min: u16,
        max: u16,
    },

    /// The payload ended before a field was fully read.
    #[error("payload truncated: {needed} more bytes required")]
    Truncated { needed: usize },

    /// The payload walker finished with bytes left over. The frame length
    /// and the payload contents disagree, so the frame is malformed.
    #[error("{0} unconsumed bytes after payload")]
    TrailingBytes(usize),

    /// A string field was not valid UTF-8.
    #[error("string field is not valid UTF-8")]
    InvalidUtf8,

    /// Parallel arrays in one payload disagree on length.
    #[error("parallel arrays disagree on length")]
    ParallelArrayMismatch,

    /// An encoder was handed a value too large for its on-wire length field.
    #[error("value too large to encode: {0} bytes")]
    ValueTooLarge(usize),

    /// An error-notification frame named an error id outside the taxonomy.
    #[error("unknown error id {0}")]
    UnknownErrorId(u8),

    /// The underlying transport failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
