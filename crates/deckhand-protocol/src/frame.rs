//! Frame layer: `id:u8 | length:u16 | payload`.
//!
//! The 16-bit length bounds only the payload, never the header. Reading is
//! strict: `read_exact` loops until the full frame is consumed or the
//! transport fails, and the header's length is checked against the command's
//! registered bounds *before* a single payload byte is read, so a peer
//! cannot pin the reader by advertising bytes it never sends.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use crate::command::CommandId;
use crate::wire::WirePayload;
use crate::ProtocolError;

/// Bytes in a frame header.
pub const FRAME_HEADER_LEN: usize = 3;

/// The queue end a fully encoded frame is pushed into for delivery to one
/// peer. Each connection owns a writer task that drains its sink onto the
/// socket, so notification fan-out never blocks on a slow receiver's TCP
/// window. There is no backpressure beyond TCP itself.
pub type FrameSink = mpsc::UnboundedSender<Vec<u8>>;

/// A decoded frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub command: u8,
    pub length: u16,
}

impl FrameHeader {
    pub fn to_bytes(self) -> [u8; FRAME_HEADER_LEN] {
        let len = self.length.to_le_bytes();
        [self.command, len[0], len[1]]
    }

    pub fn from_bytes(bytes: [u8; FRAME_HEADER_LEN]) -> Self {
        Self {
            command: bytes[0],
            length: u16::from_le_bytes([bytes[1], bytes[2]]),
        }
    }
}

/// Encodes a payload into a complete frame, validating the payload length
/// against the command's registered bounds.
pub fn frame(cmd: CommandId, payload: &impl WirePayload) -> Result<Vec<u8>, ProtocolError> {
    let mut w = crate::wire::WireWriter::new();
    payload.encode(&mut w);
    let body = w.finish();
    if body.len() > u16::MAX as usize {
        return Err(ProtocolError::ValueTooLarge(body.len()));
    }
    let len = body.len() as u16;
    let (min, max) = cmd.length_bounds();
    if len < min || len > max {
        return Err(ProtocolError::LengthOutOfBounds { cmd, len, min, max });
    }
    let mut out = Vec::with_capacity(FRAME_HEADER_LEN + body.len());
    out.extend_from_slice(
        &FrameHeader {
            command: cmd.as_u8(),
            length: len,
        }
        .to_bytes(),
    );
    out.extend_from_slice(&body);
    Ok(out)
}

/// Encodes a frame for a command that carries no payload.
pub fn empty_frame(cmd: CommandId) -> Vec<u8> {
    debug_assert_eq!(cmd.length_bounds(), (0, 0));
    FrameHeader {
        command: cmd.as_u8(),
        length: 0,
    }
    .to_bytes()
    .to_vec()
}

/// Reads one frame: header, registry checks, then exactly `length` payload
/// bytes. Any failure here is fatal for the connection that produced it.
pub async fn read_frame<R>(reader: &mut R) -> Result<(CommandId, Vec<u8>), ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let mut header_bytes = [0u8; FRAME_HEADER_LEN];
    reader.read_exact(&mut header_bytes).await?;
    let header = FrameHeader::from_bytes(header_bytes);

    let cmd = CommandId::from_u8(header.command)?;
    let (min, max) = cmd.length_bounds();
    if header.length < min || header.length > max {
        return Err(ProtocolError::LengthOutOfBounds {
            cmd,
            len: header.length,
            min,
            max,
        });
    }

    let mut payload = vec![0u8; header.length as usize];
    reader.read_exact(&mut payload).await?;
    Ok((cmd, payload))
}

/// Writes one pre-encoded frame and flushes it.
pub async fn write_frame<W>(writer: &mut W, bytes: &[u8]) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(bytes).await?;
    writer.flush().await?;
    Ok(())
}
