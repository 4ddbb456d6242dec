//! Little-endian wire primitives.
//!
//! Every payload is built from a small set of composite primitives:
//!
//! | primitive          | encoding                                  |
//! |--------------------|-------------------------------------------|
//! | `u8`, `u16`, `u64` | raw little-endian                         |
//! | `bool`             | one byte; writer emits 0 or 1, reader     |
//! |                    | accepts any non-zero as `true`            |
//! | byte slice         | `u16` count, then `count` bytes           |
//! | string             | byte slice containing UTF-8               |
//! | slice of T         | `u16` count, then `count` encoded Ts      |
//!
//! [`WireWriter`] and [`WireReader`] walk these in lockstep: a payload type
//! implements [`WirePayload`] with an `encode` and a `decode` that visit the
//! same fields in the same order, and a round-trip test pins the symmetry.
//!
//! Reading is strict. Each getter fails with `Truncated` when the buffer runs
//! out, and [`WireReader::finish`] fails with `TrailingBytes` when the
//! payload claims more bytes than its fields account for.

use crate::ProtocolError;

/// Implemented by every command payload: symmetric encode/decode over the
/// wire primitives.
pub trait WirePayload: Sized {
    fn encode(&self, w: &mut WireWriter);
    fn decode(r: &mut WireReader<'_>) -> Result<Self, ProtocolError>;
}

// ---------------------------------------------------------------------------
// WireWriter
// ---------------------------------------------------------------------------

/// Appends wire primitives to a growable buffer.
///
/// Writing is infallible; length-field overflow (a slice longer than a `u16`
/// can count) is prevented by the per-command validation that runs before a
/// payload is framed, and guarded here with debug assertions.
#[derive(Debug, Default)]
pub struct WireWriter {
    buf: Vec<u8>,
}

impl WireWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Consumes the writer and returns the encoded payload.
    pub fn finish(self) -> Vec<u8> {
        self.buf
    }

    pub fn put_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn put_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn put_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn put_bool(&mut self, v: bool) {
        self.put_u8(u8::from(v));
    }

    pub fn put_bytes(&mut self, v: &[u8]) {
        debug_assert!(v.len() <= u16::MAX as usize);
        self.put_u16(v.len() as u16);
        self.buf.extend_from_slice(v);
    }

    pub fn put_string(&mut self, v: &str) {
        self.put_bytes(v.as_bytes());
    }

    pub fn put_u16_slice(&mut self, v: &[u16]) {
        debug_assert!(v.len() <= u16::MAX as usize);
        self.put_u16(v.len() as u16);
        for &x in v {
            self.put_u16(x);
        }
    }

    pub fn put_u64_slice(&mut self, v: &[u64]) {
        debug_assert!(v.len() <= u16::MAX as usize);
        self.put_u16(v.len() as u16);
        for &x in v {
            self.put_u64(x);
        }
    }

    pub fn put_string_slice(&mut self, v: &[String]) {
        debug_assert!(v.len() <= u16::MAX as usize);
        self.put_u16(v.len() as u16);
        for s in v {
            self.put_string(s);
        }
    }

    pub fn put_u16_nested(&mut self, v: &[Vec<u16>]) {
        debug_assert!(v.len() <= u16::MAX as usize);
        self.put_u16(v.len() as u16);
        for inner in v {
            self.put_u16_slice(inner);
        }
    }
}

// ---------------------------------------------------------------------------
// WireReader
// ---------------------------------------------------------------------------

/// Consumes wire primitives from a payload buffer, tracking its position so
/// the caller can verify the payload was consumed exactly.
#[derive(Debug)]
pub struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Fails with `TrailingBytes` unless the buffer was consumed exactly.
    pub fn finish(self) -> Result<(), ProtocolError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(ProtocolError::TrailingBytes(n)),
        }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], ProtocolError> {
        if self.remaining() < n {
            return Err(ProtocolError::Truncated {
                needed: n - self.remaining(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn get_u8(&mut self) -> Result<u8, ProtocolError> {
        Ok(self.take(1)?[0])
    }

    pub fn get_u16(&mut self) -> Result<u16, ProtocolError> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn get_u64(&mut self) -> Result<u64, ProtocolError> {
        let bytes = self.take(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(raw))
    }

    pub fn get_bool(&mut self) -> Result<bool, ProtocolError> {
        Ok(self.get_u8()? != 0)
    }

    pub fn get_bytes(&mut self) -> Result<Vec<u8>, ProtocolError> {
        let count = self.get_u16()? as usize;
        Ok(self.take(count)?.to_vec())
    }

    pub fn get_string(&mut self) -> Result<String, ProtocolError> {
        let bytes = self.get_bytes()?;
        String::from_utf8(bytes).map_err(|_| ProtocolError::InvalidUtf8)
    }

    pub fn get_u16_slice(&mut self) -> Result<Vec<u16>, ProtocolError> {
        let count = self.get_u16()? as usize;
        let mut out = Vec::with_capacity(count.min(self.remaining() / 2 + 1));
        for _ in 0..count {
            out.push(self.get_u16()?);
        }
        Ok(out)
    }

    pub fn get_u64_slice(&mut self) -> Result<Vec<u64>, ProtocolError> {
        let count = self.get_u16()? as usize;
        let mut out = Vec::with_capacity(count.min(self.remaining() / 8 + 1));
        for _ in 0..count {
            out.push(self.get_u64()?);
        }
        Ok(out)
    }

    pub fn get_string_slice(&mut self) -> Result<Vec<String>, ProtocolError> {
        let count = self.get_u16()? as usize;
        let mut out = Vec::with_capacity(count.min(self.remaining() / 2 + 1));
        for _ in 0..count {
            out.push(self.get_string()?);
        }
        Ok(out)
    }

    pub fn get_u16_nested(&mut self) -> Result<Vec<Vec<u16>>, ProtocolError> {
        let count = self.get_u16()? as usize;
        let mut out = Vec::with_capacity(count.min(self.remaining() / 2 + 1));
        for _ in 0..count {
            out.push(self.get_u16_slice()?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitives_round_trip() {
        let mut w = WireWriter::new();
        w.put_u8(0xAB);
        w.put_u16(0x1234);
        w.put_u64(0x0102_0304_0506_0708);
        w.put_bool(true);
        w.put_bool(false);

        let buf = w.finish();
        let mut r = WireReader::new(&buf);
        assert_eq!(r.get_u8().unwrap(), 0xAB);
        assert_eq!(r.get_u16().unwrap(), 0x1234);
        assert_eq!(r.get_u64().unwrap(), 0x0102_0304_0506_0708);
        assert!(r.get_bool().unwrap());
        assert!(!r.get_bool().unwrap());
        r.finish().unwrap();
    }

    #[test]
    fn test_integers_are_little_endian() {
        let mut w = WireWriter::new();
        w.put_u16(0x342F);
        assert_eq!(w.finish(), vec![0x2F, 0x34]);

        let mut w = WireWriter::new();
        w.put_u64(1);
        assert_eq!(w.finish(), vec![1, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_bool_reads_any_nonzero_as_true() {
        let mut r = WireReader::new(&[0x00, 0x01, 0x7F]);
        assert!(!r.get_bool().unwrap());
        assert!(r.get_bool().unwrap());
        assert!(r.get_bool().unwrap());
    }

    #[test]
    fn test_slices_round_trip() {
        let mut w = WireWriter::new();
        w.put_bytes(b"spec");
        w.put_string("Alice");
        w.put_u16_slice(&[1, 2, 3]);
        w.put_u64_slice(&[10, 20]);
        w.put_string_slice(&["a".into(), "bc".into()]);
        w.put_u16_nested(&[vec![], vec![5, 6]]);

        let buf = w.finish();
        let mut r = WireReader::new(&buf);
        assert_eq!(r.get_bytes().unwrap(), b"spec");
        assert_eq!(r.get_string().unwrap(), "Alice");
        assert_eq!(r.get_u16_slice().unwrap(), vec![1, 2, 3]);
        assert_eq!(r.get_u64_slice().unwrap(), vec![10, 20]);
        assert_eq!(r.get_string_slice().unwrap(), vec!["a", "bc"]);
        assert_eq!(r.get_u16_nested().unwrap(), vec![vec![], vec![5, 6]]);
        r.finish().unwrap();
    }

    #[test]
    fn test_empty_slices_encode_as_zero_count() {
        let mut w = WireWriter::new();
        w.put_bytes(&[]);
        w.put_u16_slice(&[]);
        assert_eq!(w.finish(), vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_truncated_read_fails() {
        let mut r = WireReader::new(&[0x01]);
        assert!(matches!(
            r.get_u16(),
            Err(ProtocolError::Truncated { needed: 1 })
        ));
    }

    #[test]
    fn test_slice_with_lying_count_fails() {
        // Count claims 4 entries but only one fits.
        let mut r = WireReader::new(&[0x04, 0x00, 0xAA, 0xBB]);
        assert!(matches!(
            r.get_u16_slice(),
            Err(ProtocolError::Truncated { .. })
        ));
    }

    #[test]
    fn test_finish_rejects_trailing_bytes() {
        let mut r = WireReader::new(&[0x01, 0xFF, 0xFF]);
        r.get_u8().unwrap();
        assert!(matches!(
            r.finish(),
            Err(ProtocolError::TrailingBytes(2))
        ));
    }

    #[test]
    fn test_invalid_utf8_string_fails() {
        let mut r = WireReader::new(&[0x02, 0x00, 0xC3, 0x28]);
        assert!(matches!(r.get_string(), Err(ProtocolError::InvalidUtf8)));
    }
}
