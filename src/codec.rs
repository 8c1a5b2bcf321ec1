//! Offset key encoding
//!
//! Offsets are encoded as fixed-width big-endian bytes so that comparing two
//! keys byte by byte gives the same answer as comparing the offsets. Sinks can
//! store and range-scan the raw keys without decoding them.

use crate::error::{Error, Result};
use crate::types::Offset;
use bytes::Bytes;
use std::fmt;

/// Width of an encoded offset key in bytes
pub const OFFSET_KEY_LEN: usize = 8;

/// Encode an offset into an order-preserving key
pub fn encode_offset(offset: Offset) -> [u8; OFFSET_KEY_LEN] {
    offset.to_be_bytes()
}

/// Decode a key produced by [`encode_offset`]
pub fn decode_offset(bytes: &[u8]) -> Result<Offset> {
    let raw: [u8; OFFSET_KEY_LEN] = bytes.try_into().map_err(|_| {
        Error::decode(format!(
            "expected {OFFSET_KEY_LEN} bytes, got {}",
            bytes.len()
        ))
    })?;
    Ok(Offset::from_be_bytes(raw))
}

/// Idempotency token handed to an effectively-once sink
///
/// Ordering is byte-lexicographic over the encoded offset, which matches
/// offset ordering.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DedupKey(Bytes);

impl DedupKey {
    /// Build the key for an offset
    pub fn from_offset(offset: Offset) -> Self {
        Self(Bytes::copy_from_slice(&encode_offset(offset)))
    }

    /// Wrap raw key bytes read back from a sink, validating their shape
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Result<Self> {
        let bytes = bytes.into();
        decode_offset(&bytes)?;
        Ok(Self(bytes))
    }

    /// Raw encoded bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Decoded offset
    pub fn offset(&self) -> Offset {
        // Length is checked at construction.
        let mut raw = [0u8; OFFSET_KEY_LEN];
        raw.copy_from_slice(&self.0);
        Offset::from_be_bytes(raw)
    }

    /// Consume into the underlying buffer
    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl AsRef<[u8]> for DedupKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for DedupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0.iter() {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for DedupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DedupKey({self} @ {})", self.offset())
    }
}
