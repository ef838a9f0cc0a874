//! Hex transport helpers.
//!
//! The low-level codec accepts hex without a `0x` prefix; the API layer
//! (addresses, CLI arguments, fixtures) writes it with one. Both parsers
//! below accept either form.

use crate::error::PrimitiveError;

/// Decode a hex string, with or without `0x`, into bytes.
///
/// An empty string (or a bare `0x`) decodes to an empty vector.
pub fn decode(s: &str) -> Result<Vec<u8>, PrimitiveError> {
    let s = s.trim();
    let s = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
    ::hex::decode(s).map_err(|e| PrimitiveError::InvalidHex(e.to_string()))
}

/// Encode bytes as lowercase hex without a prefix.
pub fn encode(bytes: impl AsRef<[u8]>) -> String {
    ::hex::encode(bytes)
}

/// Encode bytes as lowercase hex with a `0x` prefix.
pub fn encode_prefixed(bytes: impl AsRef<[u8]>) -> String {
    format!("0x{}", ::hex::encode(bytes))
}
