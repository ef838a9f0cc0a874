//! Common error types for primitives

use thiserror::Error;

use crate::address::AddressError;
use crate::hash::HashError;

/// Primitive operation error
#[derive(Debug, Error)]
pub enum PrimitiveError {
    /// Address error
    #[error("address error: {0}")]
    Address(#[from] AddressError),

    /// Hash error
    #[error("hash error: {0}")]
    Hash(#[from] HashError),

    /// Hex decoding error
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    /// Byte sequence too long to fit in a word
    #[error("value of {0} bytes does not fit in a 32-byte word")]
    WordOverflow(usize),
}
