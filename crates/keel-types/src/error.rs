//! Errors for transaction decoding

use keel_crypto::CryptoError;
use keel_rlp::RlpError;
use thiserror::Error;

/// Transaction decoding or signing error
#[derive(Debug, Error)]
pub enum TypeError {
    /// Malformed RLP
    #[error("rlp error: {0}")]
    Rlp(#[from] RlpError),

    /// Transaction is not an RLP list
    #[error("transaction must be an rlp list")]
    NotAList,

    /// Wrong number of transaction fields
    #[error("transaction has {0} fields, expected 9")]
    InvalidFieldCount(usize),

    /// Recipient is neither empty nor 20 bytes
    #[error("invalid recipient length: {0} bytes")]
    InvalidRecipient(usize),

    /// A scalar field does not fit its native width
    #[error("field `{0}` overflows")]
    FieldOverflow(&'static str),

    /// Signature components are malformed
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// Signer recovery failed
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

/// Result alias for transaction operations
pub type TypeResult<T> = Result<T, TypeError>;
