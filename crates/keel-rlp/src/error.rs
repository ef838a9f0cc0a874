//! RLP errors

use thiserror::Error;

/// RLP decoding error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RlpError {
    /// Input ended before the announced payload
    #[error("rlp input too short: need {needed} bytes at offset {offset}, have {available}")]
    InputTooShort {
        /// Offset of the item that overran
        offset: usize,
        /// Bytes the prefix announced
        needed: usize,
        /// Bytes actually left
        available: usize,
    },

    /// Empty input where an item was expected
    #[error("rlp input is empty")]
    Empty,

    /// A length-of-length does not fit the native offset width
    #[error("rlp length of {0} bytes overflows")]
    LengthOverflow(usize),

    /// Bytes left over after the top-level item
    #[error("rlp has {0} trailing bytes")]
    TrailingBytes(usize),

    /// Lists nested past the decoder's limit
    #[error("rlp nesting deeper than {0}")]
    TooDeep(usize),

    /// A string was found where a list was required, or vice versa
    #[error("unexpected rlp item: expected {0}")]
    UnexpectedItem(&'static str),
}

/// Result alias for RLP operations
pub type RlpResult<T> = Result<T, RlpError>;
