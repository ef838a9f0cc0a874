//! # keel-primitives
//!
//! Primitive types for the Keel EVM.
//!
//! Everything the interpreter passes around is built from three shapes:
//! - [`Word`]: the 256-bit machine word (an alias of `primitive_types::U256`)
//! - [`Address`]: a 20-byte account address
//! - [`H256`]: a 32-byte hash
//!
//! The [`word`] module holds the big-endian codecs between words and bytes,
//! and the [`hex`](crate::hex) module holds the textual transport used by tests and the CLI.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod address;
mod error;
mod hash;
pub mod hex;
pub mod word;

pub use address::{Address, AddressError};
pub use error::PrimitiveError;
pub use hash::{HashError, H256};

// Re-export primitive-types for U256
pub use primitive_types::{U256, U512};

/// The EVM machine word
pub type Word = U256;

/// Gas type
pub type Gas = u64;

/// Transaction nonce type
pub type Nonce = u64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_wraps() {
        let (sum, overflow) = Word::MAX.overflowing_add(Word::one());
        assert!(overflow);
        assert_eq!(sum, Word::zero());
    }
}
