//! # keel-crypto
//!
//! Cryptographic facade for the Keel EVM.
//!
//! - Keccak-256 hashing (the only hash the interpreter needs)
//! - Composite storage keys for host persistence
//! - ECDSA (secp256k1) signing and signer recovery

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod hash;
mod signature;

pub use error::CryptoError;
pub use hash::{keccak256, keccak256_concat, storage_key, EMPTY_CODE_HASH};
pub use signature::{
    public_key_to_address, recover_public_key, recover_signer, sign, PrivateKey, PublicKey,
    Signature,
};
