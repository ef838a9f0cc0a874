//! # keel-rlp
//!
//! RLP (Recursive Length Prefix) encoding/decoding for the Keel EVM.
//!
//! Transactions arrive RLP-encoded, and contract addresses and account
//! identifiers are derived by hashing RLP preimages, so the codec has to be
//! byte-exact with Ethereum.
//!
//! ## RLP Encoding Rules
//!
//! - Single byte `[0x00, 0x7f]`: itself
//! - Short string (0-55 bytes): `0x80 + len` + data
//! - Long string (>55 bytes): `0xb7 + len_of_len` + len + data
//! - Short list (0-55 bytes payload): `0xc0 + len` + items
//! - Long list (>55 bytes payload): `0xf7 + len_of_len` + len + items
//!
//! The decoder does not insist on canonical length prefixes: a long-form
//! prefix whose length would have fit the short form is accepted as is.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod decode;
mod encode;
mod error;
mod item;

pub use decode::{decode, decode_all, MAX_DEPTH};
pub use encode::{encode, encode_bytes, encode_list, encode_word, length_prefix};
pub use error::{RlpError, RlpResult};
pub use item::RlpItem;
