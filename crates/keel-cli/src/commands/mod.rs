//! CLI command implementations

pub mod address;
pub mod fixtures;
pub mod rlp;
pub mod run;
pub mod tx;

use bytes::Bytes;
use keel_primitives::{hex, Address, Word};

use crate::error::CliError;

/// Hex bytes, `0x` optional
pub(crate) fn parse_bytes(s: &str) -> Result<Bytes, CliError> {
    Ok(Bytes::from(hex::decode(s)?))
}

/// 20-byte hex address
pub(crate) fn parse_address(s: &str) -> Result<Address, CliError> {
    Ok(Address::from_hex(s.trim())?)
}

/// Decimal, or hex with a `0x` prefix
pub(crate) fn parse_word(s: &str) -> Result<Word, CliError> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x") {
        Some(digits) => Word::from_str_radix(digits, 16).ok(),
        None => Word::from_dec_str(s).ok(),
    };
    parsed.ok_or_else(|| CliError::InvalidInput(format!("not a 256-bit number: {}", s)))
}
