//! Ethereum-compatible address type (20 bytes)

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::word;
use crate::Word;

/// Address parsing error
#[derive(Debug, Error)]
pub enum AddressError {
    /// Invalid hex string
    #[error("invalid hex string: {0}")]
    InvalidHex(String),
    /// Invalid length
    #[error("invalid address length: expected 20 bytes, got {0}")]
    InvalidLength(usize),
}

/// Ethereum-compatible 20-byte address
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Address([u8; 20]);

impl Address {
    /// Size of address in bytes
    pub const LEN: usize = 20;

    /// Zero address (0x0000...0000)
    pub const ZERO: Address = Address([0u8; 20]);

    /// Create address from bytes
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }

    /// Create address from slice
    pub fn from_slice(slice: &[u8]) -> Result<Self, AddressError> {
        if slice.len() != Self::LEN {
            return Err(AddressError::InvalidLength(slice.len()));
        }
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(slice);
        Ok(Address(bytes))
    }

    /// Take the low-order 20 bytes of a longer digest (e.g. a keccak hash).
    pub fn from_low_bytes(bytes: &[u8]) -> Self {
        let mut out = [0u8; 20];
        let take = bytes.len().min(Self::LEN);
        out[Self::LEN - take..].copy_from_slice(&bytes[bytes.len() - take..]);
        Address(out)
    }

    /// Parse address from hex string (with or without 0x prefix)
    pub fn from_hex(s: &str) -> Result<Self, AddressError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = ::hex::decode(s).map_err(|e| AddressError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    /// Interpret the low 160 bits of a machine word as an address.
    pub fn from_word(value: &Word) -> Self {
        Self::from_low_bytes(&word::to_be_bytes(value))
    }

    /// Left-pad the address into a machine word.
    pub fn to_word(&self) -> Word {
        Word::from_big_endian(&self.0)
    }

    /// Get as byte slice
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Check if this is the zero address
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Convert to hex string with 0x prefix
    pub fn to_hex(&self) -> String {
        format!("0x{}", ::hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(feature = "serde")]
mod serde_impl {
    use super::Address;
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    impl Serialize for Address {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_str(&self.to_hex())
        }
    }

    impl<'de> Deserialize<'de> for Address {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let s = String::deserialize(deserializer)?;
            Address::from_hex(&s).map_err(de::Error::custom)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_from_hex() {
        let addr = Address::from_hex("0x742d35Cc6634C0532925a3b844Bc9e7595f0aB3d").unwrap();
        assert!(!addr.is_zero());

        let addr2: Address = "742d35Cc6634C0532925a3b844Bc9e7595f0aB3d".parse().unwrap();
        assert_eq!(addr, addr2);
    }

    #[test]
    fn test_address_display() {
        let addr = Address::from_hex("0x742d35Cc6634C0532925a3b844Bc9e7595f0aB3d").unwrap();
        assert_eq!(
            format!("{}", addr),
            "0x742d35cc6634c0532925a3b844bc9e7595f0ab3d"
        );
        assert_eq!(
            format!("{:?}", addr),
            "Address(0x742d35cc6634c0532925a3b844bc9e7595f0ab3d)"
        );
    }

    #[test]
    fn test_address_length_errors() {
        assert!(matches!(
            Address::from_hex("0x"),
            Err(AddressError::InvalidLength(0))
        ));
        assert!(matches!(
            Address::from_hex("0x742d35Cc6634C0532925a3b844Bc9e7595f0aB"),
            Err(AddressError::InvalidLength(19))
        ));
        assert!(matches!(
            Address::from_slice(&[0u8; 21]),
            Err(AddressError::InvalidLength(21))
        ));
        assert!(matches!(
            Address::from_hex("0x742d35Cc6634C0532925a3b844Bc9e7595f0aGGG"),
            Err(AddressError::InvalidHex(_))
        ));
    }

    #[test]
    fn test_address_word_roundtrip() {
        let addr = Address::from_hex("0x0000000000000000000000000000000000ea0e9a").unwrap();
        let w = addr.to_word();
        assert_eq!(w, Word::from(0xea0e9au64));
        assert_eq!(Address::from_word(&w), addr);
    }

    #[test]
    fn test_from_word_drops_high_bits() {
        let w = Word::MAX;
        assert_eq!(Address::from_word(&w), Address::from_bytes([0xff; 20]));
    }

    #[test]
    fn test_from_low_bytes() {
        let digest = [0x11u8; 32];
        assert_eq!(Address::from_low_bytes(&digest), Address::from_bytes([0x11; 20]));

        let short = Address::from_low_bytes(&[0xab, 0xcd]);
        assert_eq!(short.as_bytes()[18..], [0xab, 0xcd]);
        assert!(short.as_bytes()[..18].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_address_ordering_and_default() {
        assert_eq!(Address::default(), Address::ZERO);
        assert!(Address::ZERO < Address::from_bytes([1; 20]));
    }
}
