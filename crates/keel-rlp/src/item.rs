//! The RLP value tree

use bytes::Bytes;
use keel_primitives::{word, Address, PrimitiveError, Word};

use crate::error::{RlpError, RlpResult};

/// A decoded (or to-be-encoded) RLP value: a byte string or a list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RlpItem {
    /// Byte string
    String(Bytes),
    /// List of items
    List(Vec<RlpItem>),
}

impl RlpItem {
    /// The empty byte string (`0x80`)
    pub fn empty() -> Self {
        RlpItem::String(Bytes::new())
    }

    /// Byte string item copied from a slice
    pub fn bytes(data: &[u8]) -> Self {
        RlpItem::String(Bytes::copy_from_slice(data))
    }

    /// Scalar item: the word's minimal big-endian form (zero is empty)
    pub fn word(value: &Word) -> Self {
        RlpItem::String(Bytes::from(word::to_minimal_be(value)))
    }

    /// Scalar item from a `u64`
    pub fn uint(value: u64) -> Self {
        Self::word(&Word::from(value))
    }

    /// Whether this is a string item
    pub fn is_string(&self) -> bool {
        matches!(self, RlpItem::String(_))
    }

    /// Whether this is a list item
    pub fn is_list(&self) -> bool {
        matches!(self, RlpItem::List(_))
    }

    /// Payload of a string item
    pub fn as_bytes(&self) -> RlpResult<&Bytes> {
        match self {
            RlpItem::String(data) => Ok(data),
            RlpItem::List(_) => Err(RlpError::UnexpectedItem("string")),
        }
    }

    /// Children of a list item
    pub fn as_list(&self) -> RlpResult<&[RlpItem]> {
        match self {
            RlpItem::List(items) => Ok(items),
            RlpItem::String(_) => Err(RlpError::UnexpectedItem("list")),
        }
    }

    /// Interpret a string item as a big-endian scalar of at most 32 bytes.
    pub fn as_word(&self) -> RlpResult<Word> {
        let data = self.as_bytes()?;
        word::from_be_slice(data).map_err(|e| match e {
            PrimitiveError::WordOverflow(n) => RlpError::LengthOverflow(n),
            _ => RlpError::UnexpectedItem("scalar"),
        })
    }
}

impl From<&[u8]> for RlpItem {
    fn from(data: &[u8]) -> Self {
        RlpItem::bytes(data)
    }
}

impl From<Vec<u8>> for RlpItem {
    fn from(data: Vec<u8>) -> Self {
        RlpItem::String(Bytes::from(data))
    }
}

impl From<Bytes> for RlpItem {
    fn from(data: Bytes) -> Self {
        RlpItem::String(data)
    }
}

impl From<&Address> for RlpItem {
    fn from(address: &Address) -> Self {
        RlpItem::bytes(address.as_bytes())
    }
}

impl From<Vec<RlpItem>> for RlpItem {
    fn from(items: Vec<RlpItem>) -> Self {
        RlpItem::List(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_items() {
        assert_eq!(RlpItem::uint(0), RlpItem::empty());
        assert_eq!(RlpItem::uint(1024), RlpItem::bytes(&[0x04, 0x00]));
        assert_eq!(RlpItem::uint(1024).as_word().unwrap(), Word::from(1024u64));
    }

    #[test]
    fn test_kind_accessors() {
        let list = RlpItem::List(vec![RlpItem::empty()]);
        assert!(list.is_list());
        assert!(list.as_bytes().is_err());
        assert_eq!(list.as_list().unwrap().len(), 1);

        let s = RlpItem::bytes(b"dog");
        assert!(s.is_string());
        assert_eq!(s.as_list(), Err(RlpError::UnexpectedItem("list")));
    }

    #[test]
    fn test_oversized_scalar() {
        let item = RlpItem::from(vec![1u8; 33]);
        assert_eq!(item.as_word(), Err(RlpError::LengthOverflow(33)));
    }
}
