//! Recursive-descent RLP decoder.
//!
//! Every item is classified by its first byte alone; lists recurse into
//! their payload range.

use crate::error::{RlpError, RlpResult};
use crate::item::RlpItem;

/// Deepest list nesting the decoder accepts
pub const MAX_DEPTH: usize = 1024;

/// Decode exactly one item; trailing bytes are an error.
pub fn decode(data: &[u8]) -> RlpResult<RlpItem> {
    let (item, consumed) = decode_item(data, 0, 0)?;
    if consumed != data.len() {
        return Err(RlpError::TrailingBytes(data.len() - consumed));
    }
    Ok(item)
}

/// Decode a back-to-back sequence of items. Empty input yields no items.
pub fn decode_all(data: &[u8]) -> RlpResult<Vec<RlpItem>> {
    decode_sequence(data, 0, 0)
}

fn decode_sequence(data: &[u8], offset: usize, depth: usize) -> RlpResult<Vec<RlpItem>> {
    let mut items = Vec::new();
    let mut pos = 0;
    while pos < data.len() {
        let (item, used) = decode_item(&data[pos..], offset + pos, depth)?;
        items.push(item);
        pos += used;
    }
    Ok(items)
}

/// Decode the item at the start of `data`, returning it with the number of bytes consumed.
fn decode_item(data: &[u8], offset: usize, depth: usize) -> RlpResult<(RlpItem, usize)> {
    let prefix = *data.first().ok_or(RlpError::Empty)?;
    match prefix {
        0x00..=0x7f => Ok((RlpItem::bytes(&data[..1]), 1)),
        0x80..=0xb7 => {
            let len = (prefix - 0x80) as usize;
            let payload = take(data, 1, len, offset)?;
            Ok((RlpItem::bytes(payload), 1 + len))
        }
        0xb8..=0xbf => {
            let len_of_len = (prefix - 0xb7) as usize;
            let len = read_length(data, len_of_len, offset)?;
            let payload = take(data, 1 + len_of_len, len, offset)?;
            Ok((RlpItem::bytes(payload), 1 + len_of_len + len))
        }
        0xc0..=0xf7 => {
            let len = (prefix - 0xc0) as usize;
            let payload = take(data, 1, len, offset)?;
            let items = decode_list_payload(payload, offset + 1, depth)?;
            Ok((RlpItem::List(items), 1 + len))
        }
        0xf8..=0xff => {
            let len_of_len = (prefix - 0xf7) as usize;
            let len = read_length(data, len_of_len, offset)?;
            let payload = take(data, 1 + len_of_len, len, offset)?;
            let items = decode_list_payload(payload, offset + 1 + len_of_len, depth)?;
            Ok((RlpItem::List(items), 1 + len_of_len + len))
        }
    }
}

fn decode_list_payload(payload: &[u8], offset: usize, depth: usize) -> RlpResult<Vec<RlpItem>> {
    if depth >= MAX_DEPTH {
        return Err(RlpError::TooDeep(MAX_DEPTH));
    }
    decode_sequence(payload, offset, depth + 1)
}

/// Read the big-endian length that follows a long-form prefix.
fn read_length(data: &[u8], len_of_len: usize, offset: usize) -> RlpResult<usize> {
    let bytes = take(data, 1, len_of_len, offset)?;
    if len_of_len > std::mem::size_of::<usize>() {
        return Err(RlpError::LengthOverflow(len_of_len));
    }
    Ok(bytes.iter().fold(0usize, |acc, b| (acc << 8) | *b as usize))
}

fn take(data: &[u8], start: usize, len: usize, offset: usize) -> RlpResult<&[u8]> {
    let available = data.len().saturating_sub(start);
    match start.checked_add(len) {
        Some(end) if end <= data.len() => Ok(&data[start..end]),
        Some(_) => Err(RlpError::InputTooShort {
            offset,
            needed: len,
            available,
        }),
        None => Err(RlpError::LengthOverflow(len)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_single_bytes() {
        assert_eq!(decode(&[0x00]).unwrap(), RlpItem::bytes(&[0x00]));
        assert_eq!(decode(&[0x7f]).unwrap(), RlpItem::bytes(&[0x7f]));
        assert_eq!(decode(&[0x80]).unwrap(), RlpItem::empty());
    }

    #[test]
    fn test_decode_short_string() {
        assert_eq!(
            decode(&[0x83, b'd', b'o', b'g']).unwrap(),
            RlpItem::bytes(b"dog")
        );
    }

    #[test]
    fn test_decode_long_string() {
        let mut data = vec![0xb8, 56];
        data.extend_from_slice(&[0xaa; 56]);
        assert_eq!(decode(&data).unwrap(), RlpItem::bytes(&[0xaa; 56]));

        let mut data = vec![0xb9, 0x04, 0x00];
        data.extend_from_slice(&[0x01; 1024]);
        assert_eq!(decode(&data).unwrap().as_bytes().unwrap().len(), 1024);
    }

    #[test]
    fn test_decode_lists() {
        assert_eq!(decode(&[0xc0]).unwrap(), RlpItem::List(vec![]));

        let cat_dog = [0xc8, 0x83, b'c', b'a', b't', 0x83, b'd', b'o', b'g'];
        assert_eq!(
            decode(&cat_dog).unwrap(),
            RlpItem::List(vec![RlpItem::bytes(b"cat"), RlpItem::bytes(b"dog")])
        );

        // set-theoretic representation of three: [ [], [[]], [ [], [[]] ] ]
        let three = [0xc7, 0xc0, 0xc1, 0xc0, 0xc3, 0xc0, 0xc1, 0xc0];
        let empty = RlpItem::List(vec![]);
        let one = RlpItem::List(vec![empty.clone()]);
        assert_eq!(
            decode(&three).unwrap(),
            RlpItem::List(vec![
                empty.clone(),
                one.clone(),
                RlpItem::List(vec![empty, one]),
            ])
        );
    }

    #[test]
    fn test_decode_long_list() {
        let mut data = vec![0xf8, 60];
        for _ in 0..20 {
            data.extend_from_slice(&[0x82, 0x01, 0x02]);
        }
        let item = decode(&data).unwrap();
        assert_eq!(item.as_list().unwrap().len(), 20);
    }

    #[test]
    fn test_non_canonical_lengths_are_accepted() {
        // "dog" announced with a long-form prefix
        let data = [0xb8, 0x03, b'd', b'o', b'g'];
        assert_eq!(decode(&data).unwrap(), RlpItem::bytes(b"dog"));

        // single byte wrapped in a short-string prefix
        assert_eq!(decode(&[0x81, 0x05]).unwrap(), RlpItem::bytes(&[0x05]));
    }

    #[test]
    fn test_decode_truncated() {
        let invalid = [0xb7, 0x01, 0x02, 0x03];
        assert!(matches!(
            decode(&invalid),
            Err(RlpError::InputTooShort { offset: 0, needed: 55, available: 3 })
        ));

        let truncated_list = [0xc5, 0x83, b'c', b'a'];
        assert!(matches!(
            decode(&truncated_list),
            Err(RlpError::InputTooShort { .. })
        ));

        // inner item overruns its list payload
        let bad_inner = [0xc2, 0x83, b'c'];
        assert!(matches!(
            decode(&bad_inner),
            Err(RlpError::InputTooShort { offset: 1, .. })
        ));
    }

    #[test]
    fn test_decode_empty_and_trailing() {
        assert_eq!(decode(&[]), Err(RlpError::Empty));
        assert_eq!(decode(&[0x01, 0x02]), Err(RlpError::TrailingBytes(1)));
    }

    #[test]
    fn test_decode_all_sequence() {
        let items = decode_all(&[0x01, 0x83, b'd', b'o', b'g', 0xc0]).unwrap();
        assert_eq!(
            items,
            vec![
                RlpItem::bytes(&[0x01]),
                RlpItem::bytes(b"dog"),
                RlpItem::List(vec![]),
            ]
        );
        assert!(decode_all(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_decode_huge_length_of_length() {
        let data = [0xbf, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff];
        assert!(decode(&data).is_err());
    }

    #[test]
    fn test_nesting_limit() {
        let mut data = vec![0xc0];
        for _ in 0..(MAX_DEPTH + 1) {
            let len = data.len();
            let mut wrapped = if len < 56 {
                vec![0xc0 + len as u8]
            } else {
                let len_bytes = (len as u64).to_be_bytes();
                let skip = len_bytes.iter().take_while(|b| **b == 0).count();
                let mut prefix = vec![0xf7 + (8 - skip) as u8];
                prefix.extend_from_slice(&len_bytes[skip..]);
                prefix
            };
            wrapped.extend_from_slice(&data);
            data = wrapped;
        }
        assert_eq!(decode(&data), Err(RlpError::TooDeep(MAX_DEPTH)));
    }
}
