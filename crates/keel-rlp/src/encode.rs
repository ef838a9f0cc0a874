//! RLP encoder, the exact inverse of [`decode`](crate::decode).

use bytes::{BufMut, Bytes, BytesMut};
use keel_primitives::{word, Word};

use crate::item::RlpItem;

const STRING_OFFSET: u8 = 0x80;
const LIST_OFFSET: u8 = 0xc0;
const SHORT_LIMIT: usize = 55;

/// Encode an item tree.
pub fn encode(item: &RlpItem) -> Bytes {
    let mut out = BytesMut::with_capacity(encoded_len(item));
    append(item, &mut out);
    out.freeze()
}

/// Encode a single byte string.
pub fn encode_bytes(data: &[u8]) -> Bytes {
    let mut out = BytesMut::with_capacity(data.len() + 9);
    append_bytes(data, &mut out);
    out.freeze()
}

/// Encode a list of items.
pub fn encode_list(items: &[RlpItem]) -> Bytes {
    let payload_len: usize = items.iter().map(encoded_len).sum();
    let mut out = BytesMut::with_capacity(payload_len + 9);
    out.put_slice(&length_prefix(payload_len, LIST_OFFSET));
    for item in items {
        append(item, &mut out);
    }
    out.freeze()
}

/// Encode a word as a scalar (minimal big-endian, zero is `0x80`).
pub fn encode_word(value: &Word) -> Bytes {
    encode_bytes(&word::to_minimal_be(value))
}

/// Length prefix for a payload of `len` bytes, with `offset` 0x80 (string) or 0xc0 (list).
pub fn length_prefix(len: usize, offset: u8) -> Vec<u8> {
    if len <= SHORT_LIMIT {
        vec![offset + len as u8]
    } else {
        let len_bytes = (len as u64).to_be_bytes();
        let skip = len_bytes.iter().take_while(|b| **b == 0).count();
        let mut prefix = Vec::with_capacity(9);
        prefix.push(offset + SHORT_LIMIT as u8 + (8 - skip) as u8);
        prefix.extend_from_slice(&len_bytes[skip..]);
        prefix
    }
}

fn append(item: &RlpItem, out: &mut BytesMut) {
    match item {
        RlpItem::String(data) => append_bytes(data, out),
        RlpItem::List(items) => {
            let payload_len: usize = items.iter().map(encoded_len).sum();
            out.put_slice(&length_prefix(payload_len, LIST_OFFSET));
            for child in items {
                append(child, out);
            }
        }
    }
}

fn append_bytes(data: &[u8], out: &mut BytesMut) {
    if data.len() == 1 && data[0] < STRING_OFFSET {
        out.put_u8(data[0]);
    } else {
        out.put_slice(&length_prefix(data.len(), STRING_OFFSET));
        out.put_slice(data);
    }
}

fn prefix_len(payload_len: usize) -> usize {
    if payload_len <= SHORT_LIMIT {
        1
    } else {
        1 + 8 - (payload_len as u64).leading_zeros() as usize / 8
    }
}

fn encoded_len(item: &RlpItem) -> usize {
    match item {
        RlpItem::String(data) if data.len() == 1 && data[0] < STRING_OFFSET => 1,
        RlpItem::String(data) => prefix_len(data.len()) + data.len(),
        RlpItem::List(items) => {
            let payload: usize = items.iter().map(encoded_len).sum();
            prefix_len(payload) + payload
        }
    }
}
