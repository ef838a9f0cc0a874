//! Frame memory: byte-addressable, zero-filled, grow-only.
//!
//! Reads past the current length yield zero bytes. Writes grow the buffer to
//! fit and overwrite in place. Gas for growth is charged by the
//! [`Gasometer`](crate::Gasometer) before the interpreter touches memory, so
//! the auto-expansion here never runs unpaid during execution.

use keel_primitives::{word, Word};

/// EVM memory
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Memory {
    data: Vec<u8>,
}

impl Memory {
    /// Create new empty memory
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Current size in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether nothing has been touched yet
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Current size in 32-byte words, rounded up
    pub fn words(&self) -> usize {
        self.data.len().div_ceil(32)
    }

    /// Set the length to exactly `size`, zero-filling new bytes.
    pub fn resize(&mut self, size: usize) {
        self.data.resize(size, 0);
    }

    /// Grow to at least `size` bytes. A smaller `size` is a no-op.
    pub fn expand(&mut self, size: usize) {
        if size > self.data.len() {
            self.data.resize(size, 0);
        }
    }

    /// The 32-byte word at `offset`; bytes past the end read as zero.
    pub fn read(&self, offset: usize) -> Word {
        let mut out = [0u8; 32];
        self.copy_out(offset, &mut out);
        Word::from_big_endian(&out)
    }

    /// Store `value` as 32 big-endian bytes at `offset`.
    pub fn write(&mut self, offset: usize, value: &Word) {
        self.write_slice(offset, &word::to_be_bytes(value));
    }

    /// Store a single byte at `offset`.
    pub fn write_byte(&mut self, offset: usize, value: u8) {
        let Some(end) = offset.checked_add(1) else {
            return;
        };
        self.expand(end);
        self.data[offset] = value;
    }

    /// `size` bytes starting at `offset`, zero-padded past the end.
    ///
    /// Returns an empty vector when `size` is zero or `offset + size` overflows.
    pub fn read_slice(&self, offset: usize, size: usize) -> Vec<u8> {
        if size == 0 || offset.checked_add(size).is_none() {
            return Vec::new();
        }
        let mut out = vec![0u8; size];
        self.copy_out(offset, &mut out);
        out
    }

    /// Overwrite memory at `offset` with `data`, growing as needed.
    pub fn write_slice(&mut self, offset: usize, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        let Some(end) = offset.checked_add(data.len()) else {
            return;
        };
        self.expand(end);
        self.data[offset..end].copy_from_slice(data);
    }

    /// Copy `size` bytes of `source` starting at `src_offset` into memory at
    /// `dest`. The part of the range that lies past the end of `source` is
    /// written as zeros.
    pub fn copy_data(&mut self, dest: usize, src_offset: usize, size: usize, source: &[u8]) {
        if size == 0 {
            return;
        }
        let Some(end) = dest.checked_add(size) else {
            return;
        };
        self.expand(end);

        let target = &mut self.data[dest..end];
        let available = source.len().saturating_sub(src_offset).min(size);
        if available > 0 {
            target[..available].copy_from_slice(&source[src_offset..src_offset + available]);
        }
        target[available..].fill(0);
    }

    /// Raw contents
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    fn copy_out(&self, offset: usize, out: &mut [u8]) {
        if offset >= self.data.len() {
            return;
        }
        let end = offset.saturating_add(out.len()).min(self.data.len());
        out[..end - offset].copy_from_slice(&self.data[offset..end]);
    }
}
