//! Big-endian codecs between machine words and byte sequences.
//!
//! A word converts to and from 1–32 big-endian bytes exactly, with no sign.
//! The signed helpers interpret a word as a 256-bit two's-complement integer.

use crate::error::PrimitiveError;
use crate::Word;

/// Size of a word in bytes
pub const WORD_BYTES: usize = 32;

/// Build a word from up to 32 big-endian bytes.
pub fn from_be_slice(bytes: &[u8]) -> Result<Word, PrimitiveError> {
    if bytes.len() > WORD_BYTES {
        return Err(PrimitiveError::WordOverflow(bytes.len()));
    }
    Ok(Word::from_big_endian(bytes))
}

/// Build a word from big-endian bytes, keeping only the low-order 32 bytes.
pub fn from_be_slice_truncating(bytes: &[u8]) -> Word {
    let start = bytes.len().saturating_sub(WORD_BYTES);
    Word::from_big_endian(&bytes[start..])
}

/// Full 32-byte big-endian representation.
pub fn to_be_bytes(word: &Word) -> [u8; 32] {
    let mut out = [0u8; 32];
    word.to_big_endian(&mut out);
    out
}

/// Big-endian representation without leading zero bytes.
///
/// Zero encodes as the empty sequence, which is what RLP expects for scalars.
pub fn to_minimal_be(word: &Word) -> Vec<u8> {
    let bytes = to_be_bytes(word);
    let skip = bytes.iter().take_while(|b| **b == 0).count();
    bytes[skip..].to_vec()
}

/// Narrow a word to `u64`, or `None` if it does not fit.
pub fn to_u64(word: &Word) -> Option<u64> {
    if word.bits() > 64 {
        None
    } else {
        Some(word.low_u64())
    }
}

/// Narrow a word to `usize`, or `None` if it does not fit.
pub fn to_usize(word: &Word) -> Option<usize> {
    to_u64(word).and_then(|v| usize::try_from(v).ok())
}

/// Narrow a word to `u64`, clamping at `u64::MAX`.
pub fn saturating_u64(word: &Word) -> u64 {
    to_u64(word).unwrap_or(u64::MAX)
}

/// Whether the two's-complement sign bit is set.
pub fn is_negative(word: &Word) -> bool {
    word.bit(255)
}

/// Two's-complement negation (`!w + 1`, wrapping).
pub fn negate(word: Word) -> Word {
    (!word).overflowing_add(Word::one()).0
}

/// Magnitude of a two's-complement word, together with its sign.
pub fn to_sign_magnitude(word: Word) -> (bool, Word) {
    if is_negative(&word) {
        (true, negate(word))
    } else {
        (false, word)
    }
}

/// Rebuild a two's-complement word from sign and magnitude.
pub fn from_sign_magnitude(negative: bool, magnitude: Word) -> Word {
    if negative {
        negate(magnitude)
    } else {
        magnitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_from_be_slice() {
        assert_eq!(from_be_slice(&[]).unwrap(), Word::zero());
        assert_eq!(from_be_slice(&[0x01, 0x00]).unwrap(), Word::from(256u64));
        assert!(matches!(
            from_be_slice(&[0u8; 33]),
            Err(PrimitiveError::WordOverflow(33))
        ));
    }

    #[test]
    fn test_from_be_slice_truncating() {
        let mut bytes = vec![0xaa];
        bytes.extend_from_slice(&[0u8; 31]);
        bytes.push(0x07);
        assert_eq!(from_be_slice_truncating(&bytes), Word::from(7u64));
    }

    #[test]
    fn test_minimal_be() {
        assert!(to_minimal_be(&Word::zero()).is_empty());
        assert_eq!(to_minimal_be(&Word::from(0x0400u64)), vec![0x04, 0x00]);
        assert_eq!(to_minimal_be(&Word::MAX).len(), 32);
    }

    #[test]
    fn test_narrowing() {
        assert_eq!(to_u64(&Word::from(u64::MAX)), Some(u64::MAX));
        assert_eq!(to_u64(&(Word::from(u64::MAX) + 1)), None);
        assert_eq!(saturating_u64(&Word::MAX), u64::MAX);
        assert_eq!(to_usize(&Word::from(42u64)), Some(42));
    }

    #[test]
    fn test_sign_helpers() {
        let minus_one = Word::MAX;
        assert!(is_negative(&minus_one));
        assert_eq!(negate(minus_one), Word::one());
        assert_eq!(to_sign_magnitude(minus_one), (true, Word::one()));
        assert_eq!(from_sign_magnitude(true, Word::from(2u64)), Word::MAX - 1);
        assert_eq!(negate(Word::zero()), Word::zero());
    }

    proptest! {
        #[test]
        fn prop_be_bytes_roundtrip(bytes in proptest::collection::vec(any::<u8>(), 0..=32)) {
            let word = from_be_slice(&bytes).unwrap();
            let minimal = to_minimal_be(&word);
            let skip = bytes.iter().take_while(|b| **b == 0).count();
            prop_assert_eq!(&minimal[..], &bytes[skip..]);
        }
    }
}
