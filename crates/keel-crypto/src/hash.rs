//! Keccak-256 hashing

use keel_primitives::{word, Address, Word, H256};
use sha3::{Digest, Keccak256};

/// keccak256 of the empty byte string, the code hash of an account with no code
pub const EMPTY_CODE_HASH: H256 = H256::from_bytes([
    0xc5, 0xd2, 0x46, 0x01, 0x86, 0xf7, 0x23, 0x3c, 0x92, 0x7e, 0x7d, 0xb2, 0xdc, 0xc7, 0x03, 0xc0,
    0xe5, 0x00, 0xb6, 0x53, 0xca, 0x82, 0x27, 0x3b, 0x7b, 0xfa, 0xd8, 0x04, 0x5d, 0x85, 0xa4, 0x70,
]);

/// Compute Keccak-256 hash of the input data
pub fn keccak256(data: &[u8]) -> H256 {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    H256::from_bytes(hasher.finalize().into())
}

/// Keccak-256 over the concatenation of several byte strings.
pub fn keccak256_concat(parts: &[&[u8]]) -> H256 {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    H256::from_bytes(hasher.finalize().into())
}

/// Host-side key of a contract storage slot.
///
/// Both the contract address and the slot key are widened to 32-byte
/// words before hashing, so the preimage is always 64 bytes.
pub fn storage_key(contract: &Address, key: &Word) -> H256 {
    let address_word = word::to_be_bytes(&contract.to_word());
    let key_word = word::to_be_bytes(key);
    keccak256_concat(&[&address_word[..], &key_word[..]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keccak256_empty() {
        let hash = keccak256(&[]);
        assert_eq!(
            hash.to_hex(),
            "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
        assert_eq!(hash, EMPTY_CODE_HASH);
    }

    #[test]
    fn test_keccak256_hello() {
        assert_eq!(
            keccak256(b"hello").to_hex(),
            "0x1c8aff950685c2ed4bc3174f3472287b56d9517b9c948127319a09a7a36deac8"
        );
    }

    #[test]
    fn test_keccak256_32_zero_bytes() {
        assert_eq!(
            keccak256(&[0u8; 32]).to_hex(),
            "0x290decd9548b62a8d60345a988386fc84ba6bc95484008f6362f93160ef3e563"
        );
    }

    #[test]
    fn test_concat_matches_single_buffer() {
        let joined = keccak256(b"The quick brown fox jumps over the lazy dog");
        let parts = keccak256_concat(&[
            &b"The quick brown "[..],
            &b"fox jumps over "[..],
            &b"the lazy dog"[..],
        ]);
        assert_eq!(joined, parts);
        assert_eq!(
            joined.to_hex(),
            "0x4d741b6f1eb29cb2a9b9911c82f56fa8d73b04959d3d9d222895df6c0b28aa15"
        );
    }

    #[test]
    fn test_storage_key_is_word_pair_hash() {
        // keccak256 of 64 zero bytes
        assert_eq!(
            storage_key(&Address::ZERO, &Word::zero()).to_hex(),
            "0xad3228b676f7d3cd4284a5443f17f1962b36e491b30a40b2405849e597ba5fb5"
        );

        let contract = Address::from_bytes([0x11; 20]);
        assert_ne!(
            storage_key(&contract, &Word::zero()),
            storage_key(&contract, &Word::one())
        );
    }
}
