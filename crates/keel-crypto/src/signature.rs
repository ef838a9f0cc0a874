//! ECDSA signature operations using secp256k1

use k256::ecdsa::{RecoveryId, Signature as K256Signature, SigningKey, VerifyingKey};
use keel_primitives::{Address, H256};

use crate::{keccak256, CryptoError};

/// Public key
pub type PublicKey = VerifyingKey;

/// Private key (32 bytes)
pub type PrivateKey = SigningKey;

/// Recoverable ECDSA signature.
///
/// `recovery_id` is the raw parity bit (0 or 1). Mapping Ethereum's `v`
/// (27/28, or the EIP-155 form) onto it is the transaction layer's job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    /// r component
    pub r: H256,
    /// s component
    pub s: H256,
    /// recovery id (0 or 1)
    pub recovery_id: u8,
}

impl Signature {
    /// Create signature from r, s and a raw recovery id
    pub fn new(r: H256, s: H256, recovery_id: u8) -> Self {
        Signature { r, s, recovery_id }
    }

    fn to_k256(&self) -> Result<(K256Signature, RecoveryId), CryptoError> {
        let r: k256::FieldBytes = (*self.r.as_bytes()).into();
        let s: k256::FieldBytes = (*self.s.as_bytes()).into();
        let signature = K256Signature::from_scalars(r, s)
            .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;
        let recovery_id = RecoveryId::try_from(self.recovery_id)
            .map_err(|_| CryptoError::InvalidRecoveryId(self.recovery_id))?;
        Ok((signature, recovery_id))
    }
}

/// Sign a message hash, normalizing to low-s.
pub fn sign(message_hash: &H256, private_key: &PrivateKey) -> Result<Signature, CryptoError> {
    let (signature, recovery_id) = private_key
        .sign_prehash_recoverable(message_hash.as_bytes())
        .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;

    let (signature, recovery_id) = match signature.normalize_s() {
        Some(normalized) => (
            normalized,
            RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced()),
        ),
        None => (signature, recovery_id),
    };

    let r: [u8; 32] = signature.r().to_bytes().into();
    let s: [u8; 32] = signature.s().to_bytes().into();
    Ok(Signature::new(
        H256::from_bytes(r),
        H256::from_bytes(s),
        recovery_id.to_byte(),
    ))
}

/// Recover public key from signature and message hash
pub fn recover_public_key(
    message_hash: &H256,
    signature: &Signature,
) -> Result<PublicKey, CryptoError> {
    let (k256_sig, recovery_id) = signature.to_k256()?;
    VerifyingKey::recover_from_prehash(message_hash.as_bytes(), &k256_sig, recovery_id)
        .map_err(|e| CryptoError::RecoveryFailed(e.to_string()))
}

/// Derive Ethereum address from public key
pub fn public_key_to_address(public_key: &PublicKey) -> Address {
    // 0x04 || x || y
    let encoded = public_key.to_encoded_point(false);
    let hash = keccak256(&encoded.as_bytes()[1..]);
    Address::from_low_bytes(hash.as_bytes())
}

/// Recover the address that produced `signature` over `message_hash`.
pub fn recover_signer(message_hash: &H256, signature: &Signature) -> Result<Address, CryptoError> {
    recover_public_key(message_hash, signature).map(|key| public_key_to_address(&key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn test_sign_and_recover() {
        let private_key = SigningKey::random(&mut OsRng);
        let expected = public_key_to_address(private_key.verifying_key());
        let hash = keccak256(b"settle this");

        let signature = sign(&hash, &private_key).unwrap();
        assert!(signature.recovery_id <= 1);
        assert_eq!(recover_signer(&hash, &signature).unwrap(), expected);
    }

    #[test]
    fn test_recover_with_wrong_hash_gives_other_address() {
        let private_key = SigningKey::random(&mut OsRng);
        let expected = public_key_to_address(private_key.verifying_key());
        let signature = sign(&keccak256(b"one"), &private_key).unwrap();

        let recovered = recover_signer(&keccak256(b"two"), &signature);
        assert!(recovered.map(|a| a != expected).unwrap_or(true));
    }

    #[test]
    fn test_known_key_address() {
        // private key 1 maps to the generator point
        let mut key = [0u8; 32];
        key[31] = 1;
        let private_key = SigningKey::from_bytes(&key.into()).unwrap();
        assert_eq!(
            public_key_to_address(private_key.verifying_key()).to_hex(),
            "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
    }

    #[test]
    fn test_invalid_components() {
        let signature = Signature::new(H256::ZERO, H256::ZERO, 0);
        assert!(matches!(
            recover_signer(&keccak256(b"x"), &signature),
            Err(CryptoError::InvalidSignature(_))
        ));

        let signature = Signature::new(keccak256(b"r"), keccak256(b"s"), 7);
        assert!(matches!(
            recover_signer(&keccak256(b"x"), &signature),
            Err(CryptoError::InvalidRecoveryId(7))
        ));
    }
}
