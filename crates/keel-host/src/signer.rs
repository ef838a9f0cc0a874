//! Signer resolution for signed transactions

use keel_primitives::Address;
use keel_types::Transaction;

use crate::error::{HostError, HostResult};

/// Turns a signed transaction into the address that signed it
pub trait SignerResolver {
    /// Address whose key produced the transaction's signature
    fn resolve(&self, tx: &Transaction) -> HostResult<Address>;
}

/// secp256k1 public key recovery over the transaction's signing hash
#[derive(Debug, Default, Clone, Copy)]
pub struct EcdsaRecovery;

impl SignerResolver for EcdsaRecovery {
    fn resolve(&self, tx: &Transaction) -> HostResult<Address> {
        tx.recover_sender()
            .map_err(|e| HostError::SenderRecovery(e.to_string()))
    }
}
