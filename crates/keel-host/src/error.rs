//! Host error types
//!
//! Every variant is a hard rejection: nothing from the transaction reaches the
//! ledger. The `Display` strings of the validation and execution variants are
//! the messages the ledger reports to the submitting account.

use bytes::Bytes;
use keel_primitives::H256;
use keel_types::TypeError;
use keel_vm::{TrapKind, VmError};
use thiserror::Error;

/// Transaction submission errors
#[derive(Debug, Error)]
pub enum HostError {
    /// Raw transaction could not be decoded
    #[error("invalid transaction: {0}")]
    InvalidTransaction(#[from] TypeError),

    /// Signed transaction whose recovered signer has no linked account
    #[error("The account identifier associated with this transaction does not exist.")]
    UnknownSigner,

    /// Unsigned transaction whose claimed sender has no linked account
    #[error("Could not find sender, did you provide the correct account identifier?")]
    UnknownSender,

    /// Transaction nonce is not exactly one past the stored nonce
    #[error("Transaction nonce invalid.")]
    InvalidNonce {
        /// Stored account nonce
        stored: u64,
        /// Nonce carried by the transaction
        got: u64,
    },

    /// Unsigned transaction submitted by someone other than the account owner
    #[error("You do not have permission to execute a transaction for the specified sender.")]
    Unauthorized,

    /// Account name already linked
    #[error("An Ethereum account already exists for this user.")]
    AccountExists,

    /// Signature could not be turned into a signer
    #[error("sender recovery failed: {0}")]
    SenderRecovery(String),

    /// EIP-155 chain id differs from the configured chain
    #[error("chain id mismatch: expected {expected}, got {got}")]
    ChainIdMismatch {
        /// Configured chain id
        expected: u64,
        /// Chain id carried by the signature
        got: u64,
    },

    /// Gas limit below the intrinsic cost
    #[error("insufficient gas: required {required}, available {available}")]
    InsufficientGas {
        /// Intrinsic gas
        required: u64,
        /// Transaction gas limit
        available: u64,
    },

    /// Gas limit above the block gas limit
    #[error("block gas limit exceeded: {used} > {limit}")]
    BlockGasLimitExceeded {
        /// Transaction gas limit
        used: u64,
        /// Configured block gas limit
        limit: u64,
    },

    /// Explicit bytecode execution is disabled
    #[error("execute is only available during development.")]
    RawCodeDisabled,

    /// Top frame reverted
    #[error("MESSAGE_CALL_REVERTED")]
    Reverted {
        /// Hash of the rejected transaction
        tx_hash: H256,
        /// Revert payload
        output: Bytes,
    },

    /// Top frame ran out of gas
    #[error("MESSAGE_CALL_OUT_OF_GAS")]
    OutOfGas {
        /// Hash of the rejected transaction
        tx_hash: H256,
    },

    /// Top frame trapped
    #[error("{kind}")]
    Trap {
        /// Hash of the rejected transaction
        tx_hash: H256,
        /// Trap that ended the frame
        kind: TrapKind,
    },

    /// Frame could not be started
    #[error("VM error: {0}")]
    Vm(#[from] VmError),
}

/// Result type for host operations
pub type HostResult<T> = Result<T, HostError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_messages() {
        assert_eq!(
            HostError::InvalidNonce { stored: 1, got: 5 }.to_string(),
            "Transaction nonce invalid."
        );
        assert_eq!(
            HostError::Reverted {
                tx_hash: H256::ZERO,
                output: Bytes::new()
            }
            .to_string(),
            "MESSAGE_CALL_REVERTED"
        );
        assert_eq!(
            HostError::Trap {
                tx_hash: H256::ZERO,
                kind: TrapKind::InsufficientFunds
            }
            .to_string(),
            "MESSAGE_CALL_FAILED [Insufficient funds.]"
        );
    }
}
