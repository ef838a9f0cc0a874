//! CLI error types

use keel_primitives::{AddressError, PrimitiveError};
use keel_rlp::RlpError;
use keel_types::TypeError;
use keel_vm::VmError;
use keel_vm_tests::FixtureError;
use thiserror::Error;

/// CLI error type
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid address format
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Invalid private key
    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    /// Invalid hex string
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Transaction could not be parsed or signed
    #[error("Transaction error: {0}")]
    Transaction(#[from] TypeError),

    /// Malformed RLP
    #[error("RLP error: {0}")]
    Rlp(#[from] RlpError),

    /// Frame could not start
    #[error("VM error: {0}")]
    Vm(#[from] VmError),

    /// Fixture directory could not be run
    #[error("Fixture error: {0}")]
    Fixture(#[from] FixtureError),

    /// Some fixtures did not pass
    #[error("{0} fixture(s) failed")]
    FixturesFailed(usize),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Config error
    #[error("Config error: {0}")]
    Config(String),
}

impl From<PrimitiveError> for CliError {
    fn from(e: PrimitiveError) -> Self {
        CliError::InvalidHex(e.to_string())
    }
}

impl From<AddressError> for CliError {
    fn from(e: AddressError) -> Self {
        CliError::InvalidAddress(e.to_string())
    }
}
