//! Error types for fixture runs

use keel_vm::VmError;
use thiserror::Error;

/// Fixture error type
#[derive(Error, Debug)]
pub enum FixtureError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Hex decoding error
    #[error("Hex error: {0}")]
    Hex(String),

    /// Expectation not met
    #[error("Assertion failed: {0}")]
    Assertion(String),

    /// Frame could not be started
    #[error("VM error: {0}")]
    Vm(#[from] VmError),
}

impl From<hex::FromHexError> for FixtureError {
    fn from(e: hex::FromHexError) -> Self {
        FixtureError::Hex(e.to_string())
    }
}

/// Fixture result type
pub type FixtureResult<T> = Result<T, FixtureError>;
