//! Frame outcomes

use std::fmt;

use bytes::Bytes;

use crate::error::TrapKind;
use crate::pending::PendingState;

/// How a frame ended
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExecResult {
    /// STOP, SELFDESTRUCT, or the end of the code
    Stopped {
        /// Gas not consumed
        gas_left: u64,
    },
    /// RETURN
    Done {
        /// Returned bytes
        data: Bytes,
        /// Gas not consumed
        gas_left: u64,
    },
    /// REVERT; writes are discarded, unused gas is not
    Reverted {
        /// Revert payload
        data: Bytes,
        /// Gas not consumed
        gas_left: u64,
    },
    /// Gas exhausted; all frame gas is consumed
    OutOfGas,
    /// Fatal trap; all frame gas is consumed
    Trap(TrapKind),
}

impl ExecResult {
    /// Gas handed back to the caller
    pub fn gas_left(&self) -> u64 {
        match self {
            ExecResult::Stopped { gas_left }
            | ExecResult::Done { gas_left, .. }
            | ExecResult::Reverted { gas_left, .. } => *gas_left,
            ExecResult::OutOfGas | ExecResult::Trap(_) => 0,
        }
    }

    /// Whether the frame's writes are kept
    pub fn is_success(&self) -> bool {
        matches!(self, ExecResult::Stopped { .. } | ExecResult::Done { .. })
    }

    /// RETURN or REVERT payload; empty otherwise
    pub fn output(&self) -> Bytes {
        match self {
            ExecResult::Done { data, .. } | ExecResult::Reverted { data, .. } => data.clone(),
            _ => Bytes::new(),
        }
    }
}

/// `success`, `reverted`, `out_of_gas`, or the trap's reporting string
impl fmt::Display for ExecResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecResult::Stopped { .. } | ExecResult::Done { .. } => f.write_str("success"),
            ExecResult::Reverted { .. } => f.write_str("reverted"),
            ExecResult::OutOfGas => f.write_str("out_of_gas"),
            ExecResult::Trap(kind) => write!(f, "{}", kind),
        }
    }
}

/// Result of a top-level execution
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecOutcome {
    /// How the top frame ended
    pub result: ExecResult,
    /// Committed effects; empty unless the frame succeeded
    pub pending: PendingState,
}
