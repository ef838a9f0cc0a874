//! VM error types
//!
//! A [`TrapKind`] is an ordinary execution outcome carried inside
//! [`ExecResult::Trap`](crate::ExecResult::Trap); it never travels as a Rust
//! `Err`. [`VmError`] is reserved for calls into the VM that cannot start at all.

use thiserror::Error;

/// Fatal conditions that end a frame and discard its writes.
///
/// The `Display` strings are the reporting strings hosts surface to users.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrapKind {
    /// Pop or peek below the bottom of the stack
    #[error("STACK_UNDERFLOW")]
    StackUnderflow,

    /// Push beyond 1024 items
    #[error("OUT_OF_STACK")]
    OutOfStack,

    /// Undefined opcode or the designated INVALID opcode
    #[error("INVALID_INSTRUCTION")]
    InvalidInstruction,

    /// JUMP or JUMPI to an offset that is not a JUMPDEST
    #[error("INVALID_JUMP")]
    InvalidJump,

    /// A value transfer the sender cannot cover
    #[error("MESSAGE_CALL_FAILED [Insufficient funds.]")]
    InsufficientFunds,

    /// Contract creation at an address that already holds code
    #[error("MESSAGE_CALL_FAILED [An invalid address is attempting to create a contract.]")]
    InvalidCodeAddress,

    /// A value that does not fit its 256-bit destination
    #[error("MESSAGE_CALL_FAILED [An integer overflow ocurred.]")]
    Overflow,

    /// RETURNDATACOPY past the end of the return data buffer
    #[error("RETURN_DATA_OUT_OF_BOUNDS")]
    ReturnDataOutOfBounds,

    /// State modification attempted inside a STATICCALL
    #[error("MUTABLE_CALL_IN_STATIC_CONTEXT")]
    MutableCallInStaticContext,
}

/// Errors that prevent execution from starting
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VmError {
    /// Frame parameters that cannot be executed
    #[error("invalid params: {0}")]
    InvalidParams(&'static str),
}

/// Result type for VM entry points
pub type VmResult<T> = Result<T, VmError>;
