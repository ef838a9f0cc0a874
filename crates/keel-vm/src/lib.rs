//! # keel-vm
//!
//! EVM bytecode interpreter for the Keel settlement layer.
//!
//! This crate provides:
//! - [`Vm`] - fetch-decode-execute loop with call and create dispatch
//! - [`Stack`], [`Memory`], [`JumpSet`] - per-frame machine state
//! - [`Schedule`] and [`Gasometer`] - gas constants and accounting
//! - [`AccountState`] and [`PendingState`] - scoped state overlay and its committed effects
//! - [`External`] - the host capability the VM reads through
//!
//! A frame ends in an [`ExecResult`]. Traps are values of that enum, never
//! Rust errors; [`VmError`] only rejects frames that cannot start.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod account_state;
pub mod arith;
mod backend;
mod context;
mod error;
mod external;
pub mod gas;
mod interpreter;
mod jumps;
mod memory;
pub mod opcode;
mod pending;
mod result;
mod stack;

pub use account_state::AccountState;
pub use backend::{InMemoryAccount, InMemoryBackend};
pub use context::{CallType, Env, Params};
pub use error::{TrapKind, VmError, VmResult};
pub use external::External;
pub use gas::{Gasometer, OutOfGas, Schedule};
pub use interpreter::{Vm, MAX_CALL_DEPTH};
pub use jumps::JumpSet;
pub use memory::Memory;
pub use opcode::{GasTier, InstructionInfo, Opcode};
pub use pending::{Log, PendingState};
pub use result::{ExecOutcome, ExecResult};
pub use stack::{Stack, MAX_STACK_SIZE};
