//! # keel-host
//!
//! Ledger integration for the Keel EVM.
//!
//! The [`Executor`] is the entry point a ledger calls with a raw RLP
//! transaction. It resolves the sender, enforces the nonce and ownership
//! rules, runs the transaction through [`keel_vm::Vm`], and on success writes
//! storage, balances, code and logs back through a [`HostLedger`].
//!
//! - [`MemoryLedger`] - thread-safe in-memory ledger
//! - [`SignerResolver`] / [`EcdsaRecovery`] - signer recovery for signed transactions
//! - [`ExecutorConfig`] - chain, block environment and gas schedule

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod error;
mod executor;
mod ledger;
mod signer;

pub use config::ExecutorConfig;
pub use error::{HostError, HostResult};
pub use executor::{CallOutcome, Executor};
pub use ledger::{HostLedger, LinkedAccount, MemoryLedger};
pub use signer::{EcdsaRecovery, SignerResolver};
