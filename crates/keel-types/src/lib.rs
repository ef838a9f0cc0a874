//! # keel-types
//!
//! Transaction and address types for the Keel EVM.
//!
//! This crate provides:
//! - [`Transaction`] - the 9-field RLP transaction, parsed and re-encoded
//! - [`AddressScheme`] and [`contract_address`] - deterministic contract addresses
//! - [`account_identifier`] - host account name + address to an opaque identifier

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod address;
mod error;
pub mod transaction;

pub use address::{
    account_identifier, contract_address, create2_address, legacy_contract_address, AddressScheme,
};
pub use error::{TypeError, TypeResult};
pub use transaction::{Action, Transaction, TxSignature};
