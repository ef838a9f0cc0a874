//! # keel-vm-tests
//!
//! JSON bytecode fixtures for the Keel EVM.
//!
//! This crate provides:
//! - The fixture file format ([`FixtureFile`])
//! - [`MockExternal`], a host double with lookup and notification spies
//! - [`FixtureRunner`], which runs fixtures and aggregates [`FixtureStats`]
//!
//! The bundled fixtures live in `fixtures/` and run as part of `cargo test`.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod mock;
mod runner;
mod types;

pub use error::{FixtureError, FixtureResult};
pub use mock::MockExternal;
pub use runner::{FileReport, FixtureRunner, FixtureStats};
pub use types::*;
