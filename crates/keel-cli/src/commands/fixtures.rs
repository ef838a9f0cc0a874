//! `keel fixtures`: run a directory of JSON bytecode fixtures

use std::path::PathBuf;

use clap::Args;
use keel_vm_tests::FixtureRunner;
use serde_json::json;

use crate::{config::Config, output::Output, CliError};

/// Arguments of `keel fixtures`
#[derive(Debug, Args)]
pub struct FixturesArgs {
    /// Directory searched recursively for `.json` files
    pub dir: PathBuf,
    /// Log every passing fixture
    #[arg(short, long)]
    pub verbose: bool,
}

impl FixturesArgs {
    /// Run the fixtures under the configured schedule; any failure is an error
    pub fn execute(self, config: &Config, json: bool) -> Result<(), CliError> {
        let stats = FixtureRunner::new(self.verbose)
            .with_schedule(config.executor.schedule.clone())
            .run_dir(&self.dir)?;

        let failures: Vec<_> = stats
            .failures
            .iter()
            .map(|(name, reason)| json!({ "name": name, "reason": reason }))
            .collect();
        Output::new(json)
            .field_u64("total", stats.total as u64)
            .field_u64("passed", stats.passed as u64)
            .field_u64("failed", stats.failed as u64)
            .field_value("failures", serde_json::Value::Array(failures))
            .line(stats.to_string())
            .print();

        if stats.failed > 0 {
            return Err(CliError::FixturesFailed(stats.failed));
        }
        Ok(())
    }
}
