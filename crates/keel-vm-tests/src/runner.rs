//! Fixture runner and statistics

use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant};

use keel_vm::{Params, Schedule, Vm};

use crate::error::{FixtureError, FixtureResult};
use crate::mock::MockExternal;
use crate::types::{Fixture, FixtureFile};

/// Results of one fixture file
#[derive(Debug, Default)]
pub struct FileReport {
    /// File the fixtures came from
    pub file: String,
    /// Passed fixture names
    pub passed: Vec<String>,
    /// Failed fixture names with reasons
    pub failed: Vec<(String, String)>,
}

impl FileReport {
    /// Fixtures run
    pub fn total(&self) -> usize {
        self.passed.len() + self.failed.len()
    }
}

/// Aggregated statistics over many files
#[derive(Debug, Default)]
pub struct FixtureStats {
    /// Fixtures run
    pub total: usize,
    /// Fixtures passed
    pub passed: usize,
    /// Fixtures failed
    pub failed: usize,
    /// Wall time
    pub duration: Duration,
    /// `file::name` with reasons
    pub failures: Vec<(String, String)>,
}

impl FixtureStats {
    /// Fold in one file
    pub fn add(&mut self, report: &FileReport) {
        self.total += report.total();
        self.passed += report.passed.len();
        self.failed += report.failed.len();
        for (name, reason) in &report.failed {
            self.failures
                .push((format!("{}::{}", report.file, name), reason.clone()));
        }
    }

    /// Pass rate as percentage
    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        (self.passed as f64 / self.total as f64) * 100.0
    }
}

impl fmt::Display for FixtureStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total:     {}", self.total)?;
        writeln!(f, "Passed:    {}", self.passed)?;
        writeln!(f, "Failed:    {}", self.failed)?;
        writeln!(f, "Pass Rate: {:.2}%", self.pass_rate())?;
        write!(f, "Duration:  {:.2}s", self.duration.as_secs_f64())?;
        for (name, reason) in &self.failures {
            write!(f, "\n  - {}: {}", name, reason)?;
        }
        Ok(())
    }
}

/// Runs fixtures through the interpreter
pub struct FixtureRunner {
    schedule: Schedule,
    verbose: bool,
}

impl FixtureRunner {
    /// Runner on the default schedule
    pub fn new(verbose: bool) -> Self {
        Self {
            schedule: Schedule::default(),
            verbose,
        }
    }

    /// Use a different gas schedule
    pub fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Run every `.json` file under `dir`, recursively
    pub fn run_dir(&self, dir: &Path) -> FixtureResult<FixtureStats> {
        let start = Instant::now();
        let mut stats = FixtureStats::default();
        self.run_dir_recursive(dir, &mut stats)?;
        stats.duration = start.elapsed();
        Ok(stats)
    }

    fn run_dir_recursive(&self, dir: &Path, stats: &mut FixtureStats) -> FixtureResult<()> {
        let mut entries = std::fs::read_dir(dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<Vec<_>, _>>()?;
        entries.sort();

        for path in entries {
            if path.is_dir() {
                self.run_dir_recursive(&path, stats)?;
            } else if path.extension().is_some_and(|e| e == "json") {
                let report = self.run_file(&path)?;
                stats.add(&report);
            }
        }
        Ok(())
    }

    /// Run every fixture in one file
    pub fn run_file(&self, path: &Path) -> FixtureResult<FileReport> {
        let content = std::fs::read_to_string(path)?;
        let file = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        self.run_str(&file, &content)
    }

    /// Run every fixture in a JSON document
    pub fn run_str(&self, file: &str, json: &str) -> FixtureResult<FileReport> {
        let fixtures: FixtureFile = serde_json::from_str(json)?;
        let mut report = FileReport {
            file: file.to_string(),
            ..FileReport::default()
        };

        for (name, fixture) in &fixtures {
            match self.run_fixture(fixture) {
                Ok(()) => {
                    if self.verbose {
                        tracing::info!("PASS: {}", name);
                    }
                    report.passed.push(name.clone());
                }
                Err(e) => {
                    tracing::warn!("FAIL: {} - {}", name, e);
                    report.failed.push((name.clone(), e.to_string()));
                }
            }
        }
        Ok(report)
    }

    /// Run one fixture and check every expectation it states
    pub fn run_fixture(&self, fixture: &Fixture) -> FixtureResult<()> {
        let mut external = MockExternal::new();
        for (address, account) in &fixture.pre {
            external = external
                .with_balance(address.0, account.balance.0)
                .with_code(address.0, account.code.0.clone())
                .with_nonce(address.0, account.nonce.0);
            for (key, value) in &account.storage {
                external = external.with_storage(&address.0, &key.0, &value.0);
            }
        }

        let exec = &fixture.exec;
        let params = Params::new(
            exec.address.0,
            exec.caller.0,
            exec.gas.0,
            exec.code.0.clone(),
            exec.data.0.clone(),
        )
        .with_origin(exec.origin.unwrap_or(exec.caller).0)
        .with_value(exec.value.0)
        .with_gas_price(exec.gas_price.0);

        let env = fixture.env.to_env();
        let outcome = Vm::new(&self.schedule, &env).execute(params, &external)?;
        let expect = &fixture.expect;

        let status = outcome.result.to_string();
        if status != expect.status {
            return Err(FixtureError::Assertion(format!(
                "status: expected {}, got {}",
                expect.status, status
            )));
        }

        if let Some(gas_left) = expect.gas_left {
            if outcome.result.gas_left() != gas_left.0 {
                return Err(FixtureError::Assertion(format!(
                    "gas left: expected {}, got {}",
                    gas_left.0,
                    outcome.result.gas_left()
                )));
            }
        }

        if let Some(out) = &expect.out {
            if outcome.result.output() != out.0 {
                return Err(FixtureError::Assertion(format!(
                    "output: expected {}, got {}",
                    hex::encode(&out.0),
                    hex::encode(outcome.result.output())
                )));
            }
        }

        for (address, slots) in &expect.storage {
            for (key, value) in slots {
                let actual = external.storage_after(&outcome.pending, &address.0, &key.0);
                if actual != value.0 {
                    return Err(FixtureError::Assertion(format!(
                        "storage {}[{:#x}]: expected {:#x}, got {:#x}",
                        address.0, key.0, value.0, actual
                    )));
                }
            }
        }

        external.forward(&outcome.pending);
        if let Some(logs) = expect.logs {
            if external.logs.len() != logs {
                return Err(FixtureError::Assertion(format!(
                    "logs: expected {}, got {}",
                    logs,
                    external.logs.len()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    #[test]
    fn test_bundled_fixtures_pass() {
        let stats = FixtureRunner::new(true).run_dir(&fixtures_dir()).unwrap();
        assert_eq!(stats.failed, 0, "{}", stats);
        assert!(stats.total >= 20, "{}", stats);
    }

    #[test]
    fn test_wrong_expectation_fails() {
        let json = r#"{
            "wrong_gas": {
                "exec": {
                    "address": "0x0000000000000000000000000000000000ea0e9a",
                    "caller": "0x0000000000000000000000000000000000ea0e9e",
                    "code": "6000600020600055",
                    "gas": 100000
                },
                "expect": { "gas_left": 79960 }
            },
            "wrong_status": {
                "exec": {
                    "address": "0x0000000000000000000000000000000000ea0e9a",
                    "caller": "0x0000000000000000000000000000000000ea0e9e",
                    "code": "01",
                    "gas": 100000
                },
                "expect": { "status": "success" }
            }
        }"#;
        let report = FixtureRunner::new(false).run_str("inline", json).unwrap();
        assert!(report.passed.is_empty());
        assert_eq!(report.failed.len(), 2);
        assert!(report.failed[0].1.contains("gas left"));
        assert!(report.failed[1].1.contains("STACK_UNDERFLOW"));
    }

    #[test]
    fn test_stats_pass_rate() {
        let mut stats = FixtureStats::default();
        assert_eq!(stats.pass_rate(), 100.0);
        stats.add(&FileReport {
            file: "a.json".to_string(),
            passed: vec!["x".into(); 9],
            failed: vec![("y".into(), "boom".into())],
        });
        assert!((stats.pass_rate() - 90.0).abs() < 0.01);
        assert_eq!(stats.failures[0].0, "a.json::y");
    }
}
