//! `keel run`: execute bytecode against an empty in-memory host

use clap::Args;
use keel_primitives::hex;
use keel_vm::{InMemoryBackend, Params, Vm};
use serde_json::{json, Value};

use super::{parse_address, parse_bytes, parse_word};
use crate::{config::Config, output::Output, CliError};

const DEFAULT_ADDRESS: &str = "0x0f572e5295c57f15886f9b263e2f6d2d6c7b5ec6";
const DEFAULT_CALLER: &str = "0xcd1722f2947def4cf144679da39c4c32bdc35681";

/// Arguments of `keel run`
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Bytecode (hex)
    pub code: String,
    /// Call data (hex)
    #[arg(short, long, default_value = "")]
    pub data: String,
    /// Gas for the frame; defaults to the configured amount
    #[arg(short, long)]
    pub gas: Option<u64>,
    /// CALLVALUE
    #[arg(long, default_value = "0")]
    pub value: String,
    /// Balance credited to the caller beforehand
    #[arg(long, default_value = "0")]
    pub balance: String,
    /// Executing account
    #[arg(long, default_value = DEFAULT_ADDRESS)]
    pub address: String,
    /// CALLER and ORIGIN
    #[arg(long, default_value = DEFAULT_CALLER)]
    pub caller: String,
    /// Treat the code as init code and deploy what it returns
    #[arg(long)]
    pub create: bool,
}

impl RunArgs {
    /// Run the frame and print its outcome
    pub fn execute(self, config: &Config, json: bool) -> Result<(), CliError> {
        let code = parse_bytes(&self.code)?;
        let data = parse_bytes(&self.data)?;
        let value = parse_word(&self.value)?;
        let address = parse_address(&self.address)?;
        let caller = parse_address(&self.caller)?;
        let gas = self.gas.unwrap_or(config.gas);

        let mut backend = InMemoryBackend::new();
        backend.set_balance(caller, parse_word(&self.balance)?);
        if !self.create {
            backend.set_code(address, code.clone());
        }

        let mut params = Params::new(address, caller, gas, code, data).with_value(value);
        if self.create {
            params = params.as_create();
        }

        let env = config.executor.env();
        let outcome = Vm::new(&config.executor.schedule, &env)
            .with_max_depth(config.executor.max_call_depth)
            .execute(params, &backend)?;
        tracing::debug!(result = %outcome.result, "frame finished");

        let gas_left = outcome.result.gas_left();
        let output = outcome.result.output();
        let mut report = Output::new(json)
            .field("status", &outcome.result)
            .field_u64("gas_left", gas_left)
            .field_u64("gas_used", gas - gas_left)
            .field("output", hex::encode_prefixed(&output))
            .labeled("Status", &outcome.result)
            .labeled("Gas used", gas - gas_left)
            .labeled("Gas left", gas_left)
            .labeled("Output", hex::encode_prefixed(&output));

        if !outcome.result.is_success() {
            report.print();
            return Ok(());
        }

        backend.apply(&outcome.pending);

        let storage: Vec<Value> = outcome
            .pending
            .storage
            .iter()
            .map(|((contract, key), value)| {
                json!({
                    "address": contract.to_string(),
                    "key": format!("{:#x}", key),
                    "value": format!("{:#x}", value),
                })
            })
            .collect();
        if !storage.is_empty() {
            report = report.line("Storage:");
        }
        for ((contract, key), value) in &outcome.pending.storage {
            report = report.line(format!("  {}[{:#x}] = {:#x}", contract, key, value));
        }

        let logs: Vec<Value> = backend
            .logs
            .iter()
            .map(|log| {
                json!({
                    "address": log.address.to_string(),
                    "topics": log.topics.iter().map(|t| t.to_string()).collect::<Vec<_>>(),
                    "data": hex::encode_prefixed(&log.data),
                })
            })
            .collect();
        report = report.labeled("Logs", logs.len());

        let mut deployed = serde_json::Map::new();
        for (contract, code) in &outcome.pending.codes {
            report = report.labeled("Deployed", format!("{} ({} bytes)", contract, code.len()));
            deployed.insert(contract.to_string(), Value::String(hex::encode_prefixed(code)));
        }

        report
            .field_value("storage", Value::Array(storage))
            .field_value("logs", Value::Array(logs))
            .field_value("deployed", Value::Object(deployed))
            .field_u64("refund", outcome.pending.refund)
            .print();
        Ok(())
    }
}
