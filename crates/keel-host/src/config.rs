//! Executor configuration

use keel_primitives::{Address, Word, H256};
use keel_vm::{Env, Schedule, MAX_CALL_DEPTH};
use serde::{Deserialize, Serialize};

/// Settings of an [`Executor`](crate::Executor)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Chain ID reported by CHAINID and required of EIP-155 signatures
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    /// Upper bound on a transaction's gas limit
    #[serde(default = "default_block_gas_limit")]
    pub block_gas_limit: u64,
    /// NUMBER
    #[serde(default)]
    pub block_number: u64,
    /// TIMESTAMP
    #[serde(default)]
    pub timestamp: u64,
    /// COINBASE
    #[serde(default)]
    pub coinbase: Address,
    /// DIFFICULTY
    #[serde(default)]
    pub difficulty: Word,
    /// BLOCKHASH result
    #[serde(default)]
    pub block_hash: H256,
    /// Deepest nested call or create
    #[serde(default = "default_max_call_depth")]
    pub max_call_depth: usize,
    /// Whether [`Executor::execute_code`](crate::Executor::execute_code) is allowed
    #[serde(default)]
    pub allow_raw_code: bool,
    /// Gas constants
    #[serde(default)]
    pub schedule: Schedule,
}

fn default_chain_id() -> u64 {
    1
}

fn default_block_gas_limit() -> u64 {
    10_000_000
}

fn default_max_call_depth() -> usize {
    MAX_CALL_DEPTH
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            chain_id: default_chain_id(),
            block_gas_limit: default_block_gas_limit(),
            block_number: 0,
            timestamp: 0,
            coinbase: Address::ZERO,
            difficulty: Word::zero(),
            block_hash: H256::ZERO,
            max_call_depth: default_max_call_depth(),
            allow_raw_code: false,
            schedule: Schedule::default(),
        }
    }
}

impl ExecutorConfig {
    /// Block environment seen by the interpreter
    pub fn env(&self) -> Env {
        Env {
            chain_id: self.chain_id,
            block_number: self.block_number,
            timestamp: self.timestamp,
            gas_limit: self.block_gas_limit,
            coinbase: self.coinbase,
            difficulty: self.difficulty,
            block_hash: self.block_hash,
        }
    }

    /// Allow [`Executor::execute_code`](crate::Executor::execute_code)
    pub fn with_raw_code(mut self) -> Self {
        self.allow_raw_code = true;
        self
    }
}
