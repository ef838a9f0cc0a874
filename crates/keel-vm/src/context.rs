//! Execution context: block environment and per-frame parameters

use bytes::Bytes;
use keel_crypto::keccak256;
use keel_primitives::{Address, Word, H256};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Block environment, shared by every frame of a transaction
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct Env {
    /// CHAINID
    pub chain_id: u64,
    /// NUMBER
    pub block_number: u64,
    /// TIMESTAMP
    pub timestamp: u64,
    /// GASLIMIT
    pub gas_limit: u64,
    /// COINBASE
    pub coinbase: Address,
    /// DIFFICULTY
    pub difficulty: Word,
    /// Value returned by BLOCKHASH for any block number
    pub block_hash: H256,
}

impl Default for Env {
    fn default() -> Self {
        Self {
            chain_id: 1,
            block_number: 0,
            timestamp: 0,
            gas_limit: 10_000_000,
            coinbase: Address::ZERO,
            difficulty: Word::zero(),
            block_hash: H256::ZERO,
        }
    }
}

/// How a frame was entered
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallType {
    /// Message call, including the top-level call of a transaction
    Call,
    /// CALLCODE: callee code in the caller's storage context
    CallCode,
    /// DELEGATECALL: callee code with caller's context, sender and value
    DelegateCall,
    /// STATICCALL: no state modification allowed
    StaticCall,
    /// Init code of a CREATE or a creation transaction
    Create,
    /// Init code of a CREATE2
    Create2,
}

impl CallType {
    /// Whether the frame runs init code
    pub fn is_create(self) -> bool {
        matches!(self, CallType::Create | CallType::Create2)
    }
}

/// Immutable parameters of one frame
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Params {
    /// Account whose code runs
    pub code_address: Address,
    /// keccak256 of the code
    pub code_hash: H256,
    /// Code version tag, carried for the host
    pub code_version: Word,
    /// Storage and balance context (ADDRESS)
    pub address: Address,
    /// CALLER
    pub sender: Address,
    /// ORIGIN
    pub origin: Address,
    /// Gas available to the frame
    pub gas: u64,
    /// GASPRICE
    pub gas_price: Word,
    /// CALLVALUE
    pub value: Word,
    /// Bytecode to execute
    pub code: Bytes,
    /// Input data
    pub data: Bytes,
    /// How the frame was entered
    pub call_type: CallType,
    /// Whether state changes are forbidden
    pub is_static: bool,
}

impl Params {
    /// Top-level message call running `code` at `address` on behalf of `sender`.
    ///
    /// The sender is also the origin; code address equals the context address.
    pub fn new(address: Address, sender: Address, gas: u64, code: Bytes, data: Bytes) -> Self {
        Self {
            code_address: address,
            code_hash: keccak256(&code),
            code_version: Word::zero(),
            address,
            sender,
            origin: sender,
            gas,
            gas_price: Word::zero(),
            value: Word::zero(),
            code,
            data,
            call_type: CallType::Call,
            is_static: false,
        }
    }

    /// Set the transferred value
    pub fn with_value(mut self, value: Word) -> Self {
        self.value = value;
        self
    }

    /// Set the gas price
    pub fn with_gas_price(mut self, gas_price: Word) -> Self {
        self.gas_price = gas_price;
        self
    }

    /// Set a transaction origin distinct from the sender
    pub fn with_origin(mut self, origin: Address) -> Self {
        self.origin = origin;
        self
    }

    /// Run as init code of a creation
    pub fn as_create(mut self) -> Self {
        self.call_type = CallType::Create;
        self
    }
}
