//! Fixture JSON format
//!
//! A fixture file maps test names to cases:
//!
//! ```json
//! {
//!   "sha3_empty": {
//!     "exec": { "address": "0x..ea0e9a", "caller": "0x..ea0e9e", "code": "6000600020600055", "gas": 100000 },
//!     "expect": { "gas_left": 79961, "storage": { "0x..ea0e9a": { "0x00": "0xc5d2..." } } }
//!   }
//! }
//! ```
//!
//! Byte strings are hex with an optional `0x`. Numbers are JSON integers or
//! hex strings.

use std::collections::BTreeMap;

use bytes::Bytes;
use keel_primitives::{word, Address, Word, H256};
use keel_vm::Env;
use serde::{Deserialize, Deserializer};

fn strip(s: &str) -> &str {
    s.strip_prefix("0x").unwrap_or(s)
}

fn decode_hex(s: &str) -> Result<Vec<u8>, hex::FromHexError> {
    let s = strip(s);
    if s.len() % 2 == 1 {
        hex::decode(format!("0{}", s))
    } else {
        hex::decode(s)
    }
}

/// Hex-encoded bytes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HexBytes(pub Bytes);

impl<'de> Deserialize<'de> for HexBytes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserializer)?;
        hex::decode(strip(&s))
            .map(|bytes| HexBytes(Bytes::from(bytes)))
            .map_err(serde::de::Error::custom)
    }
}

/// Hex-encoded word, left-padded; at most 32 bytes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct HexWord(pub Word);

impl<'de> Deserialize<'de> for HexWord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserializer)?;
        let bytes = decode_hex(&s).map_err(serde::de::Error::custom)?;
        word::from_be_slice(&bytes)
            .map(HexWord)
            .map_err(serde::de::Error::custom)
    }
}

/// u64 given as a JSON integer or a hex string
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HexU64(pub u64);

impl<'de> Deserialize<'de> for HexU64 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(u64),
            Str(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Int(value) => Ok(HexU64(value)),
            Raw::Str(s) => u64::from_str_radix(strip(&s), 16)
                .map(HexU64)
                .map_err(serde::de::Error::custom),
        }
    }
}

/// Hex-encoded 20-byte address
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HexAddress(pub Address);

impl<'de> Deserialize<'de> for HexAddress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserializer)?;
        Address::from_hex(&s)
            .map(HexAddress)
            .map_err(serde::de::Error::custom)
    }
}

/// Fixture file: test name to case
pub type FixtureFile = BTreeMap<String, Fixture>;

/// Single fixture
#[derive(Debug, Deserialize)]
pub struct Fixture {
    /// Block environment overrides
    #[serde(default)]
    pub env: FixtureEnv,
    /// Frame parameters
    pub exec: FixtureExec,
    /// Host state before execution
    #[serde(default)]
    pub pre: BTreeMap<HexAddress, FixtureAccount>,
    /// Expected outcome
    pub expect: FixtureExpect,
}

/// Block environment; unset fields keep [`Env::default`]
#[derive(Debug, Default, Deserialize)]
pub struct FixtureEnv {
    /// CHAINID
    pub chain_id: Option<HexU64>,
    /// NUMBER
    pub number: Option<HexU64>,
    /// TIMESTAMP
    pub timestamp: Option<HexU64>,
    /// GASLIMIT
    pub gas_limit: Option<HexU64>,
    /// COINBASE
    pub coinbase: Option<HexAddress>,
    /// DIFFICULTY
    pub difficulty: Option<HexWord>,
    /// BLOCKHASH result
    pub block_hash: Option<HexWord>,
}

impl FixtureEnv {
    /// Environment with the overrides applied
    pub fn to_env(&self) -> Env {
        let mut env = Env::default();
        if let Some(chain_id) = self.chain_id {
            env.chain_id = chain_id.0;
        }
        if let Some(number) = self.number {
            env.block_number = number.0;
        }
        if let Some(timestamp) = self.timestamp {
            env.timestamp = timestamp.0;
        }
        if let Some(gas_limit) = self.gas_limit {
            env.gas_limit = gas_limit.0;
        }
        if let Some(coinbase) = self.coinbase {
            env.coinbase = coinbase.0;
        }
        if let Some(difficulty) = self.difficulty {
            env.difficulty = difficulty.0;
        }
        if let Some(block_hash) = self.block_hash {
            env.block_hash = H256::from(block_hash.0);
        }
        env
    }
}

/// Top frame parameters
#[derive(Debug, Deserialize)]
pub struct FixtureExec {
    /// Executing account
    pub address: HexAddress,
    /// CALLER
    pub caller: HexAddress,
    /// ORIGIN; defaults to the caller
    pub origin: Option<HexAddress>,
    /// Bytecode
    pub code: HexBytes,
    /// Call data
    #[serde(default)]
    pub data: HexBytes,
    /// Gas provided
    pub gas: HexU64,
    /// CALLVALUE
    #[serde(default)]
    pub value: HexWord,
    /// GASPRICE
    #[serde(default)]
    pub gas_price: HexWord,
}

/// Account in the pre-state
#[derive(Debug, Default, Deserialize)]
pub struct FixtureAccount {
    /// Balance
    #[serde(default)]
    pub balance: HexWord,
    /// Code
    #[serde(default)]
    pub code: HexBytes,
    /// Nonce
    #[serde(default)]
    pub nonce: HexU64,
    /// Storage slots
    #[serde(default)]
    pub storage: BTreeMap<HexWord, HexWord>,
}

fn default_status() -> String {
    "success".to_string()
}

/// Expected outcome of a fixture
#[derive(Debug, Deserialize)]
pub struct FixtureExpect {
    /// `success`, `reverted`, `out_of_gas`, or a trap name such as `INVALID_JUMP`
    #[serde(default = "default_status")]
    pub status: String,
    /// Gas left in the top frame
    pub gas_left: Option<HexU64>,
    /// Slots to check after execution
    #[serde(default)]
    pub storage: BTreeMap<HexAddress, BTreeMap<HexWord, HexWord>>,
    /// Number of logs forwarded to the host
    pub logs: Option<usize>,
    /// RETURN or REVERT data
    pub out: Option<HexBytes>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fixture() {
        let json = r#"{
            "case": {
                "env": { "block_hash": "0x01" },
                "exec": {
                    "address": "0x0f572e5295c57f15886f9b263e2f6d2d6c7b5ec6",
                    "caller": "0xcd1722f2947def4cf144679da39c4c32bdc35681",
                    "code": "0x30600055",
                    "gas": "0x186a0"
                },
                "pre": {
                    "0xcd1722f2947def4cf144679da39c4c32bdc35681": {
                        "balance": "0x401",
                        "storage": { "0x00": "0xff" }
                    }
                },
                "expect": { "gas_left": 79995 }
            }
        }"#;
        let file: FixtureFile = serde_json::from_str(json).unwrap();
        let fixture = &file["case"];

        assert_eq!(fixture.exec.gas.0, 100_000);
        assert_eq!(fixture.exec.code.0.as_ref(), &[0x30, 0x60, 0x00, 0x55]);
        assert!(fixture.exec.data.0.is_empty());
        assert_eq!(fixture.expect.status, "success");
        assert_eq!(fixture.expect.gas_left, Some(HexU64(79995)));
        assert_eq!(fixture.env.to_env().block_hash, H256::from(Word::one()));

        let (address, account) = fixture.pre.iter().next().unwrap();
        assert_eq!(
            address.0,
            Address::from_hex("cd1722f2947def4cf144679da39c4c32bdc35681").unwrap()
        );
        assert_eq!(account.balance.0, Word::from(1025u64));
        assert_eq!(account.storage[&HexWord(Word::zero())].0, Word::from(0xffu64));
    }

    #[test]
    fn test_word_longer_than_32_bytes_is_rejected() {
        let json = format!("\"0x{}\"", "11".repeat(33));
        assert!(serde_json::from_str::<HexWord>(&json).is_err());
    }
}
