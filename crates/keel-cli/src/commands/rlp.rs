//! RLP commands

use clap::Subcommand;
use keel_primitives::hex;
use keel_rlp::{decode, decode_all, encode, RlpItem};
use serde_json::Value;

use super::parse_bytes;
use crate::{output::Output, CliError};

/// RLP subcommands
#[derive(Debug, Subcommand)]
pub enum RlpCommand {
    /// Decode hex RLP into a JSON tree of hex strings
    Decode {
        /// Encoded bytes (hex)
        data: String,
        /// Accept a sequence of top-level items
        #[arg(long)]
        all: bool,
    },
    /// Encode a JSON tree of hex strings and arrays
    Encode {
        /// e.g. `["0x01", ["0x", "0xff"]]`
        #[arg(value_name = "JSON")]
        tree: String,
    },
}

impl RlpCommand {
    /// Run the subcommand
    pub fn execute(self, json: bool) -> Result<(), CliError> {
        match self {
            RlpCommand::Decode { data, all } => {
                let bytes = parse_bytes(&data)?;
                let tree = if all {
                    Value::Array(decode_all(&bytes)?.iter().map(to_json).collect())
                } else {
                    to_json(&decode(&bytes)?)
                };
                Output::new(json)
                    .field_value("item", tree.clone())
                    .line(serde_json::to_string_pretty(&tree)?)
                    .print();
            }
            RlpCommand::Encode { tree } => {
                let item = from_json(&serde_json::from_str::<Value>(&tree)?)?;
                let encoded = hex::encode_prefixed(encode(&item));
                Output::new(json)
                    .field("encoded", &encoded)
                    .line(encoded.clone())
                    .print();
            }
        }
        Ok(())
    }
}

fn to_json(item: &RlpItem) -> Value {
    match item {
        RlpItem::String(bytes) => Value::String(hex::encode_prefixed(bytes)),
        RlpItem::List(items) => Value::Array(items.iter().map(to_json).collect()),
    }
}

fn from_json(value: &Value) -> Result<RlpItem, CliError> {
    match value {
        Value::String(s) => Ok(RlpItem::from(parse_bytes(s)?)),
        Value::Array(values) => Ok(RlpItem::List(
            values.iter().map(from_json).collect::<Result<_, _>>()?,
        )),
        other => Err(CliError::InvalidInput(format!(
            "expected a hex string or an array, got {}",
            other
        ))),
    }
}
