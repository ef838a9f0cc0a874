//! Transaction commands

use clap::Subcommand;
use keel_crypto::PrivateKey;
use keel_primitives::hex;
use keel_types::{Action, Transaction, TxSignature};

use super::{parse_address, parse_bytes, parse_word};
use crate::{config::Config, output::Output, CliError};

/// Transaction subcommands
#[derive(Debug, Subcommand)]
pub enum TxCommand {
    /// Decode a raw RLP transaction and recover its signer
    Decode {
        /// Raw transaction (hex)
        raw: String,
    },
    /// Build and sign a transaction
    Sign {
        /// Private key (hex)
        #[arg(short, long)]
        key: String,
        /// Recipient; omit to create a contract
        #[arg(short, long)]
        to: Option<String>,
        /// Sender nonce
        #[arg(short, long, default_value = "1")]
        nonce: String,
        /// Value to transfer
        #[arg(short, long, default_value = "0")]
        value: String,
        /// Call data or init code (hex)
        #[arg(short, long, default_value = "")]
        data: String,
        /// Gas limit
        #[arg(long, default_value = "100000")]
        gas_limit: String,
        /// Gas price
        #[arg(long, default_value = "0")]
        gas_price: String,
        /// Sign pre-EIP-155, without a chain id
        #[arg(long)]
        legacy: bool,
    },
}

impl TxCommand {
    /// Run the subcommand
    pub fn execute(self, config: &Config, json: bool) -> Result<(), CliError> {
        match self {
            TxCommand::Decode { raw } => decode(&raw, json),
            TxCommand::Sign {
                key,
                to,
                nonce,
                value,
                data,
                gas_limit,
                gas_price,
                legacy,
            } => {
                let key = parse_key(&key)?;
                let action = match to {
                    Some(to) => Action::Call(parse_address(&to)?),
                    None => Action::Create,
                };
                let tx = Transaction {
                    action,
                    nonce: parse_word(&nonce)?,
                    gas_price: parse_word(&gas_price)?,
                    gas_limit: parse_word(&gas_limit)?,
                    value: parse_word(&value)?,
                    data: parse_bytes(&data)?,
                    signature: TxSignature::default(),
                };
                let chain_id = (!legacy).then_some(config.executor.chain_id);
                let tx = tx.sign(&key, chain_id)?;
                let raw = hex::encode_prefixed(tx.encode());

                Output::new(json)
                    .field("raw", &raw)
                    .field("hash", tx.hash())
                    .field("sender", tx.recover_sender()?)
                    .line(raw.clone())
                    .print();
                Ok(())
            }
        }
    }
}

fn parse_key(s: &str) -> Result<PrivateKey, CliError> {
    let bytes = hex::decode(s).map_err(|e| CliError::InvalidKey(e.to_string()))?;
    PrivateKey::from_slice(&bytes).map_err(|e| CliError::InvalidKey(e.to_string()))
}

fn decode(raw: &str, json: bool) -> Result<(), CliError> {
    let tx = Transaction::parse(&parse_bytes(raw)?)?;
    let to = match tx.action {
        Action::Call(address) => address.to_string(),
        Action::Create => "create".to_string(),
    };

    let mut output = Output::new(json)
        .field("hash", tx.hash())
        .field("to", &to)
        .field("nonce", tx.nonce)
        .field("gas_price", tx.gas_price)
        .field("gas_limit", tx.gas_limit)
        .field("value", tx.value)
        .field("data", hex::encode_prefixed(&tx.data))
        .field_bool("signed", tx.has_signature())
        .labeled("Hash", tx.hash())
        .labeled("To", &to)
        .labeled("Nonce", tx.nonce)
        .labeled("Gas price", tx.gas_price)
        .labeled("Gas limit", tx.gas_limit)
        .labeled("Value", tx.value)
        .labeled("Data", hex::encode_prefixed(&tx.data));

    if tx.has_signature() {
        let sender = tx.recover_sender()?;
        output = output.field("sender", sender).labeled("Sender", sender);
        if let Some(chain_id) = tx.signature.chain_id() {
            output = output
                .field_u64("chain_id", chain_id)
                .labeled("Chain ID", chain_id);
        }
    } else {
        output = output.labeled("Sender", "unsigned");
    }

    output.print();
    Ok(())
}
