//! Address derivation commands

use clap::Subcommand;
use keel_types::{account_identifier, contract_address, AddressScheme};

use super::{parse_address, parse_bytes, parse_word};
use crate::{output::Output, CliError};

/// Contract address subcommands
#[derive(Debug, Subcommand)]
pub enum AddressCommand {
    /// CREATE address from sender and nonce
    Legacy {
        /// Creating account
        #[arg(short, long)]
        sender: String,
        /// Sender nonce at creation
        #[arg(short, long)]
        nonce: String,
    },
    /// CREATE2 address from sender, salt and init code
    Create2 {
        /// Creating account
        #[arg(short, long)]
        sender: String,
        /// 32-byte salt
        #[arg(long)]
        salt: String,
        /// Init code (hex)
        #[arg(short, long)]
        init_code: String,
    },
}

impl AddressCommand {
    /// Run the subcommand
    pub fn execute(self, json: bool) -> Result<(), CliError> {
        let address = match self {
            AddressCommand::Legacy { sender, nonce } => contract_address(
                AddressScheme::Legacy,
                &parse_address(&sender)?,
                &parse_word(&nonce)?,
                &[],
            ),
            AddressCommand::Create2 {
                sender,
                salt,
                init_code,
            } => contract_address(
                AddressScheme::Eip1014,
                &parse_address(&sender)?,
                &parse_word(&salt)?,
                &parse_bytes(&init_code)?,
            ),
        };

        Output::new(json)
            .field("address", address)
            .line(address.to_string())
            .print();
        Ok(())
    }
}

/// `keel account-id`: identifier linking a host account name to an address
pub fn account_id(name: &str, address: &str, json: bool) -> Result<(), CliError> {
    if name.is_empty() {
        return Err(CliError::InvalidInput("account name is empty".to_string()));
    }
    let identifier = account_identifier(name, &parse_address(address)?);
    Output::new(json)
        .field("name", name)
        .field("identifier", identifier)
        .line(identifier.to_string())
        .print();
    Ok(())
}
