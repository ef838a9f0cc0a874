//! # keel-cli
//!
//! Command-line tooling for the Keel EVM.
//!
//! ## Usage
//!
//! ```bash
//! # Execute bytecode against an empty host
//! keel run 0x600160005500 --gas 100000
//! keel run 0x600160005360016000f3 --create
//!
//! # Transactions
//! keel tx sign --key 0x... --to 0x... --data 0x...
//! keel tx decode 0xf86c...
//!
//! # RLP
//! keel rlp decode 0xc88363617483646f67
//! keel rlp encode '["0x636174", ["0x646f67"]]'
//!
//! # Addresses
//! keel address legacy --sender 0x... --nonce 1
//! keel address create2 --sender 0x... --salt 0x... --init-code 0x...
//! keel account-id alice 0x...
//!
//! # Fixtures and configuration
//! keel fixtures crates/keel-vm-tests/fixtures
//! keel config --show
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod error;
mod output;

use config::Config;
use error::CliError;
use output::Output;

/// Keel EVM tooling
#[derive(Parser, Debug)]
#[command(name = "keel")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Config file; defaults to ~/.keel/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Tracing filter, overriding the configured one
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// CLI commands
#[derive(Debug, Subcommand)]
enum Commands {
    /// Execute bytecode
    Run(commands::run::RunArgs),
    /// Build, sign and decode transactions
    #[command(subcommand)]
    Tx(commands::tx::TxCommand),
    /// Encode and decode RLP
    #[command(subcommand)]
    Rlp(commands::rlp::RlpCommand),
    /// Derive contract addresses
    #[command(subcommand)]
    Address(commands::address::AddressCommand),
    /// Identifier linking a host account name to an address
    AccountId {
        /// Host account name
        name: String,
        /// Ethereum address
        address: String,
    },
    /// Run JSON bytecode fixtures
    Fixtures(commands::fixtures::FixturesArgs),
    /// Show or initialize configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
        /// Write the defaults to the config file
        #[arg(long)]
        init: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    let json = cli.json;

    if let Err(e) = run(cli) {
        if json {
            println!(
                "{}",
                serde_json::json!({
                    "error": format!("{:#}", e),
                    "success": false
                })
            );
        } else {
            eprintln!("Error: {:#}", e);
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let path = match cli.config {
        Some(path) => path,
        None => Config::default_path().context("cannot determine home directory")?,
    };
    let config = Config::load(&path).with_context(|| format!("loading {}", path.display()))?;

    let filter = cli.log_level.as_deref().unwrap_or(&config.log_filter);
    init_tracing(filter, cli.log_json);
    tracing::debug!(config = %path.display(), "configuration loaded");

    let json = cli.json;
    match cli.command {
        Commands::Run(args) => args.execute(&config, json)?,
        Commands::Tx(cmd) => cmd.execute(&config, json)?,
        Commands::Rlp(cmd) => cmd.execute(json)?,
        Commands::Address(cmd) => cmd.execute(json)?,
        Commands::AccountId { name, address } => {
            commands::address::account_id(&name, &address, json)?
        }
        Commands::Fixtures(args) => args.execute(&config, json)?,
        Commands::Config { show, init } => handle_config(&config, &path, show, init, json)?,
    }
    Ok(())
}

fn init_tracing(default_filter: &str, json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn handle_config(
    config: &Config,
    path: &Path,
    show: bool,
    init: bool,
    json: bool,
) -> Result<(), CliError> {
    if init {
        if path.exists() {
            return Err(CliError::Config(format!(
                "{} already exists",
                path.display()
            )));
        }
        Config::default().save(path)?;
        Output::new(json)
            .field("status", "saved")
            .field("path", path.display())
            .line(format!("Configuration written to {}", path.display()))
            .print();
    } else if show {
        let executor = &config.executor;
        Output::new(json)
            .field("path", path.display())
            .field("log_filter", &config.log_filter)
            .field_u64("gas", config.gas)
            .field_u64("chain_id", executor.chain_id)
            .field_u64("block_gas_limit", executor.block_gas_limit)
            .field_u64("max_call_depth", executor.max_call_depth as u64)
            .field_bool("allow_raw_code", executor.allow_raw_code)
            .labeled("Path", path.display())
            .labeled("Log filter", &config.log_filter)
            .labeled("Gas", config.gas)
            .labeled("Chain ID", executor.chain_id)
            .labeled("Block gas", executor.block_gas_limit)
            .labeled("Max depth", executor.max_call_depth)
            .print();
    } else {
        Output::new(json)
            .line("Use --show to display config, or --init to write the defaults")
            .print();
    }
    Ok(())
}
