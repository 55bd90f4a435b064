//! poolstake command-line client.
//!
//! Imports a signing key, sends a stake transfer to the pool, registers it
//! with the stake ledger and waits for verification.

mod cli;

use clap::Parser;

use poolstake::config::load_or_default;
use poolstake::observability::logging;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_or_default(cli.config.as_deref())?;
    logging::init(cli.log_level.as_deref().unwrap_or(&config.observability.log_level));

    tracing::debug!(
        api = %config.api.base_url,
        rpc = %config.chain.rpc_url,
        chain_id = config.chain.chain_id,
        "Configuration loaded"
    );

    cli::run(cli.command, config).await
}
