use anyhow::{Context, Result};
use ccip_chain::EvmChainClient;
use tracing::info;

use crate::config::Config;
use crate::exec::{ExecutionOutcome, ManualExecution};

pub mod cli;
pub use cli::{Cli, VERSION};

/// Loads the config, connects to both chains and runs the pipeline once.
pub async fn execute(cli: Cli) -> Result<ExecutionOutcome> {
    let config = Config::load(&cli.config)?;
    let args = config.validate()?;

    let source = EvmChainClient::connect(args.src_rpc.as_str()).context("Failed to create source chain client")?;
    let dest = EvmChainClient::connect_with_signer(args.dest_rpc.as_str(), &args.dest_owner_key)
        .context("Failed to create destination chain client")?;
    info!(
        "source rpc {}, destination rpc {}, submitting as {:?}",
        source.url(),
        dest.url(),
        dest.sender()
    );

    let outcome = ManualExecution::new(&source, &dest, &args).run().await?;
    Ok(outcome)
}
