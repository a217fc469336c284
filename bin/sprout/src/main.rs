//! sprout is a CLI tool that boots a local dapp environment in one command:
//! dev chain, contract migration, config patch, data seeding, app server.

mod cli;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use cli::Cli;
use sprout_orchestrate::Orchestrator;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize the logger.
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .init();

    // If a config file is provided, load it and run
    if let Some(config_path) = &cli.config {
        let config_path = PathBuf::from(config_path);
        let orchestrator = Orchestrator::load_from_file(&config_path)?;

        tracing::info!(
            config_path = %config_path.display(),
            app_dir = %orchestrator.app_dir.display(),
            contract = %orchestrator.contract_name,
            "Loading pipeline from config file..."
        );

        orchestrator.run().await?;

        return Ok(());
    }

    // Otherwise, create a new pipeline from CLI arguments
    let mut orchestrator = Orchestrator::new(PathBuf::from(&cli.app_dir));
    orchestrator.contract_name = cli.contract;
    orchestrator.network.port = cli.network_port;
    orchestrator.network.network_id = cli.network_id;
    orchestrator.server.port = cli.server_port;
    orchestrator.server.runner = cli.runner;
    orchestrator.skip_seed = cli.no_seed;

    // Save the configuration to Sprout.toml before running
    orchestrator.save_config()?;

    orchestrator.run().await?;

    Ok(())
}
