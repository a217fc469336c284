use clap::Parser;
use sprout_orchestrate::services::{ganache, server};
use sprout_orchestrate::Runner;
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "sprout")]
#[command(
    author,
    version,
    about = "Boot a local dapp environment (chain + contracts + app) in one command"
)]
pub struct Cli {
    /// The verbosity level.
    #[arg(short, long, env = "SPROUT_VERBOSITY", default_value_t = LevelFilter::INFO)]
    pub verbosity: LevelFilter,

    /// Path to an existing Sprout.toml configuration file to load.
    ///
    /// When provided, the run uses the configuration from this file instead
    /// of generating a new one from CLI arguments.
    #[arg(long, alias = "conf", env = "SPROUT_CONFIG")]
    pub config: Option<String>,

    /// Path to the application directory (truffle project + app server).
    #[arg(short, long, env = "SPROUT_APP_DIR", default_value = ".")]
    pub app_dir: String,

    /// Name of the contract whose deployment artifact is consulted.
    #[arg(long, env = "SPROUT_CONTRACT", default_value = "SupplyChain")]
    pub contract: String,

    /// RPC port for the dev chain.
    #[arg(long, env = "SPROUT_NETWORK_PORT", default_value_t = ganache::DEFAULT_PORT)]
    pub network_port: u16,

    /// Fixed network id for the dev chain.
    ///
    /// If not provided, the chain picks its own and the pipeline discovers
    /// it from the migration output.
    #[arg(long, env = "SPROUT_NETWORK_ID")]
    pub network_id: Option<u64>,

    /// Port the app server binds.
    #[arg(long, env = "SPROUT_SERVER_PORT", default_value_t = server::DEFAULT_PORT)]
    pub server_port: u16,

    /// Tool that launches the app server.
    #[arg(long, env = "SPROUT_RUNNER", default_value_t = Runner::Npm)]
    pub runner: Runner,

    /// Skip the data seeding phase.
    #[arg(long, env = "SPROUT_NO_SEED")]
    pub no_seed: bool,
}
