//! The orchestrator: configuration root and the supervised pipeline run.

use std::path::PathBuf;

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::signal::unix::{SignalKind, signal};
use url::Url;

use alloy_core::primitives::Address;

use crate::artifact;
use crate::error::OrchestrateError;
use crate::patch::{self, NETWORK_ID_DECLARATION};
use crate::process::ProcessSet;
use crate::seed::{RpcContractClient, SeedPlan, run_seed};
use crate::services::{GanacheConfig, MigrateConfig, ServerConfig};
use crate::step::run_step;

/// The default name for the sprout configuration file.
pub const SPROUTCONF_FILENAME: &str = "Sprout.toml";

/// The phase a pipeline run is in, for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum PipelinePhase {
    Idle,
    NetworkStarting,
    Deploying,
    PatchingConfig,
    Seeding,
    ServerStarting,
    Running,
    Failed,
    Interrupted,
}

/// What the pipeline produced once everything is up.
#[derive(Debug, Clone)]
pub struct RunningEnv {
    /// The dev chain's RPC endpoint.
    pub rpc_url: Url,
    /// The freshly deployed contract.
    pub contract_address: Address,
    /// Network identifier discovered from the migration output.
    pub network_id: String,
}

/// Main orchestrator that boots the entire local dapp environment.
///
/// This struct contains all the configuration needed to run the pipeline and
/// can be serialized to/from TOML format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Orchestrator {
    /// Path to the application directory (truffle project + app server).
    pub app_dir: PathBuf,
    /// Name of the contract whose deployment artifact is consulted.
    pub contract_name: String,
    /// Path, relative to `app_dir`, of the config artifact that carries the
    /// network-id declaration.
    pub config_artifact: PathBuf,
    /// Locator regex for the network-id declaration; its single capture
    /// group spans the value slot.
    #[serde(default = "default_network_id_locator")]
    pub network_id_locator: String,
    /// Skip the data seeding phase.
    #[serde(default)]
    pub skip_seed: bool,

    /// Configuration for the dev chain.
    pub network: GanacheConfig,
    /// Configuration for the contract migration.
    pub migrate: MigrateConfig,
    /// Configuration for the app server.
    pub server: ServerConfig,
    /// Data seeded into the fresh deployment.
    pub seed: SeedPlan,
}

fn default_network_id_locator() -> String {
    NETWORK_ID_DECLARATION.to_string()
}

impl Orchestrator {
    /// A default pipeline rooted at `app_dir`.
    pub fn new(app_dir: PathBuf) -> Self {
        Self {
            app_dir,
            contract_name: "SupplyChain".to_string(),
            config_artifact: PathBuf::from("src/config.js"),
            network_id_locator: default_network_id_locator(),
            skip_seed: false,
            network: GanacheConfig::default(),
            migrate: MigrateConfig::default(),
            server: ServerConfig::default(),
            seed: SeedPlan::default(),
        }
    }

    /// Where the migration tool writes the contract's deployment artifact.
    pub fn artifact_path(&self) -> PathBuf {
        self.app_dir
            .join("build")
            .join("contracts")
            .join(format!("{}.json", self.contract_name))
    }

    /// Absolute path of the config artifact to patch.
    pub fn config_artifact_path(&self) -> PathBuf {
        self.app_dir.join(&self.config_artifact)
    }

    /// Save the configuration to a TOML file.
    pub fn save_to_file(&self, path: &PathBuf) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .context("Failed to serialize orchestrator config to TOML")?;
        std::fs::write(path, content)
            .context(format!("Failed to write config to {}", path.display()))?;
        tracing::info!(path = %path.display(), "Configuration saved");
        Ok(())
    }

    /// Load the configuration from a TOML file.
    pub fn load_from_file(path: &PathBuf) -> Result<Self> {
        if !path.exists() {
            return Err(anyhow::anyhow!(
                "Configuration file or directory not found: {}",
                path.display()
            ));
        }

        let config_path = if path.is_dir() {
            path.join(SPROUTCONF_FILENAME)
        } else {
            path.to_path_buf()
        };

        let content = std::fs::read_to_string(config_path)
            .context(format!("Failed to read config from {}", path.display()))?;
        let config: Self =
            toml::from_str(&content).context("Failed to parse config file as TOML")?;
        tracing::info!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    /// Save the orchestrator's configuration to the default location
    /// (Sprout.toml in the app directory).
    pub fn save_config(&self) -> Result<PathBuf> {
        let config_path = self.app_dir.join(SPROUTCONF_FILENAME);
        self.save_to_file(&config_path)?;
        Ok(config_path)
    }
}

/// Resolve on the first interrupt (SIGINT / Ctrl+C) or terminate (SIGTERM)
/// signal. Both request the same thing: tear down and exit cleanly.
async fn interrupted() -> Result<()> {
    let mut terminate = signal(SignalKind::terminate())
        .context("Failed to install terminate signal handler")?;

    tokio::select! {
        res = tokio::signal::ctrl_c() => res.context("Failed to listen for interrupt"),
        _ = terminate.recv() => Ok(()),
    }
}

impl Orchestrator {
    /// Run the whole pipeline under supervision.
    ///
    /// Blocks until interrupted once everything is up, then terminates every
    /// started process. The first failure anywhere also terminates them and
    /// ends the run with an error. An interrupt during startup lands on the
    /// select below and tears down whatever was already started.
    pub async fn run(self) -> Result<()> {
        tracing::info!(phase = %PipelinePhase::Idle, "Starting pipeline...");
        let mut procs = ProcessSet::new();

        let outcome = tokio::select! {
            res = self.run_pipeline(&mut procs) => res.map(Some),
            _ = interrupted() => {
                tracing::info!(phase = %PipelinePhase::Interrupted, "Interrupt received during startup");
                Ok(None)
            }
        };

        match outcome {
            Ok(Some(env)) => {
                tracing::info!(phase = %PipelinePhase::Running, "✓ Environment is up!");
                tracing::info!("");
                tracing::info!("=== Endpoints ===");
                tracing::info!("Chain RPC:        {}", env.rpc_url);
                tracing::info!("Contract address: {}", env.contract_address);
                tracing::info!("Network id:       {}", env.network_id);
                tracing::info!("App server:       http://127.0.0.1:{}/", self.server.port);
                tracing::info!("");
                tracing::info!("Press Ctrl+C to stop all processes and clean up.");

                interrupted().await?;
                procs.terminate_all();
                Ok(())
            }
            Ok(None) => {
                procs.terminate_all();
                Ok(())
            }
            Err(e) => {
                tracing::error!(phase = %PipelinePhase::Failed, error = %e, "Pipeline failed, tearing down");
                procs.terminate_all();
                Err(e.into())
            }
        }
    }

    /// The linear pipeline itself. Every started process is registered with
    /// `procs` so the caller can terminate them on any outcome.
    async fn run_pipeline(&self, procs: &mut ProcessSet) -> Result<RunningEnv, OrchestrateError> {
        tracing::info!(phase = %PipelinePhase::NetworkStarting, config = ?self.network, "Starting dev chain...");
        run_step(procs, self.network.step()).await?;
        let rpc_url = self.network.rpc_url()?;

        tracing::info!(phase = %PipelinePhase::Deploying, "Running contract migration...");
        let migration = run_step(procs, self.migrate.step(&self.app_dir)).await?;
        let (mut contract_address, network_id) =
            MigrateConfig::extract_deployment(&migration.output)?;
        tracing::info!(%contract_address, %network_id, "Migration complete");

        tracing::info!(phase = %PipelinePhase::PatchingConfig, "Patching config artifact...");
        let locator = Regex::new(&self.network_id_locator)
            .context("Invalid network-id locator pattern")?;
        patch::patch_declaration(&self.config_artifact_path(), &locator, &network_id)?;

        if self.skip_seed {
            tracing::info!("Seeding skipped by configuration");
        } else {
            tracing::info!(phase = %PipelinePhase::Seeding, "Seeding contract data...");
            // The artifact is authoritative: the address scanned from the
            // migration output may belong to a different contract in a
            // multi-contract project.
            let deployed = artifact::deployed_address(&self.artifact_path(), &network_id)?;
            if deployed != contract_address {
                tracing::warn!(
                    from_output = %contract_address,
                    from_artifact = %deployed,
                    "Contract address mismatch, using the artifact's"
                );
                contract_address = deployed;
            }

            let client = RpcContractClient::connect(&rpc_url, contract_address).await?;
            let submitted = run_seed(&client, &self.seed, client.sender()).await?;
            tracing::info!(submitted, "Seeding complete");
        }

        tracing::info!(phase = %PipelinePhase::ServerStarting, config = ?self.server, "Starting app server...");
        run_step(procs, self.server.step(&self.app_dir)).await?;

        Ok(RunningEnv {
            rpc_url,
            contract_address,
            network_id,
        })
    }
}
