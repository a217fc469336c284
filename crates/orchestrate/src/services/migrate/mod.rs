//! Contract migration (truffle) one-shot service.

mod cmd;

use std::path::Path;
use std::time::Duration;

use alloy_core::primitives::Address;
use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

pub use cmd::MigrateCmdBuilder;

use crate::step::StepSpec;

/// Pattern yielding the deployed contract address from migration output.
///
/// Verbatim external contract with the migration tool's output format; see
/// the compatibility test below.
pub const CONTRACT_ADDRESS_PATTERN: &str = r"contract address:\s*(0x[0-9a-fA-F]{40})";

/// Pattern yielding the network identifier from migration output.
pub const NETWORK_ID_PATTERN: &str = r"Network id:\s*(\d+)";

/// How long one migration run may take before the step fails.
pub const MIGRATE_TIMEOUT: Duration = Duration::from_secs(180);

/// Configuration for the migration tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrateConfig {
    /// Executable name.
    pub program: String,
    /// Network name passed to the migration tool.
    pub network: String,
    /// Redeploy all contracts from scratch.
    pub reset: bool,
}

impl Default for MigrateConfig {
    fn default() -> Self {
        Self {
            program: "truffle".to_string(),
            network: "development".to_string(),
            reset: true,
        }
    }
}

impl MigrateConfig {
    /// The one-shot step running the migration in `working_dir`.
    ///
    /// No readiness marker: the tool's output is not final until it exits,
    /// so the address and network id are extracted at close time from the
    /// full accumulated output.
    pub fn step(&self, working_dir: &Path) -> StepSpec {
        let args = MigrateCmdBuilder::new(&self.network).reset(self.reset).build();

        StepSpec {
            label: "truffle-migrate".to_string(),
            program: self.program.clone(),
            args,
            current_dir: Some(working_dir.to_path_buf()),
            envs: Vec::new(),
            readiness: None,
            timeout: MIGRATE_TIMEOUT,
            settle_delay: Duration::ZERO,
        }
    }

    /// Scan a complete migration output for the deployed address and the
    /// network identifier.
    ///
    /// The migration tool deploys its own bookkeeping contract before the
    /// application contract, so the output carries several address lines;
    /// the application contract is the last deployment.
    pub fn extract_deployment(output: &str) -> Result<(Address, String)> {
        let address_re =
            Regex::new(CONTRACT_ADDRESS_PATTERN).context("Invalid contract address pattern")?;
        let id_re = Regex::new(NETWORK_ID_PATTERN).context("Invalid network id pattern")?;

        let address = address_re
            .captures_iter(output)
            .last()
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .context("Migration output contains no contract address")?;
        let network_id = id_re
            .captures(output)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .context("Migration output contains no network id")?;

        let address = address
            .parse::<Address>()
            .context("Invalid contract address in migration output")?;

        Ok((address, network_id))
    }
}
