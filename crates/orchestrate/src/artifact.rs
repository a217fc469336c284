//! Deployment artifacts produced by the migration tool.

use std::collections::HashMap;
use std::path::Path;

use alloy_core::primitives::Address;
use serde::Deserialize;

use crate::error::OrchestrateError;

/// A contract deployment artifact: the interface description plus one
/// deployment record per network identifier. Read-only to the orchestrator.
#[derive(Debug, Clone, Deserialize)]
pub struct DeploymentArtifact {
    #[serde(rename = "contractName")]
    pub contract_name: String,
    /// Interface description, opaque to the orchestrator.
    #[serde(default)]
    pub abi: serde_json::Value,
    /// Deployment records keyed by network identifier.
    #[serde(default)]
    pub networks: HashMap<String, NetworkDeployment>,
}

/// One network's deployment record.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkDeployment {
    pub address: Address,
    #[serde(rename = "transactionHash", default)]
    pub transaction_hash: Option<String>,
}

impl DeploymentArtifact {
    /// The deployed address on `network_id`, if any.
    pub fn address_on(&self, network_id: &str) -> Option<Address> {
        self.networks.get(network_id).map(|n| n.address)
    }
}

/// Load the artifact at `path` and resolve the address deployed on
/// `network_id`.
///
/// A missing or unparseable artifact and an absent network entry are the
/// same failure from the pipeline's point of view: there is no recorded
/// deployment to seed against.
pub fn deployed_address(path: &Path, network_id: &str) -> Result<Address, OrchestrateError> {
    let missing = || OrchestrateError::DeploymentArtifactMissing {
        network_id: network_id.to_string(),
        path: path.to_path_buf(),
    };

    let contents = std::fs::read_to_string(path).map_err(|e| {
        tracing::warn!(path = %path.display(), error = %e, "Failed to read deployment artifact");
        missing()
    })?;
    let artifact: DeploymentArtifact = serde_json::from_str(&contents).map_err(|e| {
        tracing::warn!(path = %path.display(), error = %e, "Failed to parse deployment artifact");
        missing()
    })?;

    artifact.address_on(network_id).ok_or_else(missing)
}
