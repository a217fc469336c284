//! Dev chain (ganache) service.

mod cmd;

use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use url::Url;

pub use cmd::GanacheCmdBuilder;

use crate::matcher::ReadinessMarker;
use crate::step::StepSpec;

/// Default RPC port for the dev chain.
pub const DEFAULT_PORT: u16 = 7545;

/// Marker the chain prints once its RPC endpoint is up.
///
/// Verbatim external contract with the chain binary's output format; see
/// the compatibility test below.
pub const READY_MARKER: &str = "Listening on";

/// How long to wait for the chain to come up.
pub const STARTUP_TIMEOUT: Duration = Duration::from_secs(30);

/// The chain reports readiness slightly before it serves requests.
pub const SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Configuration for the dev chain process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GanacheConfig {
    /// Executable name.
    pub program: String,
    /// Host address to bind.
    pub host: String,
    /// RPC port.
    pub port: u16,
    /// Fixed network id. When unset the chain picks its own and the
    /// deployment step discovers it from the migration output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_id: Option<u64>,
    /// Deterministic account generation.
    pub deterministic: bool,
    /// Extra arguments passed through to the chain.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_args: Vec<String>,
}

impl Default for GanacheConfig {
    fn default() -> Self {
        Self {
            program: "ganache-cli".to_string(),
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            network_id: None,
            deterministic: true,
            extra_args: Vec::new(),
        }
    }
}

impl GanacheConfig {
    /// The RPC URL the rest of the pipeline talks to.
    pub fn rpc_url(&self) -> anyhow::Result<Url> {
        Url::parse(&format!("http://{}:{}/", self.host, self.port))
            .context("Failed to parse dev chain RPC URL")
    }

    /// The timed step that launches the chain and waits for readiness.
    pub fn step(&self) -> StepSpec {
        let args = GanacheCmdBuilder::new(self.port)
            .host(&self.host)
            .network_id(self.network_id)
            .deterministic(self.deterministic)
            .extra_args(self.extra_args.clone())
            .build();

        StepSpec {
            label: "ganache".to_string(),
            program: self.program.clone(),
            args,
            current_dir: None,
            envs: Vec::new(),
            readiness: Some(ReadinessMarker::substring(READY_MARKER)),
            timeout: STARTUP_TIMEOUT,
            settle_delay: SETTLE_DELAY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::scan_text;

    /// Captured tail of real ganache-cli startup output.
    const REAL_OUTPUT: &str = "\
Gas Limit\n\
==================\n\
6721975\n\
\n\
Listening on 127.0.0.1:7545\n";

    #[test]
    fn test_ready_marker_matches_real_output() {
        let marker = ReadinessMarker::substring(READY_MARKER);
        assert_eq!(scan_text(&marker, REAL_OUTPUT), Some(vec![]));
    }

    #[test]
    fn test_rpc_url() {
        let config = GanacheConfig::default();
        assert_eq!(config.rpc_url().unwrap().as_str(), "http://127.0.0.1:7545/");
    }

    #[test]
    fn test_step_spec() {
        let step = GanacheConfig::default().step();
        assert_eq!(step.label, "ganache");
        assert_eq!(step.program, "ganache-cli");
        assert!(step.readiness.is_some());
        assert_eq!(step.settle_delay, SETTLE_DELAY);
    }
}
