//! App server service.

mod cmd;

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

pub use cmd::ServerCmdBuilder;

use crate::matcher::ReadinessMarker;
use crate::step::StepSpec;

/// Default port the app server listens on.
pub const DEFAULT_PORT: u16 = 5000;

/// Marker the server prints once it accepts connections.
///
/// Verbatim external contract with the server's startup log line.
pub const READY_MARKER: &str = "Server on port";

/// How long to wait for the server to come up. Package managers may
/// install or build before launching, so this is generous.
pub const STARTUP_TIMEOUT: Duration = Duration::from_secs(60);

/// Which tool launches the app server.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize, Default,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Runner {
    #[default]
    Npm,
    Yarn,
    Node,
}

/// Configuration for the app server process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Tool that launches the server.
    pub runner: Runner,
    /// Script name (for npm/yarn) or script path (for node).
    pub script: String,
    /// Port the server binds, exported via the PORT environment variable.
    pub port: u16,
    /// Extra arguments passed through to the runner.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_args: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            runner: Runner::Npm,
            script: "start".to_string(),
            port: DEFAULT_PORT,
            extra_args: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// The timed step that launches the server in `working_dir` and waits
    /// for its listening line.
    pub fn step(&self, working_dir: &Path) -> StepSpec {
        let builder = ServerCmdBuilder::new(self.runner, &self.script)
            .extra_args(self.extra_args.clone());

        StepSpec {
            label: "server".to_string(),
            program: builder.program(),
            args: builder.build(),
            current_dir: Some(working_dir.to_path_buf()),
            envs: vec![("PORT".to_string(), self.port.to_string())],
            readiness: Some(ReadinessMarker::substring(READY_MARKER)),
            timeout: STARTUP_TIMEOUT,
            settle_delay: Duration::ZERO,
        }
    }
}
