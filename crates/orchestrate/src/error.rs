//! Error kinds surfaced by pipeline steps.

use std::path::PathBuf;
use std::time::Duration;

/// Errors produced by pipeline steps.
///
/// None of these are retried. Every error propagates verbatim to the
/// supervisor, which logs the reason, terminates all registered processes,
/// and ends the run with a nonzero status.
#[derive(Debug, thiserror::Error)]
pub enum OrchestrateError {
    /// The step's executable could not be spawned at all.
    #[error("failed to spawn {label}: {source}")]
    SpawnFailed {
        label: String,
        #[source]
        source: std::io::Error,
    },

    /// The process exited before emitting its readiness marker, or a
    /// one-shot command exited with a nonzero code.
    ///
    /// A clean exit (code 0) without the marker is still this error: a
    /// service that quits instead of listening has failed to start.
    #[error("{label} exited early (exit code {code:?}) before completing startup")]
    ProcessExitedEarly { label: String, code: Option<i32> },

    /// No readiness marker appeared within the configured timeout. The
    /// process is left registered and running; terminating it is the
    /// supervisor's responsibility.
    #[error("{label} did not become ready within {timeout:?}")]
    StartupTimeout { label: String, timeout: Duration },

    /// The configuration artifact could not be read or written back.
    #[error("config artifact {path:?} is unreadable: {reason}")]
    ConfigArtifactUnreadable { path: PathBuf, reason: String },

    /// The declaration the patcher looks for is absent from the artifact.
    /// Fatal rather than a silent no-op: a downstream process would start
    /// with a stale network id.
    #[error("declaration `{pattern}` not found in {path:?}")]
    ConfigPatternNotFound { path: PathBuf, pattern: String },

    /// The deployment artifact has no recorded deployment for the
    /// discovered network identifier.
    #[error("no deployment recorded for network id {network_id} in {path:?}")]
    DeploymentArtifactMissing { network_id: String, path: PathBuf },

    /// A seeding call was rejected by the network. Remaining calls are not
    /// attempted.
    #[error("call {call} rejected: {reason}")]
    CallRejected { call: String, reason: String },

    /// Transport-level RPC failure (connection refused, malformed response).
    #[error(transparent)]
    Rpc(#[from] anyhow::Error),
}
