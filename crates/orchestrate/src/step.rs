//! Timed process steps: spawn, observe output, race match against exit and
//! timeout.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

use crate::error::OrchestrateError;
use crate::matcher::{OutputMatcher, ReadinessMarker};
use crate::process::ProcessSet;

/// Specification of one pipeline step's external process.
#[derive(Debug)]
pub struct StepSpec {
    /// Label used for logging, registration, and error reporting.
    pub label: String,
    /// Executable name.
    pub program: String,
    /// Argument vector.
    pub args: Vec<String>,
    /// Working directory, when different from the orchestrator's.
    pub current_dir: Option<PathBuf>,
    /// Extra environment variables.
    pub envs: Vec<(String, String)>,
    /// Marker that signals readiness. `None` makes the step a one-shot
    /// command whose success is exit code zero; values are then extracted
    /// from the accumulated output at close time.
    pub readiness: Option<ReadinessMarker>,
    /// How long to wait for readiness (or, for one-shot steps, for exit).
    pub timeout: Duration,
    /// Extra wait after the marker, for services that report ready slightly
    /// before they accept connections.
    pub settle_delay: Duration,
}

/// What a completed step produced for downstream consumption.
#[derive(Debug)]
pub struct StepOutput {
    /// Capture groups of the readiness pattern, empty for substring markers
    /// and one-shot steps.
    pub captures: Vec<String>,
    /// Accumulated stdout+stderr. For one-shot steps this is the complete
    /// output of the process.
    pub output: String,
}

/// Spawn the step's process and drive it to its single outcome.
///
/// The process is registered with `procs` immediately after spawn, before
/// any await, so a later failure can still terminate it. On
/// `StartupTimeout` the process is deliberately left registered and
/// running; termination is the supervisor's job, not this step's.
pub async fn run_step(
    procs: &mut ProcessSet,
    spec: StepSpec,
) -> Result<StepOutput, OrchestrateError> {
    tracing::info!(
        label = %spec.label,
        program = %spec.program,
        args = ?spec.args,
        "Starting step"
    );

    let mut cmd = Command::new(&spec.program);
    cmd.args(&spec.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = &spec.current_dir {
        cmd.current_dir(dir);
    }
    for (key, value) in &spec.envs {
        cmd.env(key, value);
    }

    let mut child = cmd.spawn().map_err(|source| OrchestrateError::SpawnFailed {
        label: spec.label.clone(),
        source,
    })?;

    if let Some(pid) = child.id() {
        procs.register(&spec.label, pid);
    }

    // Line pumps for both streams. They keep draining until EOF even after
    // the step resolves, so a long-running child never blocks on a full
    // pipe.
    let (tx, rx) = mpsc::unbounded_channel();
    if let Some(stdout) = child.stdout.take() {
        spawn_pump(spec.label.clone(), "stdout", stdout, tx.clone());
    }
    if let Some(stderr) = child.stderr.take() {
        spawn_pump(spec.label.clone(), "stderr", stderr, tx);
    }

    match spec.readiness.clone() {
        Some(marker) => await_readiness(child, &spec, marker, rx).await,
        None => await_exit(child, &spec, rx).await,
    }
}

/// Forward one output stream line-by-line into the step's channel.
fn spawn_pump(
    label: String,
    stream: &'static str,
    reader: impl AsyncRead + Unpin + Send + 'static,
    tx: mpsc::UnboundedSender<String>,
) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            tracing::debug!(label = %label, stream, "{line}");
            // The receiver may be gone once the step has resolved.
            let _ = tx.send(line);
        }
    });
}

/// Race {marker match, process close, timeout} to the step's single
/// outcome. Whichever fires first wins; the losing branches are disarmed by
/// leaving the race, so a deferred timeout can never fire after success.
async fn await_readiness(
    mut child: Child,
    spec: &StepSpec,
    marker: ReadinessMarker,
    mut rx: mpsc::UnboundedReceiver<String>,
) -> Result<StepOutput, OrchestrateError> {
    let mut matcher = OutputMatcher::new(marker);
    let deadline = tokio::time::sleep(spec.timeout);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            line = rx.recv() => match line {
                Some(line) => {
                    // Restore the newline the line reader stripped so a
                    // marker can never be assembled across two lines.
                    let chunk = format!("{line}\n");
                    if let Some(captures) = matcher.feed(&chunk) {
                        tracing::debug!(label = %spec.label, "Readiness marker matched");
                        tokio::time::sleep(spec.settle_delay).await;
                        tracing::info!(label = %spec.label, "Step ready");
                        // The child keeps running; reap it whenever it
                        // eventually exits.
                        tokio::spawn(async move {
                            let _ = child.wait().await;
                        });
                        return Ok(StepOutput {
                            captures,
                            output: matcher.into_buffer(),
                        });
                    }
                }
                // Both pumps hit EOF: the process closed its output without
                // ever emitting the marker. All output was delivered before
                // the channel closed, so this cannot race a late match.
                None => {
                    let code = child.wait().await.ok().and_then(|status| status.code());
                    return Err(OrchestrateError::ProcessExitedEarly {
                        label: spec.label.clone(),
                        code,
                    });
                }
            },
            () = &mut deadline => {
                return Err(OrchestrateError::StartupTimeout {
                    label: spec.label.clone(),
                    timeout: spec.timeout,
                });
            }
        }
    }
}

/// One-shot mode: wait for the process to close, requiring exit code zero.
/// The accumulated output is only considered final at close time.
async fn await_exit(
    mut child: Child,
    spec: &StepSpec,
    mut rx: mpsc::UnboundedReceiver<String>,
) -> Result<StepOutput, OrchestrateError> {
    let collect = async {
        let mut output = String::new();
        while let Some(line) = rx.recv().await {
            output.push_str(&line);
            output.push('\n');
        }
        (child.wait().await, output)
    };

    match tokio::time::timeout(spec.timeout, collect).await {
        Err(_) => Err(OrchestrateError::StartupTimeout {
            label: spec.label.clone(),
            timeout: spec.timeout,
        }),
        Ok((Ok(status), output)) if status.success() => {
            tracing::info!(label = %spec.label, "Step completed");
            Ok(StepOutput {
                captures: Vec::new(),
                output,
            })
        }
        Ok((Ok(status), _)) => Err(OrchestrateError::ProcessExitedEarly {
            label: spec.label.clone(),
            code: status.code(),
        }),
        Ok((Err(e), _)) => {
            tracing::warn!(label = %spec.label, error = %e, "Failed to collect exit status");
            Err(OrchestrateError::ProcessExitedEarly {
                label: spec.label.clone(),
                code: None,
            })
        }
    }
}
