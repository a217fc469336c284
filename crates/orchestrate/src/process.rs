//! Registry of processes owned by a pipeline run.

use derive_more::Deref;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;

/// One OS process started by a pipeline step.
#[derive(Debug)]
pub struct ManagedProcess {
    /// Human-readable label, e.g. "ganache" or "app-server".
    pub label: String,
    /// OS process id recorded at spawn time.
    pub pid: u32,
}

/// Insertion-ordered set of the processes started by the current run.
///
/// Owned by the supervisor and passed explicitly to the teardown routine;
/// only the supervisor's single control flow mutates it. Steps register a
/// process immediately after spawn, before awaiting any of its output, so a
/// later failure can always reach it.
#[derive(Debug, Default, Deref)]
pub struct ProcessSet {
    #[deref]
    entries: Vec<ManagedProcess>,
    torn_down: bool,
}

impl ProcessSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a spawned process.
    pub fn register(&mut self, label: impl Into<String>, pid: u32) {
        let label = label.into();
        tracing::debug!(%label, pid, "Registered process");
        self.entries.push(ManagedProcess { label, pid });
    }

    /// Terminate every registered process, in registration order.
    ///
    /// Sends SIGTERM only, so tools get a chance to shut down gracefully.
    /// Already-exited processes are a no-op. Idempotent: the second
    /// invocation finds the set drained and returns immediately.
    pub fn terminate_all(&mut self) {
        if self.torn_down {
            tracing::debug!("Teardown already ran, nothing to do");
            return;
        }
        self.torn_down = true;

        if self.entries.is_empty() {
            tracing::debug!("No processes to terminate");
            return;
        }

        tracing::info!("Terminating {} process(es)...", self.entries.len());
        for entry in self.entries.drain(..) {
            match signal::kill(Pid::from_raw(entry.pid as i32), Signal::SIGTERM) {
                Ok(()) => {
                    tracing::info!(label = %entry.label, pid = entry.pid, "Sent SIGTERM");
                }
                Err(nix::errno::Errno::ESRCH) => {
                    tracing::debug!(label = %entry.label, pid = entry.pid, "Already exited");
                }
                Err(e) => {
                    tracing::warn!(label = %entry.label, pid = entry.pid, error = %e, "Failed to signal process");
                }
            }
        }
    }

    /// Whether teardown has already run.
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}
