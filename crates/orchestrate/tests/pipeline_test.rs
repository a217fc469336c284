//! Integration tests for sprout-orchestrate's step runner.
//!
//! These tests drive `run_step` against real child processes (`sh -c`
//! scripts), exercising readiness matching, early-exit detection, timeouts
//! and teardown end to end.
//! Run with: cargo test --test pipeline_test

use std::time::Duration;

use sprout_orchestrate::{
    MigrateConfig, OrchestrateError, ProcessSet, ReadinessMarker, StepSpec, run_step,
};

// Timeout constants
const READY_TIMEOUT: Duration = Duration::from_secs(10);
const SHORT_TIMEOUT: Duration = Duration::from_millis(300);

/// A step running `script` under `sh -c`.
fn sh_step(label: &str, script: &str, readiness: Option<ReadinessMarker>) -> StepSpec {
    StepSpec {
        label: label.to_string(),
        program: "sh".to_string(),
        args: vec!["-c".to_string(), script.to_string()],
        current_dir: None,
        envs: Vec::new(),
        readiness,
        timeout: READY_TIMEOUT,
        settle_delay: Duration::ZERO,
    }
}

#[tokio::test]
async fn test_readiness_marker_resolves_while_process_runs() {
    let mut procs = ProcessSet::new();
    let step = sh_step(
        "chain",
        r#"echo "Listening on 127.0.0.1:7545"; sleep 5"#,
        Some(ReadinessMarker::substring("Listening on")),
    );

    let out = run_step(&mut procs, step).await.unwrap();
    assert!(out.output.contains("Listening on"));
    assert_eq!(procs.len(), 1);

    procs.terminate_all();
}

#[tokio::test]
async fn test_pattern_marker_yields_captures() {
    let mut procs = ProcessSet::new();
    let step = sh_step(
        "chain",
        r#"echo "Network id: 5777"; sleep 5"#,
        Some(ReadinessMarker::pattern(r"Network id:\s*(\d+)").unwrap()),
    );

    let out = run_step(&mut procs, step).await.unwrap();
    assert_eq!(out.captures, vec!["5777".to_string()]);

    procs.terminate_all();
}

#[tokio::test]
async fn test_clean_exit_without_marker_is_early_exit() {
    let mut procs = ProcessSet::new();
    let step = sh_step(
        "chain",
        r#"echo "starting up"; exit 0"#,
        Some(ReadinessMarker::substring("Listening on")),
    );

    let err = run_step(&mut procs, step).await.unwrap_err();
    // Exit code 0 without the marker is still a startup failure.
    assert!(matches!(
        err,
        OrchestrateError::ProcessExitedEarly { code: Some(0), .. }
    ));

    procs.terminate_all();
}

#[tokio::test]
async fn test_nonzero_exit_reports_code() {
    let mut procs = ProcessSet::new();
    let step = sh_step(
        "chain",
        "exit 3",
        Some(ReadinessMarker::substring("Listening on")),
    );

    let err = run_step(&mut procs, step).await.unwrap_err();
    assert!(matches!(
        err,
        OrchestrateError::ProcessExitedEarly { code: Some(3), .. }
    ));

    procs.terminate_all();
}

#[tokio::test]
async fn test_silent_process_times_out_and_stays_registered() {
    let mut procs = ProcessSet::new();
    let mut step = sh_step(
        "chain",
        "sleep 5",
        Some(ReadinessMarker::substring("Listening on")),
    );
    step.timeout = SHORT_TIMEOUT;

    let err = run_step(&mut procs, step).await.unwrap_err();
    assert!(matches!(err, OrchestrateError::StartupTimeout { .. }));
    // The process is left for the supervisor to terminate.
    assert_eq!(procs.len(), 1);

    procs.terminate_all();
}

#[tokio::test]
async fn test_one_shot_step_collects_full_output() {
    let mut procs = ProcessSet::new();
    let step = sh_step(
        "migrate",
        concat!(
            r#"echo "> Network id:      5777"; "#,
            r#"echo "   > contract address:    0xABCDEF0123456789ABCDEF0123456789ABCDEF01"; "#,
            r#"echo "Summary""#,
        ),
        None,
    );

    let out = run_step(&mut procs, step).await.unwrap();
    assert!(out.output.contains("Summary"));

    let (address, network_id) = MigrateConfig::extract_deployment(&out.output).unwrap();
    assert_eq!(network_id, "5777");
    assert_eq!(
        address.to_string().to_lowercase(),
        "0xabcdef0123456789abcdef0123456789abcdef01"
    );

    procs.terminate_all();
}

#[tokio::test]
async fn test_one_shot_step_rejects_nonzero_exit() {
    let mut procs = ProcessSet::new();
    let step = sh_step("migrate", r#"echo "Error: revert"; exit 1"#, None);

    let err = run_step(&mut procs, step).await.unwrap_err();
    assert!(matches!(
        err,
        OrchestrateError::ProcessExitedEarly { code: Some(1), .. }
    ));

    procs.terminate_all();
}

#[tokio::test]
async fn test_marker_split_across_writes() {
    let mut procs = ProcessSet::new();
    // Two unbuffered writes on one line: the marker only exists once the
    // chunks are accumulated.
    let step = sh_step(
        "chain",
        r#"printf "Listening "; sleep 0.1; printf "on 127.0.0.1:7545\n"; sleep 5"#,
        Some(ReadinessMarker::substring("Listening on")),
    );

    let out = run_step(&mut procs, step).await.unwrap();
    assert!(out.output.contains("Listening on"));

    procs.terminate_all();
}

#[tokio::test]
async fn test_stderr_is_observed_for_readiness() {
    let mut procs = ProcessSet::new();
    let step = sh_step(
        "server",
        r#"echo "Server on port 5000" >&2; sleep 5"#,
        Some(ReadinessMarker::substring("Server on port")),
    );

    let out = run_step(&mut procs, step).await.unwrap();
    assert!(out.output.contains("Server on port"));

    procs.terminate_all();
}

#[tokio::test]
async fn test_teardown_is_idempotent_after_run() {
    let mut procs = ProcessSet::new();
    let step = sh_step(
        "chain",
        r#"echo "Listening on"; sleep 30"#,
        Some(ReadinessMarker::substring("Listening on")),
    );
    run_step(&mut procs, step).await.unwrap();

    procs.terminate_all();
    assert!(procs.is_torn_down());
    assert!(procs.is_empty());

    // A second teardown finds nothing to do.
    procs.terminate_all();
    assert!(procs.is_empty());
}

#[tokio::test]
async fn test_settle_delay_elapses_before_ready() {
    let mut procs = ProcessSet::new();
    let mut step = sh_step(
        "chain",
        r#"echo "Listening on"; sleep 5"#,
        Some(ReadinessMarker::substring("Listening on")),
    );
    step.settle_delay = Duration::from_millis(200);

    let started = std::time::Instant::now();
    run_step(&mut procs, step).await.unwrap();
    assert!(started.elapsed() >= Duration::from_millis(200));

    procs.terminate_all();
}

#[tokio::test]
async fn test_spawn_failure_for_missing_program() {
    let mut procs = ProcessSet::new();
    let step = StepSpec {
        label: "ghost".to_string(),
        program: "definitely-not-a-real-program-sprout".to_string(),
        args: Vec::new(),
        current_dir: None,
        envs: Vec::new(),
        readiness: None,
        timeout: READY_TIMEOUT,
        settle_delay: Duration::ZERO,
    };

    let err = run_step(&mut procs, step).await.unwrap_err();
    assert!(matches!(err, OrchestrateError::SpawnFailed { .. }));
    // Nothing spawned, nothing registered.
    assert!(procs.is_empty());

    procs.terminate_all();
}
