//! sprout-orchestrate - supervised bootstrap of a local dapp environment.
//!
//! This crate drives the pipeline {dev chain -> contract migration -> config
//! patch -> data seeding -> app server} as one supervised run: each step
//! spawns an external process, watches its output for a readiness or
//! completion marker, and the first failure tears down every process started
//! so far.

mod artifact;
mod error;
mod matcher;
mod patch;
mod pipeline;
mod process;
pub mod rpc;
mod seed;
pub mod services;
mod step;

pub use artifact::{DeploymentArtifact, NetworkDeployment, deployed_address};
pub use error::OrchestrateError;
pub use matcher::{OutputMatcher, ReadinessMarker, scan_text};
pub use patch::{NETWORK_ID_DECLARATION, patch_declaration};
pub use pipeline::{Orchestrator, PipelinePhase, RunningEnv, SPROUTCONF_FILENAME};
pub use process::{ManagedProcess, ProcessSet};
pub use seed::{
    ContractClient, ProduceRecord, RpcContractClient, SeedCall, SeedPlan, run_seed,
};
pub use services::{GanacheConfig, MigrateConfig, Runner, ServerConfig};
pub use step::{StepOutput, StepSpec, run_step};
