//! Per-tool service configurations and command builders.

pub mod ganache;
pub mod migrate;
pub mod server;

pub use ganache::GanacheConfig;
pub use migrate::MigrateConfig;
pub use server::{Runner, ServerConfig};
