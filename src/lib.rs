//! DNS cutover preflight
//!
//! Before pointing a hostname at a new address, send the same HTTP request
//! twice: once through normal resolution and once with the connection forced
//! to the new address. The cutover is safe when both answer with the same
//! status code (or, optionally, the new one answers with a lower code).

pub mod cli;
pub mod client;
pub mod comparison;
pub mod config;
pub mod dns;
pub mod equiv;
pub mod error;
pub mod executor;
pub mod logging;
pub mod models;
pub mod output;
pub mod server;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, Result};
pub use executor::{run_preflight, PreflightRunner};
pub use models::{Job, JobSpec, ProbeOutcome, Verdict};
pub use types::{ProbeKind, ResolvedAddress, RunState};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");

/// Version with build metadata, shown by `--version`
pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_COMMIT"),
    ", built ",
    env!("BUILD_TIME"),
    ")"
);

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
    pub const DEFAULT_METHOD: &str = "GET";
    pub const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:8080";
}
