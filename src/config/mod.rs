//! Configuration management module

pub mod env;
pub mod file;
pub mod parser;

// Re-export main functionality
pub use env::EnvManager;
pub use file::{load_job_spec, parse_job_spec};
pub use parser::{load_job, parse_headers, ConfigParser};
