//! Data models and structures for the preflight

pub mod job;
pub mod outcome;

// Re-export main model types
pub use job::{Job, JobSpec};
pub use outcome::{ProbeOutcome, Verdict};
