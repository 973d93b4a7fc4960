//! Job files
//!
//! A job file holds one job in YAML or JSON with the same field names as a
//! server request body. YAML is tried first; JSON is the fallback.

use crate::error::{AppError, Result};
use crate::models::JobSpec;
use std::fs;
use std::path::Path;

/// Read a job from a YAML or JSON file
pub fn load_job_spec(path: &Path) -> Result<JobSpec> {
    let content = fs::read_to_string(path)
        .map_err(|e| AppError::io(format!("Failed to read config file {}: {}", path.display(), e)))?;

    parse_job_spec(&content)
        .map_err(|e| AppError::config(format!("Failed to parse config file {}: {}", path.display(), e)))
}

/// Parse a job document, YAML first and JSON second
pub fn parse_job_spec(content: &str) -> Result<JobSpec> {
    match serde_yaml::from_str::<JobSpec>(content) {
        Ok(spec) => Ok(spec),
        Err(yaml_error) => serde_json::from_str::<JobSpec>(content).map_err(|json_error| {
            AppError::parse(format!("not YAML ({}) nor JSON ({})", yaml_error, json_error))
        }),
    }
}
