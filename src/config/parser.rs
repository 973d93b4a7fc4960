//! Job construction from CLI arguments and job files

use crate::{
    cli::Cli,
    config::file::load_job_spec,
    error::{AppError, Result},
    models::JobSpec,
};
use std::collections::BTreeMap;

/// Builds the job for a single run from parsed arguments
pub struct ConfigParser {
    cli: Cli,
}

impl ConfigParser {
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Job from flags, or from `--config` when given.
    ///
    /// A job file replaces the flag-built job entirely.
    pub fn job_spec(&self) -> Result<JobSpec> {
        if let Some(path) = &self.cli.config {
            return load_job_spec(path);
        }
        self.spec_from_flags()
    }

    fn spec_from_flags(&self) -> Result<JobSpec> {
        let cli = &self.cli;
        let headers = match &cli.headers {
            Some(raw) => parse_headers(raw)?,
            None => BTreeMap::new(),
        };

        Ok(JobSpec {
            endpoint: cli.endpoint.clone().unwrap_or_default(),
            headers,
            body: cli.body.clone().unwrap_or_default(),
            method: cli.method.clone(),
            new: cli.new.clone().unwrap_or_default(),
            timeout: Some(cli.timeout),
            lower_is_better: cli.lib,
            equiv: cli.equiv,
        })
    }
}

/// Parse `key=value,key=value`. Values may contain `=`; empty entries are skipped.
pub fn parse_headers(raw: &str) -> Result<BTreeMap<String, String>> {
    let mut headers = BTreeMap::new();
    for entry in raw.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
        let (name, value) = entry
            .split_once('=')
            .ok_or_else(|| AppError::validation(format!("invalid header '{}': expected key=value", entry)))?;
        headers.insert(name.trim().to_string(), value.to_string());
    }
    Ok(headers)
}

/// Load the job for a single run
pub fn load_job(cli: Cli) -> Result<JobSpec> {
    ConfigParser::new(cli).job_spec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_headers() {
        let headers = parse_headers("Accept=application/json, X-Sig=a=b=c").unwrap();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers["Accept"], "application/json");
        assert_eq!(headers["X-Sig"], "a=b=c");

        assert!(parse_headers("").unwrap().is_empty());
        assert_eq!(parse_headers("A=1,").unwrap().len(), 1);
    }

    #[test]
    fn test_parse_headers_rejects_entry_without_equals() {
        let error = parse_headers("Accept=application/json,broken").unwrap_err();
        assert!(matches!(error, AppError::Validation(_)));
        assert!(error.to_string().contains("broken"));
    }

    #[test]
    fn test_spec_from_flags() {
        let cli = Cli::parse_from([
            "preflight-dns",
            "--endpoint", "https://app.example.com",
            "--new", "203.0.113.5",
            "--headers", "X-Api-Key=secret",
            "--timeout", "3s",
            "--lib",
        ]);

        let spec = load_job(cli).unwrap();
        assert_eq!(spec.endpoint, "https://app.example.com");
        assert_eq!(spec.new, "203.0.113.5");
        assert_eq!(spec.method, "GET");
        assert_eq!(spec.headers["X-Api-Key"], "secret");
        assert_eq!(spec.timeout, Some(Duration::from_secs(3)));
        assert!(spec.lower_is_better);
        assert!(spec.body.is_empty());
    }

    #[test]
    fn test_config_file_replaces_flags() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "endpoint: https://from-file.example.com\nnew: localhost").unwrap();

        let cli = Cli::parse_from([
            "preflight-dns",
            "--endpoint", "https://from-flags.example.com",
            "--lib",
            "--config", file.path().to_str().unwrap(),
        ]);

        let spec = load_job(cli).unwrap();
        assert_eq!(spec.endpoint, "https://from-file.example.com");
        assert_eq!(spec.new, "localhost");
        assert!(!spec.lower_is_better);
    }
}
