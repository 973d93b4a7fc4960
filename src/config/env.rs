//! Environment variable handling and .env file management

use crate::error::{AppError, Result};
use crate::logging::{LogFormat, LogLevel};
use crate::models::job::parse_duration;
use std::path::Path;
use std::str::FromStr;

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load `.env` from the working directory if it exists.
    ///
    /// Returns whether a file was loaded. Variables already set in the
    /// environment are not overridden.
    pub fn load_env_file() -> Result<bool> {
        Self::load_env_file_from(Path::new(".env"))
    }

    /// Load a specific env file if it exists
    pub fn load_env_file_from(path: &Path) -> Result<bool> {
        if !path.exists() {
            return Ok(false);
        }
        dotenv::from_path(path)
            .map_err(|e| AppError::config(format!("Failed to load {}: {}", path.display(), e)))?;
        Ok(true)
    }

    /// Validate environment variable format before parsing
    pub fn validate_env_var(key: &str, value: &str) -> Result<()> {
        match key {
            "PREFLIGHT_ENDPOINT" => {
                url::Url::parse(value)
                    .map_err(|e| AppError::config(format!("Invalid PREFLIGHT_ENDPOINT value '{}': {}", value, e)))?;
            }
            "PREFLIGHT_TIMEOUT" => {
                parse_duration(value)
                    .map_err(|e| AppError::config(format!("Invalid PREFLIGHT_TIMEOUT value '{}': {}", value, e)))?;
            }
            "PREFLIGHT_HEADERS" => {
                crate::config::parser::parse_headers(value)
                    .map_err(|e| AppError::config(format!("Invalid PREFLIGHT_HEADERS value: {}", e)))?;
            }
            "LOG_LEVEL" => {
                LogLevel::from_str(value)
                    .map_err(|e| AppError::config(format!("Invalid LOG_LEVEL value '{}': {}", value, e)))?;
            }
            "PREFLIGHT_LOG_FORMAT" => {
                LogFormat::from_str(value)
                    .map_err(|e| AppError::config(format!("Invalid PREFLIGHT_LOG_FORMAT value '{}': {}", value, e)))?;
            }
            _ => {}
        }

        Ok(())
    }

    /// Supported environment variables with descriptions and examples
    pub fn get_supported_env_vars() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("PREFLIGHT_ENDPOINT", "Endpoint URL to check", "https://app.example.com/health"),
            ("PREFLIGHT_NEW", "New hostname or IP", "new-lb.example.net"),
            ("PREFLIGHT_METHOD", "HTTP method", "GET"),
            ("PREFLIGHT_BODY", "Request body", "{\"ping\":true}"),
            ("PREFLIGHT_HEADERS", "Comma-separated key=value headers", "Accept=application/json"),
            ("PREFLIGHT_TIMEOUT", "Request timeout", "5s"),
            ("PREFLIGHT_CONFIG", "YAML or JSON job file", "preflight.yaml"),
            ("PREFLIGHT_SERVER_ADDR", "Server listen address", "0.0.0.0:8080"),
            ("PREFLIGHT_LOG_FORMAT", "Log format", "json"),
            ("LOG_LEVEL", "Log level", "debug"),
        ]
    }

    /// Validate all currently set environment variables
    pub fn validate_current_env() -> Vec<String> {
        Self::get_supported_env_vars()
            .into_iter()
            .filter_map(|(name, _, _)| std::env::var(name).ok().map(|value| (name, value)))
            .filter_map(|(name, value)| Self::validate_env_var(name, &value).err())
            .map(|e| format!("Warning: {}", e))
            .collect()
    }
}
