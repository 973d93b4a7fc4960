//! Command-line interface

use crate::{
    logging::{LogFormat, LogLevel, LogSettings},
    models::job::parse_duration,
};
use clap::Parser;
use std::{net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

/// Check that a DNS change will not change how an HTTP endpoint answers
#[derive(Parser, Debug, Clone)]
#[command(name = "preflight-dns")]
#[command(version = crate::LONG_VERSION, about, long_about = None)]
pub struct Cli {
    /// Endpoint URL to check
    #[arg(long, env = "PREFLIGHT_ENDPOINT")]
    pub endpoint: Option<String>,

    /// HTTP method to use
    #[arg(long, env = "PREFLIGHT_METHOD", default_value = crate::defaults::DEFAULT_METHOD)]
    pub method: String,

    /// Request body to send
    #[arg(long, env = "PREFLIGHT_BODY")]
    pub body: Option<String>,

    /// Headers to send, comma-separated key=value list
    #[arg(long, env = "PREFLIGHT_HEADERS")]
    pub headers: Option<String>,

    /// New hostname or IP the endpoint will point to
    #[arg(long, env = "PREFLIGHT_NEW")]
    pub new: Option<String>,

    /// Request timeout (e.g. 5s, 1500ms)
    #[arg(long, env = "PREFLIGHT_TIMEOUT", value_parser = parse_duration, default_value = "5s")]
    pub timeout: Duration,

    /// Lower is better: a lower candidate status code also passes
    #[arg(long)]
    pub lib: bool,

    /// YAML or JSON job file; replaces the job built from flags
    #[arg(long, env = "PREFLIGHT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print the equivalent sh command instead of running
    #[arg(long)]
    pub equiv: bool,

    /// Run as an HTTP service accepting jobs
    #[arg(long)]
    pub server: bool,

    /// Address the server listens on
    #[arg(long, env = "PREFLIGHT_SERVER_ADDR", value_parser = parse_server_addr, default_value = crate::defaults::DEFAULT_SERVER_ADDR)]
    pub server_addr: SocketAddr,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log format (console, json, compact)
    #[arg(long, env = "PREFLIGHT_LOG_FORMAT", default_value = "console")]
    pub log_format: String,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

impl Cli {
    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        !self.no_color && supports_color()
    }

    /// Logging settings from flags; unknown levels fall back to info
    pub fn log_settings(&self) -> LogSettings {
        let use_color = self.use_colors();
        LogSettings {
            level: LogLevel::parse_or_info(&self.log_level),
            format: LogFormat::from_str(&self.log_format).unwrap_or(LogFormat::Console),
            use_color,
            ..LogSettings::default()
        }
    }
}

/// Listen address; a bare `:port` binds every interface
fn parse_server_addr(value: &str) -> Result<SocketAddr, String> {
    let value = value.trim();
    let full = if value.starts_with(':') {
        format!("0.0.0.0{}", value)
    } else {
        value.to_string()
    };
    full.parse::<SocketAddr>()
        .map_err(|e| format!("Invalid server address '{}': {}", value, e))
}

/// Check if the terminal supports color output
fn supports_color() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    true
}
