//! Structured logging for preflight runs
//!
//! Loggers are plain values handed to each run, never process-wide state:
//! - leveled entries with structured fields
//! - a correlation ID per run so concurrent server jobs can be told apart
//! - console, compact and JSON output formats

use crate::error::{AppError, Result};
use crate::models::{Job, Verdict};
use crate::types::{ProbeKind, ResolvedAddress, RunState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Log level enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    /// Trace level - most detailed
    Trace = 0,
    /// Debug level - detailed information for debugging
    Debug = 1,
    /// Info level - general application information
    Info = 2,
    /// Warning level - potentially harmful situations
    Warn = 3,
    /// Error level - error events
    Error = 4,
    /// Fatal level - errors that end the process
    Fatal = 5,
}

impl LogLevel {
    /// Get log level name as string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Fatal => "FATAL",
        }
    }

    /// Get ANSI color code for console output
    pub fn color_code(&self) -> &'static str {
        match self {
            LogLevel::Trace => "\x1b[37m",    // White
            LogLevel::Debug => "\x1b[36m",    // Cyan
            LogLevel::Info => "\x1b[32m",     // Green
            LogLevel::Warn => "\x1b[33m",     // Yellow
            LogLevel::Error => "\x1b[31m",    // Red
            LogLevel::Fatal => "\x1b[35m",    // Magenta
        }
    }

    /// Reset ANSI color code
    pub fn reset_code() -> &'static str {
        "\x1b[0m"
    }

    /// Parse a level, falling back to `Info` for anything unrecognized
    pub fn parse_or_info(value: &str) -> Self {
        value.parse().unwrap_or(LogLevel::Info)
    }
}

impl std::str::FromStr for LogLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "TRACE" => Ok(LogLevel::Trace),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            "FATAL" | "PANIC" => Ok(LogLevel::Fatal),
            _ => Err(AppError::parse(format!("Invalid log level: {}", s))),
        }
    }
}

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable console format
    Console,
    /// JSON format for structured logging
    Json,
    /// Compact single-line format
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "console" | "text" => Ok(LogFormat::Console),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(AppError::parse(format!("Invalid log format: {}", s))),
        }
    }
}

/// Log entry structure for structured logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Timestamp when log entry was created
    pub timestamp: DateTime<Utc>,
    /// Log level
    pub level: LogLevel,
    /// Log message
    pub message: String,
    /// Logger name/component
    pub logger: String,
    /// Correlation ID for tracking related events
    pub correlation_id: Option<String>,
    /// Additional structured fields
    pub fields: HashMap<String, serde_json::Value>,
}

/// Where formatted entries go
#[derive(Debug, Clone)]
pub enum LogSink {
    /// Warnings and errors to stderr, everything else to stdout
    Console,
    /// Keep entries in memory (tests, embedding)
    Memory(Arc<Mutex<Vec<LogEntry>>>),
}

/// Settings shared by every logger of a process
#[derive(Debug, Clone)]
pub struct LogSettings {
    pub level: LogLevel,
    pub format: LogFormat,
    pub use_color: bool,
    pub sink: LogSink,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Console,
            use_color: true,
            sink: LogSink::Console,
        }
    }
}

impl LogSettings {
    /// Settings capturing entries in memory; returns the shared buffer too
    pub fn in_memory(level: LogLevel) -> (Self, Arc<Mutex<Vec<LogEntry>>>) {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let settings = Self {
            level,
            format: LogFormat::Compact,
            use_color: false,
            sink: LogSink::Memory(buffer.clone()),
        };
        (settings, buffer)
    }
}

/// Logger implementation with multiple output formats
#[derive(Debug, Clone)]
pub struct Logger {
    /// Logger name
    name: String,
    settings: LogSettings,
    /// Fields attached to every entry
    context_fields: HashMap<String, serde_json::Value>,
    correlation_id: Option<String>,
}

impl Logger {
    /// Create a new logger with default settings
    pub fn new(name: &str) -> Self {
        Self::with_settings(name, LogSettings::default())
    }

    /// Create a logger with specific settings
    pub fn with_settings(name: &str, settings: LogSettings) -> Self {
        Self {
            name: name.to_string(),
            settings,
            context_fields: HashMap::new(),
            correlation_id: None,
        }
    }

    /// Attach a correlation ID to all subsequent entries
    pub fn set_correlation_id(&mut self, correlation_id: String) {
        self.correlation_id = Some(correlation_id);
    }

    /// Add context field for all subsequent log entries
    pub fn add_context_field<T: Serialize>(&mut self, key: &str, value: T) {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.context_fields.insert(key.to_string(), json_value);
        }
    }

    /// Create a log entry builder
    pub fn log(&self, level: LogLevel, message: &str) -> LogEntryBuilder<'_> {
        LogEntryBuilder::new(self, level, message.to_string())
    }

    pub fn trace(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Trace, message)
    }

    pub fn debug(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Debug, message)
    }

    pub fn info(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Info, message)
    }

    pub fn warn(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Warn, message)
    }

    pub fn error(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Error, message)
    }

    /// Check if a log level would be output
    pub fn would_log(&self, level: LogLevel) -> bool {
        level >= self.settings.level
    }

    /// Write log entry to the configured sink
    fn write_entry(&self, mut entry: LogEntry) {
        if !self.would_log(entry.level) {
            return;
        }

        for (key, value) in &self.context_fields {
            entry.fields.entry(key.clone()).or_insert_with(|| value.clone());
        }

        match &self.settings.sink {
            LogSink::Memory(buffer) => {
                if let Ok(mut entries) = buffer.lock() {
                    entries.push(entry);
                }
            }
            LogSink::Console => {
                let output = match self.settings.format {
                    LogFormat::Console => self.format_console(&entry),
                    LogFormat::Json => self.format_json(&entry),
                    LogFormat::Compact => self.format_compact(&entry),
                };

                if entry.level >= LogLevel::Warn {
                    let _ = writeln!(io::stderr(), "{}", output);
                } else {
                    let _ = writeln!(io::stdout(), "{}", output);
                }
            }
        }
    }

    /// Format log entry for console output
    fn format_console(&self, entry: &LogEntry) -> String {
        let timestamp = entry.timestamp.format("%Y-%m-%d %H:%M:%S%.3f");
        let level_str = entry.level.as_str();

        let formatted_level = if self.settings.use_color {
            format!("{}{:>5}{}", entry.level.color_code(), level_str, LogLevel::reset_code())
        } else {
            format!("{:>5}", level_str)
        };

        let mut output = format!("{} {} [{}] {}",
            timestamp,
            formatted_level,
            entry.logger,
            entry.message
        );

        if let Some(correlation_id) = &entry.correlation_id {
            let short = correlation_id.get(..8).unwrap_or(correlation_id);
            output.push_str(&format!(" [{}]", short));
        }

        if !entry.fields.is_empty() {
            let mut fields_str: Vec<String> = entry.fields.iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            fields_str.sort();
            output.push_str(&format!(" {{{}}}", fields_str.join(", ")));
        }

        output
    }

    /// Format log entry as JSON
    fn format_json(&self, entry: &LogEntry) -> String {
        match serde_json::to_string(entry) {
            Ok(json) => json,
            Err(_) => format!("{{\"error\": \"Failed to serialize log entry\", \"message\": \"{}\"}}", entry.message),
        }
    }

    /// Format log entry in compact format
    fn format_compact(&self, entry: &LogEntry) -> String {
        let timestamp = entry.timestamp.format("%H:%M:%S");
        format!("{} {} {}: {}",
            timestamp,
            entry.level.as_str().chars().next().unwrap_or('?'),
            entry.logger,
            entry.message
        )
    }
}

/// Builder pattern for creating log entries
pub struct LogEntryBuilder<'a> {
    logger: &'a Logger,
    entry: LogEntry,
}

impl<'a> LogEntryBuilder<'a> {
    fn new(logger: &'a Logger, level: LogLevel, message: String) -> Self {
        Self {
            logger,
            entry: LogEntry {
                timestamp: Utc::now(),
                level,
                message,
                logger: logger.name.clone(),
                correlation_id: logger.correlation_id.clone(),
                fields: HashMap::new(),
            },
        }
    }

    /// Add a structured field
    pub fn field<T: Serialize>(mut self, key: &str, value: T) -> Self {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.entry.fields.insert(key.to_string(), json_value);
        }
        self
    }

    /// Add error information
    pub fn error_info(self, error: &AppError) -> Self {
        self.field("error", error.to_string())
            .field("error_category", error.category())
            .field("error_recoverable", error.is_recoverable())
    }

    /// Finalize and write the log entry
    pub fn log(self) {
        self.logger.write_entry(self.entry);
    }
}

/// Domain logger for one preflight run
#[derive(Debug, Clone)]
pub struct ProbeLogger {
    logger: Logger,
}

impl ProbeLogger {
    /// Create a run logger with a fresh correlation ID
    pub fn new(settings: LogSettings) -> Self {
        let mut logger = Logger::with_settings("preflight", settings);
        logger.set_correlation_id(Uuid::new_v4().to_string());
        Self { logger }
    }

    /// Log run start with the job's shape
    pub fn log_run_start(&self, job: &Job) {
        self.logger.debug("running")
            .field("endpoint", job.endpoint().as_str())
            .field("method", job.method().as_str())
            .field("new", job.new_target())
            .field("timeout_ms", job.timeout().as_millis() as u64)
            .field("lower_is_better", job.lower_is_better())
            .log();
    }

    /// Log a state transition
    pub fn log_state(&self, state: RunState) {
        self.logger.trace(&format!("state {}", state.name()))
            .field("state", state.name())
            .log();
    }

    /// Log replacement target resolution
    pub fn log_resolution(&self, target: &str, resolved: &ResolvedAddress) {
        self.logger.debug(&format!("resolved new target {} to {}", target, resolved))
            .field("target", target)
            .field("resolved", resolved.to_string())
            .log();
    }

    /// Log one probe's status code
    pub fn log_probe(&self, kind: ProbeKind, status_code: u16, duration_ms: f64) {
        self.logger.debug(&format!("got {} state", kind.name()))
            .field("probe", kind.name())
            .field("status", status_code)
            .field("duration_ms", duration_ms)
            .log();
    }

    /// Log the final verdict
    pub fn log_verdict(&self, verdict: &Verdict) {
        if verdict.passed {
            self.logger.info("passed")
                .field("current_status", verdict.current_status)
                .field("candidate_status", verdict.candidate_status)
                .log();
        } else {
            self.logger.error(verdict.summary())
                .field("current_status", verdict.current_status)
                .field("candidate_status", verdict.candidate_status)
                .log();
        }
    }

    /// Log a failed step with its error
    pub fn log_error(&self, context: &str, error: &AppError) {
        self.logger.error(&format!("{}: {}", context, error))
            .field("context", context)
            .error_info(error)
            .log();
    }
}
