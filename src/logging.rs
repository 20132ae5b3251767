//! Structured logging for the flood risk service
//!
//! Provides context-rich logging with component tags, optional sensor
//! identifiers, timestamps, and severity levels. Supports both console
//! output and file-based logging for long-running ingestion.
//!
//! Console output goes to stderr at every level; stdout carries only the
//! CLI's results.
//!
//! Logging before `init_logger` is a no-op, so library code can log freely
//! from tests without any setup.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

impl LogLevel {
    /// Parses a level name as used in the `LOG_LEVEL` environment variable.
    pub fn parse(name: &str) -> Option<LogLevel> {
        match name.trim().to_ascii_lowercase().as_str() {
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warning),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Store,
    Model,
    Analyzer,
    Ingest,
    System,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Store => write!(f, "STORE"),
            Component::Model => write!(f, "MODEL"),
            Component::Analyzer => write!(f, "ANALYZER"),
            Component::Ingest => write!(f, "INGEST"),
            Component::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// The store could not be reached at all (network, auth, server down)
    Connection,
    /// The store answered but the query failed (schema drift, bad SQL)
    Query,
    /// Cannot tell from the error text
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Connection => write!(f, "CONNECTION"),
            FailureType::Query => write!(f, "QUERY"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        let mut slot = LOGGER.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Some(logger);
    }

    fn log(&self, level: LogLevel, component: Component, sensor_id: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let sensor_part = sensor_id.map(|s| format!(" [{}]", s)).unwrap_or_default();
        let log_entry = format!(
            "{} {} {}{}: {}",
            timestamp, level, component, sensor_part, message
        );

        let console = self.console_line(level, component, &sensor_part, message, &log_entry);
        eprintln!("{}", console);

        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn console_line(
        &self,
        level: LogLevel,
        component: Component,
        sensor_part: &str,
        message: &str,
        log_entry: &str,
    ) -> String {
        if self.console_timestamps {
            return log_entry.to_string();
        }
        match level {
            LogLevel::Error => format!("   ✗ {}{}: {}", component, sensor_part, message),
            LogLevel::Warning => format!("   ⚠ {}{}: {}", component, sensor_part, message),
            LogLevel::Info => format!("   {}", message),
            LogLevel::Debug => format!("   [DEBUG] {}", message),
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

fn dispatch(level: LogLevel, component: Component, sensor_id: Option<&str>, message: &str) {
    let guard = LOGGER.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(logger) = guard.as_ref() {
        logger.log(level, component, sensor_id, message);
    }
}

/// Log a general informational message
pub fn info(component: Component, sensor_id: Option<&str>, message: &str) {
    dispatch(LogLevel::Info, component, sensor_id, message);
}

/// Log a warning message
pub fn warn(component: Component, sensor_id: Option<&str>, message: &str) {
    dispatch(LogLevel::Warning, component, sensor_id, message);
}

/// Log an error message
pub fn error(component: Component, sensor_id: Option<&str>, message: &str) {
    dispatch(LogLevel::Error, component, sensor_id, message);
}

/// Log a debug message
pub fn debug(component: Component, sensor_id: Option<&str>, message: &str) {
    dispatch(LogLevel::Debug, component, sensor_id, message);
}

// ---------------------------------------------------------------------------
// Store Failure Logging
// ---------------------------------------------------------------------------

/// Classify a reading store failure from its error text
pub fn classify_store_failure(error_message: &str) -> FailureType {
    let lower = error_message.to_ascii_lowercase();
    if lower.contains("connect")
        || lower.contains("connection")
        || lower.contains("timed out")
        || lower.contains("timeout")
        || lower.contains("refused")
    {
        FailureType::Connection
    } else if lower.contains("db error") || lower.contains("syntax") || lower.contains("column") {
        FailureType::Query
    } else {
        FailureType::Unknown
    }
}

/// Log a store failure with classification. Callers still propagate the error.
pub fn log_store_failure(operation: &str, err: &dyn std::error::Error) {
    let error_msg = err.to_string();
    let failure_type = classify_store_failure(&error_msg);
    let message = format!("{} failed [{}]: {}", operation, failure_type, error_msg);
    error(Component::Store, None, &message);
}

// ---------------------------------------------------------------------------
// Training Summary Logging
// ---------------------------------------------------------------------------

/// Log the outcome of a model fit
pub fn log_training_summary(train_size: usize, test_size: usize, holdout_accuracy: f64) {
    info(
        Component::Model,
        None,
        &format!(
            "Decision tree trained on {} readings, {} held out for testing",
            train_size, test_size
        ),
    );
    info(
        Component::Model,
        None,
        &format!("Model accuracy on held-out readings: {:.2}%", holdout_accuracy * 100.0),
    );
}
