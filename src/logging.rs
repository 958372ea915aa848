/// Structured logging for the cruise-planning service layer.
///
/// Provides context-rich logging with subsystem and station/ship
/// identifiers, timestamps, and severity levels. Supports both console
/// output and file-based logging. Forecast and climatology failures are
/// logged here rather than surfaced — the pipeline degrades, it does not
/// error — so classification matters for telling an expected outage from
/// a broken integration.

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

// ---------------------------------------------------------------------------
// Data Source Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Dataset,
    Forecast,
    Normals,
    Ports,
    Database,
    System,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Dataset => write!(f, "DATASET"),
            DataSource::Forecast => write!(f, "FORECAST"),
            DataSource::Normals => write!(f, "NORMALS"),
            DataSource::Ports => write!(f, "PORTS"),
            DataSource::Database => write!(f, "DB"),
            DataSource::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - missing API key, date outside forecast range,
    /// station without published normals
    Expected,
    /// Unexpected failure - indicates service degradation or configuration issue
    Unexpected,
    /// Unknown - cannot determine if this is expected or not
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
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

        *LOGGER.lock().unwrap() = Some(logger);
    }

    /// Log a message with the global logger
    fn log(&self, level: LogLevel, source: &DataSource, context_id: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");

        // Format the log entry
        let context_part = context_id.map(|s| format!(" [{}]", s)).unwrap_or_default();
        let log_entry = format!(
            "{} {} {}{}: {}",
            timestamp, level, source, context_part, message
        );

        // Console output
        if self.console_timestamps {
            match level {
                LogLevel::Error => eprintln!("{}", log_entry),
                LogLevel::Warning => eprintln!("   {}", log_entry),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => println!("   [DEBUG] {}", message),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", source, context_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", source, context_part, message),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => {} // Skip debug in non-timestamp mode
            }
        }

        // File output
        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
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

/// Log a general informational message
pub fn info(source: DataSource, context_id: Option<&str>, message: &str) {
    if let Some(logger) = LOGGER.lock().unwrap().as_ref() {
        logger.log(LogLevel::Info, &source, context_id, message);
    }
}

/// Log a warning message
pub fn warn(source: DataSource, context_id: Option<&str>, message: &str) {
    if let Some(logger) = LOGGER.lock().unwrap().as_ref() {
        logger.log(LogLevel::Warning, &source, context_id, message);
    }
}

/// Log an error message
pub fn error(source: DataSource, context_id: Option<&str>, message: &str) {
    if let Some(logger) = LOGGER.lock().unwrap().as_ref() {
        logger.log(LogLevel::Error, &source, context_id, message);
    }
}

/// Log a debug message
pub fn debug(source: DataSource, context_id: Option<&str>, message: &str) {
    if let Some(logger) = LOGGER.lock().unwrap().as_ref() {
        logger.log(LogLevel::Debug, &source, context_id, message);
    }
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify a forecast API failure based on the error text.
pub fn classify_forecast_failure(error_message: &str) -> FailureType {
    // Missing key is a deployment choice, not an outage
    if error_message.contains("API key") {
        FailureType::Expected
    }
    // Rate limiting comes and goes on the free tier
    else if error_message.contains("HTTP error: 429") {
        FailureType::Expected
    }
    // Other HTTP errors might indicate service issues
    else if error_message.contains("HTTP error") {
        FailureType::Unexpected
    }
    // Parse errors suggest API changes or bugs
    else if error_message.contains("parse error") || error_message.contains("Parse error") {
        FailureType::Unexpected
    } else {
        FailureType::Unknown
    }
}

/// Classify a climate-normals proxy failure.
pub fn classify_normals_failure(_station_id: &str, error_message: &str) -> FailureType {
    // Some stations simply have no published monthly normals
    if error_message.contains("no usable monthly rows") || error_message.contains("empty body") {
        FailureType::Expected
    } else if error_message.contains("HTTP") || error_message.contains("timeout") {
        FailureType::Unexpected
    } else {
        FailureType::Unknown
    }
}

/// Classify a bulk dataset failure.
pub fn classify_dataset_failure(error_message: &str) -> FailureType {
    if error_message.contains("HTTP") {
        FailureType::Unexpected
    } else if error_message.contains("parse") || error_message.contains("Parse") {
        FailureType::Unexpected
    } else {
        FailureType::Unknown
    }
}

// ---------------------------------------------------------------------------
// Structured Failure Logging
// ---------------------------------------------------------------------------

/// Log a forecast fetch failure with automatic classification. The
/// pipeline continues with climatology after calling this.
pub fn log_forecast_failure(location: &str, operation: &str, err: &dyn std::error::Error) {
    let error_msg = err.to_string();
    let failure_type = classify_forecast_failure(&error_msg);

    let message = format!("{} failed [{}]: {}", operation, failure_type, error_msg);

    match failure_type {
        FailureType::Expected => debug(DataSource::Forecast, Some(location), &message),
        FailureType::Unexpected => error(DataSource::Forecast, Some(location), &message),
        FailureType::Unknown => warn(DataSource::Forecast, Some(location), &message),
    }
}

/// Log a climate-normals failure with classification. Affected dates stay
/// unfilled after calling this.
pub fn log_normals_failure(station_id: &str, operation: &str, err: &dyn std::error::Error) {
    let error_msg = err.to_string();
    let failure_type = classify_normals_failure(station_id, &error_msg);

    let message = format!("{} failed [{}]: {}", operation, failure_type, error_msg);

    match failure_type {
        FailureType::Expected => debug(DataSource::Normals, Some(station_id), &message),
        FailureType::Unexpected => error(DataSource::Normals, Some(station_id), &message),
        FailureType::Unknown => warn(DataSource::Normals, Some(station_id), &message),
    }
}

/// Log a dataset fetch failure. Unlike the weather paths this one also
/// propagates to the caller; the log entry is for diagnostics.
pub fn log_dataset_failure(operation: &str, err: &dyn std::error::Error) {
    let error_msg = err.to_string();
    let failure_type = classify_dataset_failure(&error_msg);

    let message = format!("{} failed [{}]: {}", operation, failure_type, error_msg);

    match failure_type {
        FailureType::Expected => debug(DataSource::Dataset, None, &message),
        FailureType::Unexpected => error(DataSource::Dataset, None, &message),
        FailureType::Unknown => warn(DataSource::Dataset, None, &message),
    }
}

// ---------------------------------------------------------------------------
// Backfill Summary Logging
// ---------------------------------------------------------------------------

/// Log a summary of a climatology backfill pass over one itinerary.
pub fn log_backfill_summary(station_id: &str, requested: usize, filled: usize, unfilled: usize) {
    let message = format!(
        "Climatology backfill: {}/{} dates filled, {} left pending",
        filled, requested, unfilled
    );

    if unfilled == 0 {
        info(DataSource::Normals, Some(station_id), &message);
    } else if filled == 0 {
        warn(DataSource::Normals, Some(station_id), &message);
    } else {
        info(DataSource::Normals, Some(station_id), &message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Error);
    }

    #[test]
    fn test_missing_api_key_is_expected_failure() {
        let result = classify_forecast_failure("Forecast API key is not configured");
        assert_eq!(result, FailureType::Expected);
    }

    #[test]
    fn test_forecast_http_error_is_unexpected_except_rate_limit() {
        assert_eq!(
            classify_forecast_failure("Forecast HTTP error: 500"),
            FailureType::Unexpected
        );
        assert_eq!(
            classify_forecast_failure("Forecast HTTP error: 429"),
            FailureType::Expected
        );
    }

    #[test]
    fn test_normals_without_monthly_rows_is_expected() {
        let result = classify_normals_failure("USW00012839", "no usable monthly rows");
        assert_eq!(result, FailureType::Expected);
    }
}
