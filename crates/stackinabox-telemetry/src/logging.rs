//! Structured logging for Stack-In-A-Box.
//!
//! Installs a `tracing-subscriber` fmt layer so the `tracing` events emitted
//! by registration, activation and dispatch show up in test output.
//!
//! # Example
//!
//! ```rust,ignore
//! use stackinabox_telemetry::logging::{LogConfig, init_logging};
//!
//! init_logging(&LogConfig::development())?;
//!
//! tracing::debug!(uri = "svc.test/v1", "Registering stack");
//! ```

use crate::error::TelemetryError;
use crate::TelemetryResult;
use stackinabox_config::{LogFormat, LoggingConfig};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Whether logging is enabled.
    pub enabled: bool,

    /// Log level or filter directive (e.g., "info", "stackinabox_intercept=debug").
    pub level: String,

    /// Output format.
    pub format: LogFormat,

    /// Whether to include span events (enter, exit, close).
    pub span_events: bool,

    /// Whether to include file/line info.
    pub file_line_info: bool,

    /// Whether to include thread IDs. Sessions are per thread, so this is on by default.
    pub thread_ids: bool,

    /// Whether to write through the test-capturing writer.
    pub test_writer: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            format: LogFormat::Compact,
            span_events: false,
            file_line_info: false,
            thread_ids: true,
            test_writer: false,
        }
    }
}

impl LogConfig {
    /// Creates a development configuration with human-readable output.
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            format: LogFormat::Pretty,
            span_events: true,
            file_line_info: true,
            ..Self::default()
        }
    }

    /// Creates a production configuration with JSON output.
    #[must_use]
    pub fn production() -> Self {
        Self {
            format: LogFormat::Json,
            ..Self::default()
        }
    }

    /// Creates a configuration for use inside `cargo test`.
    #[must_use]
    pub fn test() -> Self {
        Self {
            level: "debug".to_string(),
            test_writer: true,
            ..Self::default()
        }
    }
}

impl From<&LoggingConfig> for LogConfig {
    fn from(config: &LoggingConfig) -> Self {
        Self {
            enabled: config.enabled,
            level: config.level.clone(),
            format: config.format,
            file_line_info: config.include_location,
            ..Self::default()
        }
    }
}

/// Initializes the logging subsystem.
///
/// # Errors
///
/// Returns `TelemetryError::LoggingInit` if the filter is invalid or a
/// global subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = create_env_filter(&config.level)?;

    let span_events = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let base = tracing_subscriber::fmt::layer()
        .with_span_events(span_events)
        .with_file(config.file_line_info)
        .with_line_number(config.file_line_info)
        .with_thread_ids(config.thread_ids);

    let layer = match (config.format, config.test_writer) {
        (LogFormat::Json, false) => base.json().with_filter(filter).boxed(),
        (LogFormat::Json, true) => base.json().with_test_writer().with_filter(filter).boxed(),
        (LogFormat::Pretty, false) => base.pretty().with_filter(filter).boxed(),
        (LogFormat::Pretty, true) => base.pretty().with_test_writer().with_filter(filter).boxed(),
        (LogFormat::Compact, false) => base.compact().with_filter(filter).boxed(),
        (LogFormat::Compact, true) => base.compact().with_test_writer().with_filter(filter).boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}

/// Installs test logging once per process.
///
/// Safe to call from every test; later calls are no-ops.
pub fn init_test_logging() {
    // A second install fails with "already set", which is the expected case here
    let _ = init_logging(&LogConfig::test());
}

/// Creates an env filter from a string.
///
/// # Errors
///
/// Returns error if the filter string is invalid.
pub fn create_env_filter(filter: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(filter)
        .map_err(|e| TelemetryError::LoggingInit(format!("Invalid log level: {e}")))
}

/// Standard log field names.
///
/// Use these field names for consistency across logs.
pub mod fields {
    /// Session identifier field name.
    pub const SESSION_ID: &str = "session_id";

    /// Registered base URI field name.
    pub const URI: &str = "uri";

    /// Mount prefix field name.
    pub const MOUNT: &str = "mount";

    /// Substituted surface symbol field name.
    pub const SYMBOL: &str = "symbol";

    /// HTTP method field name.
    pub const HTTP_METHOD: &str = "http.method";

    /// Request URL field name.
    pub const HTTP_URL: &str = "http.url";

    /// HTTP status code field name.
    pub const HTTP_STATUS: &str = "http.status_code";

    /// Error field name.
    pub const ERROR: &str = "error";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert!(config.enabled);
        assert_eq!(config.format, LogFormat::Compact);
        assert_eq!(config.level, "info");
        assert!(config.thread_ids);
    }

    #[test]
    fn test_development_config() {
        let config = LogConfig::development();
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.span_events);
        assert!(config.file_line_info);
        assert_eq!(config.level, "debug");
    }

    #[test]
    fn test_from_logging_config() {
        let section = LoggingConfig {
            level: "trace".to_string(),
            format: LogFormat::Json,
            include_location: true,
            ..LoggingConfig::default()
        };
        let config = LogConfig::from(&section);
        assert_eq!(config.level, "trace");
        assert_eq!(config.format, LogFormat::Json);
        assert!(config.file_line_info);
    }

    #[test]
    fn test_create_env_filter_valid() {
        assert!(create_env_filter("info").is_ok());
        assert!(create_env_filter("stackinabox_intercept=debug,warn").is_ok());
    }

    #[test]
    fn test_create_env_filter_invalid() {
        assert!(create_env_filter("stackinabox=notalevel").is_err());
    }

    #[test]
    fn test_disabled_logging() {
        let config = LogConfig {
            enabled: false,
            ..Default::default()
        };

        assert!(init_logging(&config).is_ok());
    }

    #[test]
    fn test_init_test_logging_twice() {
        init_test_logging();
        init_test_logging();
    }
}
