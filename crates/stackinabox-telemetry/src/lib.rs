//! # Stack-In-A-Box Telemetry
//!
//! Logging setup for the interception layer. Every crate in the workspace
//! emits `tracing` events; this crate installs the subscriber that renders
//! them, configured from [`stackinabox_config::LoggingConfig`].
//!
//! ```rust,ignore
//! use stackinabox_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::from(&config.logging))?;
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{init_logging, init_test_logging, LogConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
