//! Main configuration types.
//!
//! This module provides the top-level [`StackConfig`] struct.

use serde::{Deserialize, Serialize};

use crate::{ClientConfig, ConfigError, InterceptConfig, LogFormat, LoggingConfig};

/// Complete Stack-In-A-Box configuration.
///
/// This is the root configuration type that contains all configuration sections.
/// Use [`ConfigLoader`](crate::ConfigLoader) to load configuration from files
/// and environment variables.
///
/// # Example
///
/// ```
/// use stackinabox_config::StackConfig;
///
/// let config = StackConfig::default();
/// assert_eq!(config.intercept.schemes, vec!["http", "https"]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct StackConfig {
    /// HTTP client defaults.
    #[serde(default)]
    pub client: ClientConfig,

    /// Interception behaviour.
    #[serde(default)]
    pub intercept: InterceptConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl StackConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - No interception scheme is configured
    /// - A scheme is empty or contains `:` or `/`
    /// - The adapter storage key is empty
    /// - The client timeout is zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.intercept.schemes.is_empty() {
            return Err(ConfigError::invalid_value(
                "intercept.schemes",
                "at least one scheme is required",
            ));
        }

        for scheme in &self.intercept.schemes {
            if scheme.is_empty() || scheme.contains(':') || scheme.contains('/') {
                return Err(ConfigError::invalid_value(
                    "intercept.schemes",
                    format!("invalid scheme: {scheme:?}"),
                ));
            }
        }

        if self.intercept.adapter_key.is_empty() {
            return Err(ConfigError::invalid_value(
                "intercept.adapter_key",
                "must not be empty",
            ));
        }

        if self.client.timeout_ms == Some(0) {
            return Err(ConfigError::invalid_value(
                "client.timeout_ms",
                "must be greater than zero",
            ));
        }

        Ok(())
    }

    /// Create a development configuration preset.
    ///
    /// Debug-level pretty logs with source locations.
    #[must_use]
    pub fn development() -> Self {
        Self {
            logging: LoggingConfig {
                level: "debug".to_string(),
                format: LogFormat::Pretty,
                include_location: true,
                ..LoggingConfig::default()
            },
            ..Self::default()
        }
    }
}
