//! Configuration schema types.
//!
//! This module defines the structure of all configuration sections.

use serde::{Deserialize, Serialize};

/// HTTP client configuration section.
///
/// Controls the defaults every new session starts with, and how the
/// network fallback transport is built.
///
/// # Example
///
/// ```
/// use stackinabox_config::ClientConfig;
///
/// let config = ClientConfig {
///     timeout_ms: Some(5_000),
///     ..Default::default()
/// };
/// assert_eq!(config.max_redirects, 30);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// `User-Agent` header sent by new sessions.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout in milliseconds. None waits indefinitely.
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Maximum number of redirects a session follows for one request.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: u32,

    /// Verify TLS certificates on the network transport.
    #[serde(default = "default_true")]
    pub verify_tls: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_ms: None,
            max_redirects: default_max_redirects(),
            verify_tls: true,
        }
    }
}

fn default_user_agent() -> String {
    concat!("stackinabox-client/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_max_redirects() -> u32 {
    30
}

/// Interception configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct InterceptConfig {
    /// URI schemes a registration mounts its adapter under.
    #[serde(default = "default_schemes")]
    pub schemes: Vec<String>,

    /// Close the current session after each dispatched request.
    #[serde(default = "default_true")]
    pub close_after_dispatch: bool,

    /// Key the registration stores its adapter under in the mock stack.
    #[serde(default = "default_adapter_key")]
    pub adapter_key: String,
}

impl Default for InterceptConfig {
    fn default() -> Self {
        Self {
            schemes: default_schemes(),
            close_after_dispatch: true,
            adapter_key: default_adapter_key(),
        }
    }
}

fn default_schemes() -> Vec<String> {
    vec!["http".to_string(), "https".to_string()]
}

fn default_adapter_key() -> String {
    "adapter".to_string()
}

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs.
    Json,
    /// Human-readable pretty format.
    Pretty,
    /// Single-line compact format, the usual choice inside test runs.
    #[default]
    Compact,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level or filter directive (e.g. "debug", "stackinabox_intercept=trace").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            include_location: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_defaults() {
        let config = ClientConfig::default();
        assert!(config.user_agent.starts_with("stackinabox-client/"));
        assert_eq!(config.timeout_ms, None);
        assert_eq!(config.max_redirects, 30);
        assert!(config.verify_tls);
    }

    #[test]
    fn test_intercept_defaults() {
        let config = InterceptConfig::default();
        assert_eq!(config.schemes, vec!["http", "https"]);
        assert!(config.close_after_dispatch);
        assert_eq!(config.adapter_key, "adapter");
    }

    #[test]
    fn test_partial_section_uses_defaults() {
        let config: InterceptConfig = toml::from_str("close_after_dispatch = false").unwrap();
        assert!(!config.close_after_dispatch);
        assert_eq!(config.schemes, vec!["http", "https"]);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<ClientConfig, _> = toml::from_str("retries = 3");
        assert!(result.is_err());
    }

    #[test]
    fn test_log_format_lowercase() {
        let config: LoggingConfig = serde_json::from_str(r#"{"format": "pretty"}"#).unwrap();
        assert_eq!(config.format, LogFormat::Pretty);
    }
}
