//! Errors raised while loading or validating a [`StackConfig`](crate::StackConfig).

use std::path::PathBuf;
use thiserror::Error;

/// A configuration source could not be turned into a valid configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file does not exist.
    #[error("configuration file not found: {path}")]
    FileNotFound {
        /// Path that was given to the loader.
        path: PathBuf,
    },

    /// The configuration file exists but could not be read.
    #[error("cannot read configuration file {path}")]
    Read {
        /// Path of the file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The file extension or format name is neither TOML nor JSON.
    #[error("unsupported configuration format `{format}`; expected toml or json")]
    UnsupportedFormat {
        /// The extension or format name that was given.
        format: String,
    },

    /// The TOML source is malformed or has unknown keys.
    #[error("invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// The JSON source is malformed or has unknown keys.
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// A `STACKINABOX__SECTION__KEY` style override could not be applied.
    #[error("environment override {var}: {reason}")]
    EnvOverride {
        /// Name of the environment variable.
        var: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A loaded value breaks a constraint, such as an empty scheme list.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        /// Dotted path of the field, e.g. `intercept.schemes`.
        field: String,
        /// What was wrong with it.
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn env_override(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvOverride {
            var: var.into(),
            reason: reason.into(),
        }
    }
}
