//! Typed configuration for Stack-In-A-Box.
//!
//! This crate provides a strongly-typed configuration system for the HTTP
//! interception layer with support for:
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → file → env)
//!
//! # Overview
//!
//! [`StackConfig`] is the root type:
//!
//! - [`ClientConfig`] - session defaults and the network fallback transport
//! - [`InterceptConfig`] - registration schemes and dispatch behaviour
//! - [`LoggingConfig`] - log level and format
//!
//! # Configuration File Format
//!
//! ```toml
//! [client]
//! user_agent = "my-tests/1.0"
//! timeout_ms = 2000
//! max_redirects = 10
//! verify_tls = true
//!
//! [intercept]
//! schemes = ["http", "https"]
//! close_after_dispatch = true
//! adapter_key = "adapter"
//!
//! [logging]
//! enabled = true
//! level = "debug"
//! format = "compact"
//! ```
//!
//! # Environment Variable Overrides
//!
//! All configuration values can be overridden via environment variables using
//! the format `PREFIX__SECTION__KEY`. For example:
//!
//! - `STACKINABOX__CLIENT__TIMEOUT_MS=500`
//! - `STACKINABOX__INTERCEPT__SCHEMES=http,https`
//! - `STACKINABOX__LOGGING__LEVEL=trace`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::*;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
