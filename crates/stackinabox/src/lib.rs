//! # Stack-In-A-Box
//!
//! Route HTTP client calls made by code under test to in-process mock
//! services, without that code knowing it is being mocked.
//!
//! - [`client`]: the HTTP client whose free functions can be substituted
//! - [`stack`]: the mock service stack that answers intercepted requests
//! - [`intercept`]: activation, URI registration and per-thread sessions
//! - [`config`] / [`telemetry`]: configuration and logging
//!
//! ## Quick Start
//!
//! ```rust
//! use stackinabox::prelude::*;
//!
//! StackInABox::global()
//!     .register(FnService::new("users", |_, path| StackResponse::text(format!("user {path}"))))
//!     .ok();
//!
//! let guard = Interception::activate()?;
//! register("api.test/v2");
//!
//! let response = stackinabox::client::get("https://api.test/v2/users/42", RequestOptions::new())?;
//! assert_eq!(response.text()?, "user /42");
//!
//! guard.deactivate()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![doc(html_root_url = "https://docs.rs/stackinabox/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use thiserror::Error;
use tracing::info;

// Re-export the HTTP client
pub use stackinabox_client as client;

// Re-export configuration types
pub use stackinabox_config as config;

// Re-export interception
pub use stackinabox_intercept as intercept;

// Re-export the service stack
pub use stackinabox_stack as stack;

// Re-export logging setup
pub use stackinabox_telemetry as telemetry;

/// Errors raised by [`init`].
#[derive(Debug, Error)]
pub enum InitError {
    /// The configuration failed validation.
    #[error(transparent)]
    Config(#[from] stackinabox_config::ConfigError),

    /// Logging could not be installed.
    #[error(transparent)]
    Telemetry(#[from] stackinabox_telemetry::TelemetryError),
}

/// Validates `config`, applies it to interception and installs logging.
///
/// # Errors
///
/// Fails if the configuration is invalid or a global subscriber is already
/// installed. Nothing is applied when validation fails.
pub fn init(config: &stackinabox_config::StackConfig) -> Result<(), InitError> {
    config.validate()?;

    stackinabox_intercept::configure(config);
    stackinabox_telemetry::init_logging(&stackinabox_telemetry::LogConfig::from(&config.logging))?;

    info!(
        schemes = ?config.intercept.schemes,
        close_after_dispatch = config.intercept.close_after_dispatch,
        "Stack-In-A-Box initialized"
    );
    Ok(())
}

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use stackinabox::prelude::*;
/// ```
pub mod prelude {
    pub use stackinabox_client::{
        ClientError, ClientResult, HttpSession, RequestOptions, Response, Session,
    };

    // Configuration
    pub use stackinabox_config::{ConfigLoader, StackConfig};

    // Interception
    pub use stackinabox_intercept::{
        intercept, register, register_on_session, ActivationGuard, CurrentSession,
        InterceptError, Interception, MockAdapter, Registrar,
    };

    // Service stack
    pub use stackinabox_stack::{
        FnService, RoutedService, ServiceStack, StackInABox, StackRequest, StackResponse,
        StackService,
    };
}
