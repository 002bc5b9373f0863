//! Client error types.

use http::Method;
use thiserror::Error;

use crate::surface::Symbol;

/// Result type alias using [`ClientError`].
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors raised while preparing, routing or executing a request.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The URL could not be parsed or has no scheme.
    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl {
        /// The offending URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A header name or value is not valid HTTP.
    #[error("Invalid header {name}: {reason}")]
    InvalidHeader {
        /// Header name as supplied.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// No mounted adapter and no network fallback can service the URL.
    #[error("No connection adapters were found for {url}")]
    NoAdapter {
        /// The URL that found no adapter.
        url: String,
    },

    /// A mock adapter was reached but none of its matchers claimed the request.
    #[error("No mock address: {method} {url}")]
    NoMockAddress {
        /// Request method.
        method: Method,
        /// Request URL.
        url: String,
    },

    /// The request could not be delivered.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The network transport failed.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The redirect chain was longer than allowed.
    #[error("Exceeded {max} redirects")]
    TooManyRedirects {
        /// The configured limit.
        max: u32,
    },

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Response body could not be decoded.
    #[error("Body read error: {0}")]
    BodyRead(String),

    /// A surface binding of the wrong kind was supplied for a symbol.
    #[error("Binding for `{symbol}` must be a {expected} binding")]
    BindingKind {
        /// The symbol being replaced.
        symbol: Symbol,
        /// The kind of binding the symbol holds.
        expected: &'static str,
    },
}

impl ClientError {
    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates an invalid header error.
    pub fn invalid_header(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidHeader {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    /// Returns true if the request never reached a responder.
    #[must_use]
    pub fn is_connection(&self) -> bool {
        match self {
            Self::Connection(_) => true,
            Self::Transport(e) => e.is_connect() || e.is_timeout(),
            _ => false,
        }
    }
}
