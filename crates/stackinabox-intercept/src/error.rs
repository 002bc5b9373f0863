//! Interception error types.

use stackinabox_client::{ClientError, Symbol};
use thiserror::Error;

/// Result type alias using [`InterceptError`].
pub type InterceptResult<T> = Result<T, InterceptError>;

/// Errors owned by the interception layer.
///
/// Request failures are not translated: dispatch and the session facade
/// return the client's [`ClientError`] unchanged.
#[derive(Debug, Error)]
pub enum InterceptError {
    /// An interception is already active in this process.
    #[error("Interception is already active")]
    AlreadyActive,

    /// `exit` was called on an interception that is not active.
    #[error("Interception is not active")]
    NotActive,

    /// Some surface bindings were replaced by someone else while active.
    ///
    /// The originals have been restored regardless.
    #[error("Surface bindings were changed during interception: {}", join(.symbols))]
    Restoration {
        /// Symbols whose binding was not the one interception installed.
        symbols: Vec<Symbol>,
    },

    /// The client rejected a surface change.
    #[error(transparent)]
    Client(#[from] ClientError),
}

fn join(symbols: &[Symbol]) -> String {
    symbols
        .iter()
        .map(|s| s.name())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restoration_display() {
        let err = InterceptError::Restoration {
            symbols: vec![Symbol::Get, Symbol::Session],
        };
        assert_eq!(
            err.to_string(),
            "Surface bindings were changed during interception: get, session"
        );
    }

    #[test]
    fn test_state_errors_display() {
        assert_eq!(
            InterceptError::AlreadyActive.to_string(),
            "Interception is already active"
        );
        assert_eq!(InterceptError::NotActive.to_string(), "Interception is not active");
    }
}
