//! Errors raised while assembling a service stack.

use thiserror::Error;

/// Result type alias using [`StackError`].
pub type StackResult<T> = Result<T, StackError>;

/// Errors raised while assembling a service stack.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StackError {
    /// A service with the same name is already registered.
    #[error("Service `{name}` is already registered")]
    ServiceAlreadyRegistered {
        /// The duplicated service name.
        name: String,
    },

    /// A service name is empty or contains a path separator.
    #[error("Invalid service name `{name}`: {reason}")]
    InvalidServiceName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },
}
