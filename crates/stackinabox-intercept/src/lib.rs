//! # Stack-In-A-Box Interception
//!
//! Routes traffic sent through `stackinabox-client`'s free functions to an
//! in-process [`stackinabox_stack::ServiceStack`], without the code under
//! test knowing.
//!
//! ## Pieces
//!
//! - [`registry`]: one current session per thread.
//! - [`Registrar`] / [`register`]: mount a mock adapter for a base URI on a
//!   session, under every configured scheme.
//! - [`dispatch`]: the request functions installed while active.
//! - [`CurrentSession`]: a session handle that forwards to the current one.
//! - [`Interception`]: swaps the client's call surface in and out.
//!
//! ## Example
//!
//! ```rust
//! use stackinabox_client::RequestOptions;
//! use stackinabox_intercept::{intercept, register};
//! use stackinabox_stack::{FnService, StackInABox, StackResponse};
//!
//! StackInABox::global()
//!     .register(FnService::new("hello", |_, _| StackResponse::text("hi")))
//!     .ok();
//!
//! let body = intercept(|| {
//!     register("docs.test");
//!     stackinabox_client::get("http://docs.test/hello", RequestOptions::new())
//!         .and_then(|response| response.text())
//! })??;
//!
//! assert_eq!(body, "hi");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![doc(html_root_url = "https://docs.rs/stackinabox-intercept/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod activation;
mod adapter;
pub mod dispatch;
mod error;
mod facade;
mod matcher;
mod registration;
pub mod registry;
mod settings;

pub use activation::{intercept, is_active, ActivationGuard, Interception};
pub use adapter::MockAdapter;
pub use error::{InterceptError, InterceptResult};
pub use facade::CurrentSession;
pub use matcher::{Matcher, UriMatcher};
pub use registration::{normalize_uri, register, register_on_session, Registrar};
pub use settings::configure;

/// The calling thread's current session.
pub fn get_session() -> stackinabox_client::Session {
    registry::current()
}
