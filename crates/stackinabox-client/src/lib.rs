//! # Stack-In-A-Box Client
//!
//! A small blocking HTTP client with a substitutable call surface.
//!
//! Application code calls the free functions of this crate ([`get`],
//! [`post`], [`request`], [`session`], ...). Each of them dispatches through
//! the process-wide [`surface`] table, so a test harness can route all of
//! that traffic elsewhere without the application knowing.
//!
//! ## Sessions and adapters
//!
//! A [`Session`] holds adapters mounted under URL prefixes. The adapter with
//! the longest matching prefix services a request; URLs with no mount go to
//! the network through [`HttpAdapter`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use stackinabox_client::{HttpAdapter, HttpSession, RequestOptions, Session};
//!
//! let session = Session::new();
//! session.mount("https://api.example.com/", Arc::new(HttpAdapter::default()));
//!
//! let response = session.get("https://api.example.com/health", RequestOptions::new())?;
//! assert!(response.is_success());
//! # Ok::<(), stackinabox_client::ClientError>(())
//! ```

#![doc(html_root_url = "https://docs.rs/stackinabox-client/0.1.0")]

mod adapter;
mod error;
mod request;
mod response;
mod session;
pub mod surface;

pub use adapter::{Adapter, HttpAdapter, SharedAdapter};
pub use error::{ClientError, ClientResult};
pub use request::{parse_url, Body, PreparedRequest, Request, RequestOptions};
pub use response::Response;
pub use session::{
    Closing, HttpSession, SendSettings, Session, SessionId, SessionState, SharedSession,
};
pub use surface::{Binding, Symbol};

// Re-export http types for convenience
pub use http::{HeaderMap, Method, StatusCode};

/// Sends a request through the currently bound request function.
pub fn request(method: Method, url: &str, options: RequestOptions) -> ClientResult<Response> {
    let f = surface::request_fn();
    f(method, url, options)
}

fn call_verb(symbol: Symbol, url: &str, options: RequestOptions) -> ClientResult<Response> {
    match surface::verb_fn(symbol) {
        Some(f) => f(url, options),
        None => request(symbol.method().unwrap_or(Method::GET), url, options),
    }
}

/// Sends a GET request through the currently bound `get`.
pub fn get(url: &str, options: RequestOptions) -> ClientResult<Response> {
    call_verb(Symbol::Get, url, options)
}

/// Sends an OPTIONS request through the currently bound `options`.
pub fn options(url: &str, options: RequestOptions) -> ClientResult<Response> {
    call_verb(Symbol::Options, url, options)
}

/// Sends a HEAD request through the currently bound `head`.
pub fn head(url: &str, options: RequestOptions) -> ClientResult<Response> {
    call_verb(Symbol::Head, url, options)
}

/// Sends a POST request through the currently bound `post`.
pub fn post(url: &str, options: RequestOptions) -> ClientResult<Response> {
    call_verb(Symbol::Post, url, options)
}

/// Sends a PUT request through the currently bound `put`.
pub fn put(url: &str, options: RequestOptions) -> ClientResult<Response> {
    call_verb(Symbol::Put, url, options)
}

/// Sends a PATCH request through the currently bound `patch`.
pub fn patch(url: &str, options: RequestOptions) -> ClientResult<Response> {
    call_verb(Symbol::Patch, url, options)
}

/// Sends a DELETE request through the currently bound `delete`.
pub fn delete(url: &str, options: RequestOptions) -> ClientResult<Response> {
    call_verb(Symbol::Delete, url, options)
}

/// Constructs a session through the currently bound session constructor.
pub fn session() -> SharedSession {
    let f = surface::session_fn();
    f()
}
