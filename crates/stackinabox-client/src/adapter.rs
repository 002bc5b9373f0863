//! Transport adapters.
//!
//! A session hands every prepared request to the adapter mounted under the
//! longest matching URL prefix. When nothing is mounted for a URL the session
//! falls back to [`HttpAdapter`], which performs a real network call.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use stackinabox_config::ClientConfig;
use tracing::{debug, trace};

use crate::error::ClientResult;
use crate::request::PreparedRequest;
use crate::response::Response;
use crate::session::SendSettings;

/// Something that can turn a prepared request into a response.
pub trait Adapter: Send + Sync + fmt::Debug {
    /// Sends the request and returns the response.
    fn send(&self, request: &PreparedRequest, settings: &SendSettings) -> ClientResult<Response>;

    /// Releases any pooled resources. The adapter stays usable afterwards.
    fn close(&self) {}
}

/// Shared handle to a mounted adapter.
pub type SharedAdapter = Arc<dyn Adapter>;

/// Network adapter backed by a blocking `reqwest` client.
///
/// The underlying client is built on first use, so sessions that only ever
/// talk to mounted mocks never start a connection pool.
pub struct HttpAdapter {
    config: ClientConfig,
    client: Mutex<Option<reqwest::blocking::Client>>,
}

impl HttpAdapter {
    /// Creates an adapter using the given client configuration.
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            client: Mutex::new(None),
        }
    }

    fn client(&self) -> ClientResult<reqwest::blocking::Client> {
        let mut slot = self.client.lock();
        if let Some(client) = slot.as_ref() {
            return Ok(client.clone());
        }

        let client = reqwest::blocking::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .danger_accept_invalid_certs(!self.config.verify_tls)
            .timeout(self.config.timeout_ms.map(Duration::from_millis))
            .build()?;
        debug!(verify_tls = self.config.verify_tls, "Built network client");

        *slot = Some(client.clone());
        Ok(client)
    }
}

impl Default for HttpAdapter {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

impl fmt::Debug for HttpAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpAdapter")
            .field("config", &self.config)
            .field("connected", &self.client.lock().is_some())
            .finish()
    }
}

impl Adapter for HttpAdapter {
    fn send(&self, request: &PreparedRequest, settings: &SendSettings) -> ClientResult<Response> {
        debug!(
            http.method = %request.method,
            http.url = %request.url,
            "Sending request over the network"
        );

        let client = self.client()?;
        let mut builder = client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone())
            .body(request.body.to_vec());
        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send()?;
        let status = response.status();
        let headers = response.headers().clone();
        let url = response.url().clone();
        let body = response.bytes()?;

        debug!(http.status_code = status.as_u16(), "Network response received");
        Ok(Response::new(status, headers, body, url))
    }

    fn close(&self) {
        trace!("Network adapter close requested; pooled connections are kept");
    }
}
