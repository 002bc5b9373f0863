//! Sessions and the `HttpSession` capability interface.
//!
//! A [`Session`] owns a set of adapters mounted under URL prefixes plus the
//! defaults (headers, timeout, redirect limit) applied to every request it
//! sends. Everything a caller can do with a session is described by the
//! [`HttpSession`] trait, so stand-ins that forward to another session only
//! implement the required operations and inherit the verb helpers.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;

use http::{HeaderMap, HeaderName, HeaderValue, Method};
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use stackinabox_config::ClientConfig;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::adapter::{HttpAdapter, SharedAdapter};
use crate::error::{ClientError, ClientResult};
use crate::request::{PreparedRequest, Request, RequestOptions};
use crate::response::Response;

/// Unique identifier of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generates a new time-ordered identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Settings that govern how one request is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendSettings {
    /// Follow redirects.
    pub allow_redirects: bool,
    /// Timeout for each hop.
    pub timeout: Option<Duration>,
    /// Maximum redirect hops.
    pub max_redirects: u32,
}

/// Serializable snapshot of a session's defaults and mount points.
///
/// Adapters themselves are live objects and are not captured; `mounts`
/// records where they were mounted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Default headers as name/value pairs.
    pub headers: Vec<(String, String)>,
    /// Default timeout in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Maximum redirect hops.
    pub max_redirects: u32,
    /// Mounted prefixes, longest first.
    pub mounts: Vec<String>,
}

/// The operations every session offers.
pub trait HttpSession: Send + Sync {
    /// Identifier of the session that actually handles traffic.
    fn id(&self) -> SessionId;

    /// Applies session defaults to a caller request.
    fn prepare_request(&self, request: &Request) -> ClientResult<PreparedRequest>;

    /// Merges per-request options with the session's defaults.
    fn merge_environment_settings(&self, options: &RequestOptions) -> SendSettings;

    /// Sends a prepared request through the matching adapter.
    fn send(&self, request: PreparedRequest, settings: &SendSettings) -> ClientResult<Response>;

    /// Prepares, routes and sends a request.
    fn request(&self, method: Method, url: &str, options: RequestOptions) -> ClientResult<Response>;

    /// Returns the adapter that would service `url`.
    fn get_adapter(&self, url: &str) -> ClientResult<SharedAdapter>;

    /// Mounts an adapter under a URL prefix.
    fn mount(&self, prefix: &str, adapter: SharedAdapter);

    /// Returns mounted prefixes, in lookup order.
    fn mounts(&self) -> Vec<String>;

    /// Releases adapter resources. Mounts stay in place.
    fn close(&self);

    /// Captures the session defaults.
    fn state(&self) -> SessionState;

    /// Restores session defaults from a snapshot.
    fn restore_state(&self, state: SessionState);

    /// Sends a GET request, following redirects unless told otherwise.
    fn get(&self, url: &str, options: RequestOptions) -> ClientResult<Response> {
        self.request(Method::GET, url, options.with_default_redirects(true))
    }

    /// Sends an OPTIONS request, following redirects unless told otherwise.
    fn options(&self, url: &str, options: RequestOptions) -> ClientResult<Response> {
        self.request(Method::OPTIONS, url, options.with_default_redirects(true))
    }

    /// Sends a HEAD request, not following redirects unless told otherwise.
    fn head(&self, url: &str, options: RequestOptions) -> ClientResult<Response> {
        self.request(Method::HEAD, url, options.with_default_redirects(false))
    }

    /// Sends a POST request.
    fn post(&self, url: &str, options: RequestOptions) -> ClientResult<Response> {
        self.request(Method::POST, url, options)
    }

    /// Sends a PUT request.
    fn put(&self, url: &str, options: RequestOptions) -> ClientResult<Response> {
        self.request(Method::PUT, url, options)
    }

    /// Sends a PATCH request.
    fn patch(&self, url: &str, options: RequestOptions) -> ClientResult<Response> {
        self.request(Method::PATCH, url, options)
    }

    /// Sends a DELETE request.
    fn delete(&self, url: &str, options: RequestOptions) -> ClientResult<Response> {
        self.request(Method::DELETE, url, options)
    }

    /// Borrows the session for a scope and closes it when the scope ends.
    fn scoped(&self) -> Closing<'_, Self>
    where
        Self: Sized,
    {
        Closing { session: self }
    }
}

/// Shared handle to any session implementation.
pub type SharedSession = Arc<dyn HttpSession>;

/// Scope guard returned by [`HttpSession::scoped`]; closes the session on drop.
pub struct Closing<'a, S: HttpSession> {
    session: &'a S,
}

impl<S: HttpSession> Deref for Closing<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.session
    }
}

impl<S: HttpSession> Drop for Closing<'_, S> {
    fn drop(&mut self) {
        self.session.close();
    }
}

struct Defaults {
    headers: HeaderMap,
    timeout: Option<Duration>,
    max_redirects: u32,
}

struct SessionInner {
    id: SessionId,
    adapters: RwLock<IndexMap<String, SharedAdapter>>,
    fallback: SharedAdapter,
    defaults: RwLock<Defaults>,
}

/// A session: mounted adapters plus request defaults.
///
/// Cloning a `Session` yields another handle to the same session.
///
/// # Example
///
/// ```no_run
/// use stackinabox_client::{HttpSession, RequestOptions, Session};
///
/// let session = Session::new();
/// let response = session.get("https://example.com/", RequestOptions::new())?;
/// println!("{}", response.status());
/// # Ok::<(), stackinabox_client::ClientError>(())
/// ```
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    /// Creates a session with default configuration and no mounts.
    pub fn new() -> Self {
        Self::with_config(&ClientConfig::default())
    }

    /// Creates a session from client configuration.
    pub fn with_config(config: &ClientConfig) -> Self {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::try_from(config.user_agent.as_str()) {
            headers.insert(http::header::USER_AGENT, value);
        }
        headers.insert(http::header::ACCEPT, HeaderValue::from_static("*/*"));

        let session = Self {
            inner: Arc::new(SessionInner {
                id: SessionId::new(),
                adapters: RwLock::new(IndexMap::new()),
                fallback: Arc::new(HttpAdapter::new(config.clone())),
                defaults: RwLock::new(Defaults {
                    headers,
                    timeout: config.timeout_ms.map(Duration::from_millis),
                    max_redirects: config.max_redirects,
                }),
            }),
        };
        trace!(session_id = %session.inner.id, "Session created");
        session
    }

    /// Sets a default header sent with every request.
    pub fn set_header(&self, name: &str, value: &str) -> ClientResult<()> {
        let header_name =
            HeaderName::try_from(name).map_err(|e| ClientError::invalid_header(name, e))?;
        let header_value =
            HeaderValue::try_from(value).map_err(|e| ClientError::invalid_header(name, e))?;
        self.inner.defaults.write().headers.insert(header_name, header_value);
        Ok(())
    }

    /// Returns true if both handles refer to the same session.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn lookup_mount(&self, url: &str) -> Option<SharedAdapter> {
        let url = url.to_lowercase();
        self.inner
            .adapters
            .read()
            .iter()
            .find(|(prefix, _)| url.starts_with(prefix.as_str()))
            .map(|(_, adapter)| Arc::clone(adapter))
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.inner.id)
            .field("mounts", &self.mounts())
            .finish()
    }
}

impl HttpSession for Session {
    fn id(&self) -> SessionId {
        self.inner.id
    }

    fn prepare_request(&self, request: &Request) -> ClientResult<PreparedRequest> {
        let defaults = self.inner.defaults.read();
        PreparedRequest::prepare(request, &defaults.headers)
    }

    fn merge_environment_settings(&self, options: &RequestOptions) -> SendSettings {
        let defaults = self.inner.defaults.read();
        SendSettings {
            allow_redirects: options.allow_redirects.unwrap_or(true),
            timeout: options.timeout.or(defaults.timeout),
            max_redirects: defaults.max_redirects,
        }
    }

    fn send(&self, request: PreparedRequest, settings: &SendSettings) -> ClientResult<Response> {
        let mut request = request;
        let mut history = Vec::new();

        loop {
            let adapter = self.get_adapter(request.url.as_str())?;
            let response = adapter.send(&request, settings)?;

            if !settings.allow_redirects {
                return Ok(response.with_history(history));
            }
            let Some(location) = response.redirect_location() else {
                return Ok(response.with_history(history));
            };

            if history.len() >= settings.max_redirects as usize {
                return Err(ClientError::TooManyRedirects {
                    max: settings.max_redirects,
                });
            }

            let next = request
                .url
                .join(location)
                .map_err(|e| ClientError::invalid_url(location, e))?;
            debug!(
                session_id = %self.inner.id,
                from = %request.url,
                to = %next,
                "Following redirect"
            );
            history.push(request.url.clone());
            request = request.redirected(next, response.status());
        }
    }

    fn request(&self, method: Method, url: &str, options: RequestOptions) -> ClientResult<Response> {
        let settings = self.merge_environment_settings(&options);
        let prepared = self.prepare_request(&Request::new(method, url, options))?;
        self.send(prepared, &settings)
    }

    fn get_adapter(&self, url: &str) -> ClientResult<SharedAdapter> {
        if let Some(adapter) = self.lookup_mount(url) {
            return Ok(adapter);
        }

        let lower = url.to_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return Ok(Arc::clone(&self.inner.fallback));
        }

        Err(ClientError::NoAdapter {
            url: url.to_string(),
        })
    }

    fn mount(&self, prefix: &str, adapter: SharedAdapter) {
        let prefix = prefix.to_lowercase();
        debug!(session_id = %self.inner.id, mount = %prefix, "Mounting adapter");

        let mut adapters = self.inner.adapters.write();
        adapters.insert(prefix, adapter);
        // Longest prefix first; stable so equal lengths keep mount order
        adapters.sort_by(|a, _, b, _| b.len().cmp(&a.len()));
    }

    fn mounts(&self) -> Vec<String> {
        self.inner.adapters.read().keys().cloned().collect()
    }

    fn close(&self) {
        trace!(session_id = %self.inner.id, "Closing session adapters");
        let adapters: Vec<SharedAdapter> = self.inner.adapters.read().values().cloned().collect();
        for adapter in adapters {
            adapter.close();
        }
        self.inner.fallback.close();
    }

    fn state(&self) -> SessionState {
        let defaults = self.inner.defaults.read();
        SessionState {
            headers: defaults
                .headers
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.as_str().to_string(), v.to_string()))
                })
                .collect(),
            timeout_ms: defaults
                .timeout
                .map(|t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX)),
            max_redirects: defaults.max_redirects,
            mounts: self.mounts(),
        }
    }

    fn restore_state(&self, state: SessionState) {
        let mut headers = HeaderMap::new();
        for (name, value) in &state.headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::try_from(name.as_str()),
                HeaderValue::try_from(value.as_str()),
            ) {
                headers.append(name, value);
            }
        }

        let mut defaults = self.inner.defaults.write();
        defaults.headers = headers;
        defaults.timeout = state.timeout_ms.map(Duration::from_millis);
        defaults.max_redirects = state.max_redirects;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::Adapter;
    use bytes::Bytes;
    use http::StatusCode;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers from a fixed list of (path, status, location) entries and records calls.
    #[derive(Debug, Default)]
    struct ScriptedAdapter {
        routes: Vec<(&'static str, StatusCode, Option<&'static str>)>,
        seen: Mutex<Vec<(Method, String)>>,
        closed: AtomicUsize,
    }

    impl ScriptedAdapter {
        fn new(routes: Vec<(&'static str, StatusCode, Option<&'static str>)>) -> Arc<Self> {
            Arc::new(Self {
                routes,
                ..Self::default()
            })
        }
    }

    impl Adapter for ScriptedAdapter {
        fn send(&self, request: &PreparedRequest, _settings: &SendSettings) -> ClientResult<Response> {
            self.seen
                .lock()
                .push((request.method.clone(), request.url.to_string()));

            let (status, location) = self
                .routes
                .iter()
                .find(|(path, _, _)| *path == request.url.path())
                .map_or((StatusCode::NOT_FOUND, None), |(_, s, l)| (*s, *l));

            let mut headers = HeaderMap::new();
            if let Some(location) = location {
                headers.insert(http::header::LOCATION, HeaderValue::from_static(location));
            }
            Ok(Response::new(
                status,
                headers,
                Bytes::from(request.url.path().to_string()),
                request.url.clone(),
            ))
        }

        fn close(&self) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_new_session_has_no_mounts() {
        let session = Session::new();
        assert!(session.mounts().is_empty());
    }

    #[test]
    fn test_sessions_have_distinct_ids() {
        assert_ne!(Session::new().id(), Session::new().id());
    }

    #[test]
    fn test_clone_shares_state() {
        let session = Session::new();
        let clone = session.clone();
        clone.mount("http://svc.test/", ScriptedAdapter::new(vec![]));

        assert!(session.ptr_eq(&clone));
        assert_eq!(session.mounts(), vec!["http://svc.test/"]);
    }

    #[test]
    fn test_longest_prefix_wins() {
        let session = Session::new();
        let short = ScriptedAdapter::new(vec![("/v1/widgets", StatusCode::OK, None)]);
        let long = ScriptedAdapter::new(vec![("/v1/widgets", StatusCode::ACCEPTED, None)]);

        session.mount("http://svc.test/", short);
        session.mount("http://svc.test/v1/", long);

        assert_eq!(session.mounts(), vec!["http://svc.test/v1/", "http://svc.test/"]);
        let response = session
            .get("http://svc.test/v1/widgets", RequestOptions::new())
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[test]
    fn test_mount_is_case_insensitive() {
        let session = Session::new();
        session.mount(
            "HTTP://SVC.test/",
            ScriptedAdapter::new(vec![("/x", StatusCode::OK, None)]),
        );

        let response = session.get("http://svc.TEST/x", RequestOptions::new()).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_remount_replaces_adapter() {
        let session = Session::new();
        session.mount("http://svc.test/", ScriptedAdapter::new(vec![]));
        session.mount(
            "http://svc.test/",
            ScriptedAdapter::new(vec![("/x", StatusCode::OK, None)]),
        );

        assert_eq!(session.mounts().len(), 1);
        let response = session.get("http://svc.test/x", RequestOptions::new()).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_unsupported_scheme_has_no_adapter() {
        let session = Session::new();
        let result = session.get_adapter("ftp://svc.test/file");
        assert!(matches!(result, Err(ClientError::NoAdapter { .. })));
    }

    #[test]
    fn test_get_follows_redirects() {
        let session = Session::new();
        let adapter = ScriptedAdapter::new(vec![
            ("/old", StatusCode::MOVED_PERMANENTLY, Some("/new")),
            ("/new", StatusCode::OK, None),
        ]);
        session.mount("http://svc.test/", adapter.clone());

        let response = session.get("http://svc.test/old", RequestOptions::new()).unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.url().path(), "/new");
        assert_eq!(response.history().len(), 1);
        assert_eq!(adapter.seen.lock().len(), 2);
    }

    #[test]
    fn test_head_does_not_follow_redirects() {
        let session = Session::new();
        session.mount(
            "http://svc.test/",
            ScriptedAdapter::new(vec![("/old", StatusCode::FOUND, Some("/new"))]),
        );

        let response = session.head("http://svc.test/old", RequestOptions::new()).unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
    }

    #[test]
    fn test_explicit_redirect_option_overrides_default() {
        let session = Session::new();
        session.mount(
            "http://svc.test/",
            ScriptedAdapter::new(vec![
                ("/old", StatusCode::FOUND, Some("/new")),
                ("/new", StatusCode::OK, None),
            ]),
        );

        let response = session
            .get("http://svc.test/old", RequestOptions::new().allow_redirects(false))
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);

        let response = session
            .head("http://svc.test/old", RequestOptions::new().allow_redirects(true))
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_redirect_loop_is_bounded() {
        let session = Session::with_config(&ClientConfig {
            max_redirects: 3,
            ..ClientConfig::default()
        });
        session.mount(
            "http://svc.test/",
            ScriptedAdapter::new(vec![("/loop", StatusCode::FOUND, Some("/loop"))]),
        );

        let result = session.get("http://svc.test/loop", RequestOptions::new());
        assert!(matches!(result, Err(ClientError::TooManyRedirects { max: 3 })));
    }

    #[test]
    fn test_default_headers_applied() {
        let session = Session::new();
        session.set_header("X-Suite", "integration").unwrap();

        let prepared = session
            .prepare_request(&Request::new(Method::GET, "http://svc.test/", RequestOptions::new()))
            .unwrap();

        assert_eq!(prepared.headers.get("x-suite").unwrap(), "integration");
        assert!(prepared.headers.contains_key(http::header::USER_AGENT));
    }

    #[test]
    fn test_merge_settings_prefers_request_timeout() {
        let session = Session::with_config(&ClientConfig {
            timeout_ms: Some(1_000),
            ..ClientConfig::default()
        });

        let settings = session.merge_environment_settings(&RequestOptions::new());
        assert_eq!(settings.timeout, Some(Duration::from_secs(1)));
        assert!(settings.allow_redirects);

        let settings = session
            .merge_environment_settings(&RequestOptions::new().timeout(Duration::from_millis(5)));
        assert_eq!(settings.timeout, Some(Duration::from_millis(5)));
    }

    #[test]
    fn test_close_keeps_mounts() {
        let session = Session::new();
        let adapter = ScriptedAdapter::new(vec![]);
        session.mount("http://svc.test/", adapter.clone());

        session.close();

        assert_eq!(adapter.closed.load(Ordering::SeqCst), 1);
        assert_eq!(session.mounts().len(), 1);
    }

    #[test]
    fn test_scoped_closes_on_drop() {
        let session = Session::new();
        let adapter = ScriptedAdapter::new(vec![("/x", StatusCode::OK, None)]);
        session.mount("http://svc.test/", adapter.clone());

        {
            let scoped = session.scoped();
            scoped.get("http://svc.test/x", RequestOptions::new()).unwrap();
            assert_eq!(adapter.closed.load(Ordering::SeqCst), 0);
        }

        assert_eq!(adapter.closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_state_round_trip() {
        let source = Session::with_config(&ClientConfig {
            timeout_ms: Some(250),
            max_redirects: 4,
            ..ClientConfig::default()
        });
        source.set_header("X-Suite", "state").unwrap();
        source.mount("http://svc.test/", ScriptedAdapter::new(vec![]));

        let state = source.state();
        assert_eq!(state.mounts, vec!["http://svc.test/"]);

        let json = serde_json::to_string(&state).unwrap();
        let target = Session::new();
        target.restore_state(serde_json::from_str(&json).unwrap());

        let restored = target.state();
        assert_eq!(restored.timeout_ms, Some(250));
        assert_eq!(restored.max_redirects, 4);
        assert!(restored
            .headers
            .iter()
            .any(|(name, value)| name == "x-suite" && value == "state"));
        assert!(restored.mounts.is_empty());
    }
}
