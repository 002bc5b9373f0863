//! Mock transport adapter.

use std::fmt;

use parking_lot::{Mutex, RwLock};
use stackinabox_client::{Adapter, ClientError, ClientResult, PreparedRequest, Response, SendSettings};
use tracing::debug;

use crate::matcher::{canonical_uri, Matcher};

/// A transport adapter that answers from its matchers instead of the network.
///
/// Matchers are consulted most recently added first; the first one that
/// claims a request decides the outcome. A request no matcher claims fails
/// with [`ClientError::NoMockAddress`].
#[derive(Default)]
pub struct MockAdapter {
    matchers: RwLock<Vec<Box<dyn Matcher>>>,
    history: Mutex<Vec<PreparedRequest>>,
}

impl MockAdapter {
    /// Creates an adapter with no matchers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a matcher.
    pub fn add_matcher(&self, matcher: Box<dyn Matcher>) {
        debug!(matcher = ?matcher, "Matcher added");
        self.matchers.write().push(matcher);
    }

    /// Number of matchers.
    pub fn matcher_count(&self) -> usize {
        self.matchers.read().len()
    }

    /// Returns true if a matcher is bound to `uri` (scheme and trailing `/` ignored).
    pub fn has_matcher_for(&self, uri: &str) -> bool {
        let uri = canonical_uri(uri);
        self.matchers
            .read()
            .iter()
            .filter_map(|m| m.uri())
            .any(|m| m.eq_ignore_ascii_case(&uri))
    }

    /// Requests this adapter has seen, oldest first.
    pub fn request_history(&self) -> Vec<PreparedRequest> {
        self.history.lock().clone()
    }

    /// Number of requests this adapter has seen.
    pub fn call_count(&self) -> usize {
        self.history.lock().len()
    }

    /// Returns true if the adapter has seen at least one request.
    pub fn called(&self) -> bool {
        self.call_count() > 0
    }
}

impl fmt::Debug for MockAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockAdapter")
            .field("matchers", &*self.matchers.read())
            .field("calls", &self.call_count())
            .finish()
    }
}

impl Adapter for MockAdapter {
    fn send(&self, request: &PreparedRequest, _settings: &SendSettings) -> ClientResult<Response> {
        self.history.lock().push(request.clone());

        let matchers = self.matchers.read();
        for matcher in matchers.iter().rev() {
            if let Some(outcome) = matcher.try_match(request) {
                return outcome;
            }
        }

        debug!(http.method = %request.method, http.url = %request.url, "No matcher claimed request");
        Err(ClientError::NoMockAddress {
            method: request.method.clone(),
            url: request.url.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{HeaderMap, Method, StatusCode};
    use stackinabox_client::{Request, RequestOptions};

    #[derive(Debug)]
    struct Fixed {
        host: &'static str,
        status: StatusCode,
    }

    impl Matcher for Fixed {
        fn try_match(&self, request: &PreparedRequest) -> Option<ClientResult<Response>> {
            (request.url.host_str() == Some(self.host)).then(|| {
                Ok(Response::new(
                    self.status,
                    HeaderMap::new(),
                    Bytes::new(),
                    request.url.clone(),
                ))
            })
        }
    }

    fn settings() -> SendSettings {
        SendSettings {
            allow_redirects: true,
            timeout: None,
            max_redirects: 30,
        }
    }

    fn prepared(url: &str) -> PreparedRequest {
        PreparedRequest::prepare(
            &Request::new(Method::GET, url, RequestOptions::new()),
            &HeaderMap::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_most_recent_matcher_wins() {
        let adapter = MockAdapter::new();
        adapter.add_matcher(Box::new(Fixed {
            host: "svc.test",
            status: StatusCode::OK,
        }));
        adapter.add_matcher(Box::new(Fixed {
            host: "svc.test",
            status: StatusCode::CREATED,
        }));

        let response = adapter.send(&prepared("http://svc.test/"), &settings()).unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(adapter.matcher_count(), 2);
    }

    #[test]
    fn test_unmatched_request_is_no_mock_address() {
        let adapter = MockAdapter::new();
        adapter.add_matcher(Box::new(Fixed {
            host: "svc.test",
            status: StatusCode::OK,
        }));

        let err = adapter
            .send(&prepared("http://other.test/"), &settings())
            .unwrap_err();
        assert!(matches!(err, ClientError::NoMockAddress { .. }));
    }

    #[test]
    fn test_history_records_requests() {
        let adapter = MockAdapter::new();
        assert!(!adapter.called());

        let _ = adapter.send(&prepared("http://svc.test/a"), &settings());
        let _ = adapter.send(&prepared("http://svc.test/b"), &settings());

        let history = adapter.request_history();
        assert_eq!(adapter.call_count(), 2);
        assert_eq!(history[1].url.path(), "/b");
    }
}
