//! Request and response types exchanged with mock services.

use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use serde::Serialize;
use url::Url;

/// Status returned when no service claimed a request.
pub const NOT_HANDLED: u16 = 595;

/// A request as seen by the stack.
#[derive(Debug, Clone)]
pub struct StackRequest {
    /// HTTP method.
    pub method: Method,
    /// The full request URL.
    pub url: Url,
    /// Path relative to the registered base URI, always starting with `/`.
    pub path: String,
    /// Request headers.
    pub headers: HeaderMap,
    /// Request body.
    pub body: Bytes,
}

impl StackRequest {
    /// Creates a request with no headers and an empty body.
    pub fn new(method: Method, url: Url, path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            method,
            url,
            path: if path.starts_with('/') {
                path
            } else {
                format!("/{path}")
            },
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Sets the headers.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Returns the value of the first query parameter called `name`.
    pub fn query(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }

    /// Returns a header value as a string.
    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// A response produced by a mock service.
#[derive(Debug, Clone, PartialEq)]
pub struct StackResponse {
    /// Status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body.
    pub body: Bytes,
}

impl StackResponse {
    /// Creates an empty response with the given status.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// 200 with an empty body.
    pub fn ok() -> Self {
        Self::new(StatusCode::OK)
    }

    /// 200 with a plain-text body.
    pub fn text(body: impl Into<String>) -> Self {
        Self::ok()
            .with_header(header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"))
            .with_body(body.into())
    }

    /// 200 with a JSON body. Falls back to 500 if `value` cannot be serialized.
    pub fn json<T: Serialize>(value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self::ok()
                .with_header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .with_body(body),
            Err(e) => Self::new(StatusCode::INTERNAL_SERVER_ERROR).with_body(e.to_string()),
        }
    }

    /// The "no service handled this request" response.
    pub fn not_handled(reason: &str) -> Self {
        let status = StatusCode::from_u16(NOT_HANDLED).unwrap_or(StatusCode::NOT_IMPLEMENTED);
        Self::new(status).with_body(reason.to_string())
    }

    /// Returns true if no service handled the request.
    #[must_use]
    pub fn is_not_handled(&self) -> bool {
        self.status.as_u16() == NOT_HANDLED
    }

    /// Sets the status.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: header::HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_path_gets_leading_slash() {
        let url = Url::parse("http://svc.test/v1/widgets").unwrap();
        let request = StackRequest::new(Method::GET, url, "widgets");
        assert_eq!(request.path, "/widgets");
    }

    #[test]
    fn test_request_query() {
        let url = Url::parse("http://svc.test/v1/widgets?page=2&sort=asc").unwrap();
        let request = StackRequest::new(Method::GET, url, "/widgets");
        assert_eq!(request.query("sort").as_deref(), Some("asc"));
        assert_eq!(request.query("missing"), None);
    }

    #[test]
    fn test_json_response() {
        let response = StackResponse::json(&json!({"id": 7}));
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(
            response.headers.get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert_eq!(response.body.as_ref(), br#"{"id":7}"#);
    }

    #[test]
    fn test_not_handled() {
        let response = StackResponse::not_handled("no such service");
        assert_eq!(response.status.as_u16(), 595);
        assert!(response.is_not_handled());
        assert!(!StackResponse::ok().is_not_handled());
    }
}
