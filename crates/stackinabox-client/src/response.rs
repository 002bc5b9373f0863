//! Response type returned by sessions and adapters.

use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{ClientError, ClientResult};

/// An HTTP response with its body fully buffered.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    url: Url,
    history: Vec<Url>,
}

impl Response {
    /// Creates a response for the given request URL.
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes, url: Url) -> Self {
        Self {
            status,
            headers,
            body,
            url,
            history: Vec::new(),
        }
    }

    /// Attaches the URLs visited before this response, oldest first.
    #[must_use]
    pub fn with_history(mut self, history: Vec<Url>) -> Self {
        self.history = history;
        self
    }

    /// Returns the status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the status code as a u16.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Returns true if the status is successful (2xx).
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns true if this is a redirect the session can follow.
    #[must_use]
    pub fn is_redirect(&self) -> bool {
        self.redirect_location().is_some()
    }

    /// Returns the `Location` of a followable redirect.
    #[must_use]
    pub fn redirect_location(&self) -> Option<&str> {
        match self.status {
            StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT => self.header_str(header::LOCATION.as_str()),
            _ => None,
        }
    }

    /// Returns the URL this response was served for.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Returns the URLs of the redirect hops that led here.
    #[must_use]
    pub fn history(&self) -> &[Url] {
        &self.history
    }

    /// Returns a reference to the headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Gets a header value by name.
    #[must_use]
    pub fn header(&self, name: impl AsRef<str>) -> Option<&HeaderValue> {
        self.headers.get(name.as_ref())
    }

    /// Gets a header value as a string.
    #[must_use]
    pub fn header_str(&self, name: impl AsRef<str>) -> Option<&str> {
        self.header(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the Content-Type header value.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header_str(header::CONTENT_TYPE.as_str())
    }

    /// Returns the raw body bytes.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the body as a string.
    ///
    /// Returns an error if the body is not valid UTF-8.
    pub fn text(&self) -> ClientResult<String> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| ClientError::BodyRead(format!("Invalid UTF-8: {e}")))
    }

    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> ClientResult<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Deserializes the body as a JSON Value.
    pub fn json_value(&self) -> ClientResult<serde_json::Value> {
        self.json()
    }

    /// Asserts that the status code equals the expected value.
    ///
    /// # Panics
    ///
    /// Panics if the status code doesn't match.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status, expected,
            "Expected status {}, got {} for {}",
            expected, self.status, self.url
        );
        self
    }
}
