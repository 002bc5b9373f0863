//! Request building and preparation.

use std::time::Duration;

use bytes::Bytes;
use http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use url::Url;

use crate::error::{ClientError, ClientResult};

/// Request body supplied by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Raw bytes, sent as-is.
    Raw(Bytes),
    /// A JSON document; sets `Content-Type: application/json` unless overridden.
    Json(serde_json::Value),
    /// Form fields; sets `Content-Type: application/x-www-form-urlencoded` unless overridden.
    Form(Vec<(String, String)>),
}

/// Per-call options accepted by every request entry point.
///
/// # Example
///
/// ```
/// use stackinabox_client::RequestOptions;
/// use serde_json::json;
///
/// let options = RequestOptions::new()
///     .header("X-Trace", "abc")
///     .param("page", "2")
///     .json(json!({"name": "widget"}));
///
/// assert_eq!(options.allow_redirects, None);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[must_use]
pub struct RequestOptions {
    /// Headers added on top of the session headers.
    pub headers: Vec<(String, String)>,
    /// Query parameters appended to the URL.
    pub params: Vec<(String, String)>,
    /// Request body.
    pub body: Option<Body>,
    /// Follow redirects. None lets the entry point pick its default.
    pub allow_redirects: Option<bool>,
    /// Per-request timeout; overrides the session default.
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    /// Creates empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Adds a query parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// Sets a raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(Body::Raw(body.into()));
        self
    }

    /// Sets a JSON body.
    pub fn json(mut self, value: serde_json::Value) -> Self {
        self.body = Some(Body::Json(value));
        self
    }

    /// Sets a form-urlencoded body.
    pub fn form<K, V>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.body = Some(Body::Form(
            fields.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        ));
        self
    }

    /// Sets redirect following explicitly.
    pub fn allow_redirects(mut self, allow: bool) -> Self {
        self.allow_redirects = Some(allow);
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets redirect following only if the caller left it unset.
    pub fn with_default_redirects(mut self, allow: bool) -> Self {
        self.allow_redirects.get_or_insert(allow);
        self
    }
}

/// An unprepared request: method, URL and caller options.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// HTTP method.
    pub method: Method,
    /// URL as supplied by the caller.
    pub url: String,
    /// Caller options.
    pub options: RequestOptions,
}

impl Request {
    /// Creates a new request.
    pub fn new(method: Method, url: impl Into<String>, options: RequestOptions) -> Self {
        Self {
            method,
            url: url.into(),
            options,
        }
    }
}

/// A request ready to hand to an adapter: parsed URL, final headers and encoded body.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL including query parameters.
    pub url: Url,
    /// Final header set.
    pub headers: HeaderMap,
    /// Encoded body.
    pub body: Bytes,
}

impl PreparedRequest {
    /// Prepares `request` on top of the given base headers.
    pub fn prepare(request: &Request, base_headers: &HeaderMap) -> ClientResult<Self> {
        let mut url = parse_url(&request.url)?;

        if !request.options.params.is_empty() {
            url.query_pairs_mut().extend_pairs(
                request
                    .options
                    .params
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str())),
            );
        }

        let mut headers = base_headers.clone();
        for (name, value) in &request.options.headers {
            let header_name = HeaderName::try_from(name.as_str())
                .map_err(|e| ClientError::invalid_header(name, e))?;
            let header_value = HeaderValue::try_from(value.as_str())
                .map_err(|e| ClientError::invalid_header(name, e))?;
            headers.insert(header_name, header_value);
        }

        let body = match &request.options.body {
            None => Bytes::new(),
            Some(Body::Raw(bytes)) => bytes.clone(),
            Some(Body::Json(value)) => {
                set_default_content_type(&mut headers, "application/json");
                Bytes::from(serde_json::to_vec(value)?)
            }
            Some(Body::Form(fields)) => {
                set_default_content_type(&mut headers, "application/x-www-form-urlencoded");
                Bytes::from(encode_form(fields))
            }
        };

        Ok(Self {
            method: request.method.clone(),
            url,
            headers,
            body,
        })
    }

    /// Returns the request for the next hop of a redirect.
    ///
    /// `303 See Other` always becomes a body-less `GET`; `301`/`302` turn a
    /// `POST` into a body-less `GET`. `307`/`308` keep method and body.
    #[must_use]
    pub fn redirected(&self, location: Url, status: StatusCode) -> Self {
        let downgrade = (status == StatusCode::SEE_OTHER && self.method != Method::HEAD)
            || (matches!(status, StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND)
                && self.method == Method::POST);

        let mut next = self.clone();
        if location.host_str() != self.url.host_str() {
            next.headers.remove(header::AUTHORIZATION);
        }
        next.url = location;

        if downgrade {
            next.method = Method::GET;
            next.body = Bytes::new();
            next.headers.remove(header::CONTENT_TYPE);
            next.headers.remove(header::CONTENT_LENGTH);
        }
        next
    }
}

/// Parses an absolute URL, rejecting scheme-less input.
pub fn parse_url(url: &str) -> ClientResult<Url> {
    Url::parse(url).map_err(|e| ClientError::invalid_url(url, e))
}

fn set_default_content_type(headers: &mut HeaderMap, value: &'static str) {
    if !headers.contains_key(header::CONTENT_TYPE) {
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(value));
    }
}

fn encode_form(fields: &[(String, String)]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}
