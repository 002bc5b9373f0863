//! Request matchers.

use std::fmt;
use std::sync::Arc;

use stackinabox_client::{ClientError, ClientResult, PreparedRequest, Response};
use stackinabox_stack::{ServiceStack, StackRequest};
use tracing::{debug, trace};
use url::Url;

/// Decides whether it services a request, and if so produces the outcome.
pub trait Matcher: Send + Sync + fmt::Debug {
    /// Returns `None` if the request is not for this matcher.
    fn try_match(&self, request: &PreparedRequest) -> Option<ClientResult<Response>>;

    /// The base URI this matcher is bound to, if any.
    fn uri(&self) -> Option<&str> {
        None
    }
}

/// Matches requests under a base URI and answers them from a service stack.
///
/// The URI is scheme-agnostic: `svc.test/v1` matches both
/// `http://svc.test/v1/...` and `https://svc.test/v1/...`. An explicit port
/// only matches requests to that port; without one, only requests on the
/// scheme's default port match. A stack answer of `595` becomes
/// [`ClientError::Connection`].
pub struct UriMatcher {
    uri: String,
    host: String,
    port: Option<u16>,
    path: String,
    stack: Arc<dyn ServiceStack>,
}

impl UriMatcher {
    /// Binds `uri` to `stack`.
    pub fn new(uri: &str, stack: Arc<dyn ServiceStack>) -> Self {
        let uri = canonical_uri(uri);
        // A scheme with no default port keeps `:80` and `:443` as written
        let (host, port, path) = match Url::parse(&format!("stackinabox://{uri}")) {
            Ok(base) => (
                base.host_str().unwrap_or_default().to_string(),
                base.port(),
                base.path().trim_end_matches('/').to_string(),
            ),
            Err(e) => {
                debug!(uri = %uri, error = %e, "Base URI is not a valid authority");
                (uri.clone(), None, String::new())
            }
        };

        Self {
            uri,
            host,
            port,
            path,
            stack,
        }
    }

    /// Returns the request path relative to the base URI, or `None` if the
    /// URL is not under it.
    pub fn relative_path(&self, url: &Url) -> Option<String> {
        if !url.host_str()?.eq_ignore_ascii_case(&self.host) {
            return None;
        }
        let port_matches = match self.port {
            Some(port) => url.port_or_known_default() == Some(port),
            None => url.port().is_none(),
        };
        if !port_matches {
            return None;
        }

        let target = url.path();
        let prefix = target.get(..self.path.len())?;
        if !prefix.eq_ignore_ascii_case(&self.path) {
            return None;
        }

        let rest = &target[self.path.len()..];
        if rest.is_empty() {
            Some("/".to_string())
        } else if rest.starts_with('/') {
            Some(rest.to_string())
        } else {
            // `svc.test/v1` must not claim `svc.test/v10`
            None
        }
    }
}

impl fmt::Debug for UriMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UriMatcher").field("uri", &self.uri).finish()
    }
}

impl Matcher for UriMatcher {
    fn try_match(&self, request: &PreparedRequest) -> Option<ClientResult<Response>> {
        let path = self.relative_path(&request.url)?;
        trace!(uri = %self.uri, path = %path, "Request matched");

        let stack_request = StackRequest::new(request.method.clone(), request.url.clone(), path)
            .with_headers(request.headers.clone())
            .with_body(request.body.clone());
        let answer = self.stack.call(&stack_request);

        if answer.is_not_handled() {
            debug!(
                http.method = %request.method,
                http.url = %request.url,
                "Stack did not handle request"
            );
            let reason = String::from_utf8_lossy(&answer.body).into_owned();
            return Some(Err(ClientError::Connection(format!(
                "{} {}: {reason}",
                request.method, request.url
            ))));
        }

        Some(Ok(Response::new(
            answer.status,
            answer.headers,
            answer.body,
            request.url.clone(),
        )))
    }

    fn uri(&self) -> Option<&str> {
        Some(&self.uri)
    }
}

/// Strips any scheme and trailing `/` from a base URI.
pub(crate) fn canonical_uri(uri: &str) -> String {
    let uri = uri.split_once("://").map_or(uri, |(_, rest)| rest);
    uri.trim_end_matches('/').to_string()
}
