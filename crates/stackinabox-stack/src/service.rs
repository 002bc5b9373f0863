//! Mock services.
//!
//! A service is addressed by the first path segment after the registered
//! base URI: with `svc.test/v1` registered, `http://svc.test/v1/widgets/7`
//! reaches the service named `widgets` with the remaining path `/7`.

use std::fmt;

use http::{Method, StatusCode};

use crate::message::{StackRequest, StackResponse};

/// A mock service mounted in a stack.
pub trait StackService: Send + Sync {
    /// Name the service is addressed by.
    fn name(&self) -> &str;

    /// Answers a request. `path` is relative to the service root and starts with `/`.
    fn handle(&self, request: &StackRequest, path: &str) -> StackResponse;
}

type Handler = Box<dyn Fn(&StackRequest, &str) -> StackResponse + Send + Sync>;

/// A service backed by a single closure.
///
/// # Example
///
/// ```rust
/// use stackinabox_stack::{FnService, StackResponse, StackService};
///
/// let service = FnService::new("echo", |_request, path| StackResponse::text(path));
/// assert_eq!(service.name(), "echo");
/// ```
pub struct FnService {
    name: String,
    handler: Handler,
}

impl FnService {
    /// Creates a service named `name` answered by `handler`.
    pub fn new<F>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&StackRequest, &str) -> StackResponse + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            handler: Box::new(handler),
        }
    }
}

impl fmt::Debug for FnService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnService").field("name", &self.name).finish()
    }
}

impl StackService for FnService {
    fn name(&self) -> &str {
        &self.name
    }

    fn handle(&self, request: &StackRequest, path: &str) -> StackResponse {
        (self.handler)(request, path)
    }
}

struct Route {
    method: Method,
    path: String,
    handler: Handler,
}

/// A service that dispatches on method and exact path.
///
/// An unknown path answers `595`; a known path with another method answers
/// `405 Method Not Allowed`.
///
/// ```rust
/// use http::Method;
/// use stackinabox_stack::{RoutedService, StackResponse};
///
/// let service = RoutedService::new("widgets")
///     .route(Method::GET, "/", |_, _| StackResponse::text("all widgets"))
///     .route(Method::POST, "/", |_, _| StackResponse::ok());
/// ```
pub struct RoutedService {
    name: String,
    routes: Vec<Route>,
}

impl RoutedService {
    /// Creates a service with no routes.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            routes: Vec::new(),
        }
    }

    /// Adds a route. Trailing slashes are ignored when matching.
    #[must_use]
    pub fn route<F>(mut self, method: Method, path: &str, handler: F) -> Self
    where
        F: Fn(&StackRequest, &str) -> StackResponse + Send + Sync + 'static,
    {
        self.routes.push(Route {
            method,
            path: normalize(path),
            handler: Box::new(handler),
        });
        self
    }
}

impl fmt::Debug for RoutedService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutedService")
            .field("name", &self.name)
            .field(
                "routes",
                &self
                    .routes
                    .iter()
                    .map(|r| format!("{} {}", r.method, r.path))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl StackService for RoutedService {
    fn name(&self) -> &str {
        &self.name
    }

    fn handle(&self, request: &StackRequest, path: &str) -> StackResponse {
        let path = normalize(path);
        let mut path_known = false;

        for route in self.routes.iter().filter(|r| r.path == path) {
            if route.method == request.method {
                return (route.handler)(request, &path);
            }
            path_known = true;
        }

        if path_known {
            StackResponse::new(StatusCode::METHOD_NOT_ALLOWED)
        } else {
            StackResponse::not_handled("Route Not Handled")
        }
    }
}

fn normalize(path: &str) -> String {
    let path = path.split('?').next().unwrap_or_default();
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}
