//! The service stack.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::error::{StackError, StackResult};
use crate::message::{StackRequest, StackResponse};
use crate::service::StackService;

/// A value kept in a stack's keyed storage.
pub type Held = Arc<dyn Any + Send + Sync>;

/// What an interception layer needs from a mock-service framework.
pub trait ServiceStack: Send + Sync {
    /// Records the base URI the stack is served under.
    fn update_uri(&self, uri: &str);

    /// Stores `value` under `key`, replacing any previous value.
    fn hold_onto(&self, key: &str, value: Held);

    /// Returns the value stored under `key`.
    fn hold_out(&self, key: &str) -> Option<Held>;

    /// Answers a request whose `path` is relative to the base URI.
    fn call(&self, request: &StackRequest) -> StackResponse;
}

const DEFAULT_BASE_URI: &str = "localhost";

/// A stack of named mock services.
///
/// # Example
///
/// ```rust
/// use http::Method;
/// use stackinabox_stack::{FnService, ServiceStack, StackInABox, StackRequest, StackResponse};
/// use url::Url;
///
/// let stack = StackInABox::new();
/// stack.register(FnService::new("widgets", |_, _| StackResponse::text("ok")))?;
///
/// let url = Url::parse("http://svc.test/v1/widgets").unwrap();
/// let response = stack.call(&StackRequest::new(Method::GET, url, "/widgets"));
/// assert_eq!(response.body.as_ref(), b"ok");
/// # Ok::<(), stackinabox_stack::StackError>(())
/// ```
pub struct StackInABox {
    base_uri: RwLock<String>,
    services: DashMap<String, Arc<dyn StackService>>,
    held: DashMap<String, Held>,
}

impl StackInABox {
    /// Creates an empty stack.
    pub fn new() -> Self {
        Self {
            base_uri: RwLock::new(DEFAULT_BASE_URI.to_string()),
            services: DashMap::new(),
            held: DashMap::new(),
        }
    }

    /// The process-wide stack.
    pub fn global() -> Arc<Self> {
        static GLOBAL: OnceLock<Arc<StackInABox>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(Self::new())))
    }

    /// Adds a service.
    ///
    /// # Errors
    ///
    /// Fails if the name is empty, contains `/`, or is already registered.
    pub fn register<S: StackService + 'static>(&self, service: S) -> StackResult<()> {
        self.register_shared(Arc::new(service))
    }

    /// Adds a shared service.
    pub fn register_shared(&self, service: Arc<dyn StackService>) -> StackResult<()> {
        let name = service.name().to_string();
        if name.is_empty() {
            return Err(StackError::InvalidServiceName {
                name,
                reason: "name is empty",
            });
        }
        if name.contains('/') {
            return Err(StackError::InvalidServiceName {
                name,
                reason: "name contains '/'",
            });
        }

        match self.services.entry(name.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(StackError::ServiceAlreadyRegistered { name })
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(service);
                debug!(service = %name, "Service registered");
                Ok(())
            }
        }
    }

    /// Names of the registered services, sorted.
    pub fn services(&self) -> Vec<String> {
        let mut names: Vec<String> = self.services.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// The base URI last passed to [`ServiceStack::update_uri`].
    pub fn base_uri(&self) -> String {
        self.base_uri.read().clone()
    }

    /// Returns the held value under `key` if it has type `T`.
    pub fn hold_out_as<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.hold_out(key).and_then(|held| held.downcast::<T>().ok())
    }

    /// Removes every service and held value and resets the base URI.
    pub fn reset(&self) {
        self.services.clear();
        self.held.clear();
        *self.base_uri.write() = DEFAULT_BASE_URI.to_string();
        debug!("Stack reset");
    }
}

impl Default for StackInABox {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StackInABox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StackInABox")
            .field("base_uri", &self.base_uri())
            .field("services", &self.services())
            .field("held", &self.held.len())
            .finish()
    }
}

impl ServiceStack for StackInABox {
    fn update_uri(&self, uri: &str) {
        let uri = uri.split_once("://").map_or(uri, |(_, rest)| rest);
        let uri = uri.trim_end_matches('/');
        debug!(uri = %uri, "Stack base URI updated");
        *self.base_uri.write() = uri.to_string();
    }

    fn hold_onto(&self, key: &str, value: Held) {
        trace!(key = %key, "Holding value");
        self.held.insert(key.to_string(), value);
    }

    fn hold_out(&self, key: &str) -> Option<Held> {
        self.held.get(key).map(|entry| Arc::clone(entry.value()))
    }

    fn call(&self, request: &StackRequest) -> StackResponse {
        let relative = request.path.trim_start_matches('/');
        let (name, rest) = relative.split_once('/').unwrap_or((relative, ""));
        let name = name.split('?').next().unwrap_or_default();

        // Clone out of the map so the handler runs without holding a shard lock
        let service = self.services.get(name).map(|entry| Arc::clone(entry.value()));
        let Some(service) = service else {
            debug!(service = %name, path = %request.path, "No service for request");
            return StackResponse::not_handled("Service Handler Not Found");
        };

        let path = format!("/{rest}");
        trace!(service = %name, path = %path, method = %request.method, "Dispatching to service");
        service.handle(request, &path)
    }
}
