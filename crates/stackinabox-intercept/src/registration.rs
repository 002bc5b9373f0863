//! Binding a base URI to the service stack.
//!
//! Registering `svc.test/v1` creates a fresh [`MockAdapter`] holding one
//! [`UriMatcher`] for that URI, stores it in the stack's keyed storage and
//! mounts it on a session under `http://svc.test/v1/` and
//! `https://svc.test/v1/`. Registrations accumulate: each call adds mounts
//! and never removes earlier ones.

use std::fmt;
use std::sync::Arc;

use stackinabox_client::{HttpSession, SharedAdapter};
use stackinabox_config::InterceptConfig;
use stackinabox_stack::{Held, ServiceStack, StackInABox};
use tracing::debug;
use url::Url;

use crate::adapter::MockAdapter;
use crate::matcher::UriMatcher;
use crate::{registry, settings};

/// Registers base URIs against a service stack.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use stackinabox_client::{HttpSession, Session};
/// use stackinabox_intercept::Registrar;
/// use stackinabox_stack::StackInABox;
///
/// let registrar = Registrar::new(Arc::new(StackInABox::new()));
/// let session = Session::new();
/// registrar.register_on_session("svc.test/v1", &session);
///
/// assert_eq!(session.mounts(), ["https://svc.test/v1/", "http://svc.test/v1/"]);
/// ```
#[derive(Clone)]
pub struct Registrar {
    stack: Arc<dyn ServiceStack>,
    schemes: Vec<String>,
    adapter_key: String,
}

impl Registrar {
    /// Creates a registrar for `stack` with default schemes and storage key.
    pub fn new(stack: Arc<dyn ServiceStack>) -> Self {
        Self::from_config(stack, &InterceptConfig::default())
    }

    /// Creates a registrar for `stack` using the given intercept settings.
    pub fn from_config(stack: Arc<dyn ServiceStack>, config: &InterceptConfig) -> Self {
        Self {
            stack,
            schemes: config.schemes.clone(),
            adapter_key: config.adapter_key.clone(),
        }
    }

    /// Replaces the schemes mounted for each URI.
    #[must_use]
    pub fn with_schemes<I, S>(mut self, schemes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.schemes = schemes.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the key the adapter is stored under.
    #[must_use]
    pub fn with_adapter_key(mut self, key: impl Into<String>) -> Self {
        self.adapter_key = key.into();
        self
    }

    /// The stack requests are routed to.
    pub fn stack(&self) -> &Arc<dyn ServiceStack> {
        &self.stack
    }

    /// The mount prefixes a registration of `uri` produces.
    ///
    /// Prefixes are in the same form the session looks requests up by:
    /// default ports dropped, path characters percent-encoded.
    pub fn mount_keys(&self, uri: &str) -> Vec<String> {
        let uri = normalize_uri(uri);
        self.schemes
            .iter()
            .map(|scheme| {
                let raw = format!("{scheme}://{uri}");
                Url::parse(&raw).map_or(raw, String::from)
            })
            .collect()
    }

    /// Registers `uri` on the calling thread's current session.
    pub fn register(&self, uri: &str) -> Arc<MockAdapter> {
        self.register_on_session(uri, &registry::current())
    }

    /// Registers `uri` on `session`.
    ///
    /// Returns the adapter that was mounted.
    pub fn register_on_session(&self, uri: &str, session: &dyn HttpSession) -> Arc<MockAdapter> {
        debug!(uri = %uri, session_id = %session.id(), "Registering stack");

        self.stack.update_uri(uri);

        let adapter = Arc::new(MockAdapter::new());
        adapter.add_matcher(Box::new(UriMatcher::new(uri, Arc::clone(&self.stack))));
        self.stack
            .hold_onto(&self.adapter_key, Arc::clone(&adapter) as Held);

        // Mount our own handle; the held slot may already belong to another thread's registration
        let mounted: SharedAdapter = adapter.clone();
        for key in self.mount_keys(uri) {
            session.mount(&key, Arc::clone(&mounted));
        }

        adapter
    }
}

impl Default for Registrar {
    /// A registrar for [`StackInABox::global`] using the configured intercept settings.
    fn default() -> Self {
        Self::from_config(StackInABox::global(), &settings::intercept_config())
    }
}

impl fmt::Debug for Registrar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registrar")
            .field("schemes", &self.schemes)
            .field("adapter_key", &self.adapter_key)
            .finish_non_exhaustive()
    }
}

/// Appends a trailing `/` to `uri` if it has none.
pub fn normalize_uri(uri: &str) -> String {
    if uri.ends_with('/') {
        uri.to_string()
    } else {
        format!("{uri}/")
    }
}

/// Registers `uri` with the global stack on the calling thread's current session.
pub fn register(uri: &str) -> Arc<MockAdapter> {
    Registrar::default().register(uri)
}

/// Registers `uri` with the global stack on an explicit session.
pub fn register_on_session(uri: &str, session: &dyn HttpSession) -> Arc<MockAdapter> {
    Registrar::default().register_on_session(uri, session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use stackinabox_client::{RequestOptions, Session};
    use stackinabox_stack::{FnService, StackResponse};

    fn local_stack() -> Arc<StackInABox> {
        let stack = Arc::new(StackInABox::new());
        stack
            .register(FnService::new("widgets", |_, path| StackResponse::text(path)))
            .unwrap();
        stack
    }

    #[test]
    fn test_register_mounts_both_schemes() {
        let registrar = Registrar::new(local_stack());
        let session = Session::new();

        let adapter = registrar.register_on_session("example.com/api", &session);

        let mounts = session.mounts();
        assert!(mounts.contains(&"http://example.com/api/".to_string()));
        assert!(mounts.contains(&"https://example.com/api/".to_string()));
        assert!(adapter.has_matcher_for("example.com/api"));
        assert_eq!(adapter.matcher_count(), 1);
    }

    #[test]
    fn test_register_updates_stack() {
        let stack = local_stack();
        let registrar = Registrar::new(stack.clone()).with_adapter_key("mock");

        let adapter = registrar.register_on_session("svc.test/v1", &Session::new());

        assert_eq!(stack.base_uri(), "svc.test/v1");
        let held = stack.hold_out_as::<MockAdapter>("mock").unwrap();
        assert!(Arc::ptr_eq(&held, &adapter));
        assert!(stack.hold_out("adapter").is_none());
    }

    #[test]
    fn test_registrations_accumulate() {
        let registrar = Registrar::new(local_stack());
        let session = Session::new();

        registrar.register_on_session("a.test", &session);
        registrar.register_on_session("b.test/", &session);

        assert_eq!(session.mounts().len(), 4);
    }

    #[test]
    fn test_custom_schemes() {
        let registrar = Registrar::new(local_stack()).with_schemes(["https"]);
        assert_eq!(registrar.mount_keys("svc.test"), vec!["https://svc.test/"]);
    }

    #[test]
    fn test_registered_session_answers_from_stack() {
        let registrar = Registrar::new(local_stack());
        let session = Session::new();
        let adapter = registrar.register_on_session("svc.test/v1", &session);

        let response = session
            .get("https://svc.test/v1/widgets/9", RequestOptions::new())
            .unwrap();

        assert_eq!(response.text().unwrap(), "/9");
        assert_eq!(adapter.call_count(), 1);
    }

    #[test]
    fn test_explicit_default_port_routes_to_stack() {
        let registrar = Registrar::new(local_stack());
        let session = Session::new();
        let adapter = registrar.register_on_session("svc.test:80/api", &session);

        assert_eq!(
            registrar.mount_keys("svc.test:80/api"),
            vec!["http://svc.test/api/", "https://svc.test:80/api/"]
        );

        for url in ["http://svc.test:80/api/widgets/1", "https://svc.test:80/api/widgets/1"] {
            let response = session.get(url, RequestOptions::new()).unwrap();
            assert_eq!(response.text().unwrap(), "/1", "{url}");
        }
        assert_eq!(adapter.call_count(), 2);
    }

    #[test]
    fn test_escaped_base_uri_routes_to_stack() {
        let registrar = Registrar::new(local_stack());
        let session = Session::new();
        let adapter = registrar.register_on_session("svc.test/my api", &session);

        assert!(session.mounts().contains(&"http://svc.test/my%20api/".to_string()));

        let response = session
            .get("http://svc.test/my api/widgets/2", RequestOptions::new())
            .unwrap();
        assert_eq!(response.text().unwrap(), "/2");
        assert_eq!(adapter.call_count(), 1);
    }

    proptest! {
        #[test]
        fn prop_normalize_uri_ends_with_single_added_slash(uri in "[a-z0-9./:-]{0,40}") {
            let normalized = normalize_uri(&uri);
            prop_assert!(normalized.ends_with('/'));
            prop_assert!(normalized.starts_with(&uri));
            prop_assert!(normalized.len() - uri.len() <= 1);
        }

        #[test]
        fn prop_normalize_uri_is_idempotent(uri in "[a-z0-9./:-]{0,40}") {
            let once = normalize_uri(&uri);
            prop_assert_eq!(normalize_uri(&once), once.clone());
        }

        #[test]
        fn prop_mount_keys_cover_each_scheme(host in "[a-z]{1,12}\\.test", path in "(/[a-z0-9]{1,8}){0,3}") {
            let uri = format!("{host}{path}");
            let registrar = Registrar::new(Arc::new(StackInABox::new()));
            let keys = registrar.mount_keys(&uri);

            prop_assert_eq!(keys.len(), 2);
            prop_assert_eq!(&keys[0], &format!("http://{uri}/"));
            prop_assert_eq!(&keys[1], &format!("https://{uri}/"));
        }
    }
}
