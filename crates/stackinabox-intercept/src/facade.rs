//! A session handle that always means "the calling thread's current session".

use http::Method;
use stackinabox_client::{
    ClientResult, HttpSession, PreparedRequest, Request, RequestOptions, Response, SendSettings,
    SessionId, SessionState, SharedAdapter,
};

use crate::registry;

/// Forwards every session operation to [`registry::current`].
///
/// Holds no state, so a `CurrentSession` captured before interception keeps
/// following whichever session is current when it is used. The verb helpers
/// come from [`HttpSession`]'s provided methods and route through
/// [`HttpSession::request`] below.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurrentSession;

impl HttpSession for CurrentSession {
    fn id(&self) -> SessionId {
        registry::current().id()
    }

    fn prepare_request(&self, request: &Request) -> ClientResult<PreparedRequest> {
        registry::current().prepare_request(request)
    }

    fn merge_environment_settings(&self, options: &RequestOptions) -> SendSettings {
        registry::current().merge_environment_settings(options)
    }

    fn send(&self, request: PreparedRequest, settings: &SendSettings) -> ClientResult<Response> {
        registry::current().send(request, settings)
    }

    fn request(&self, method: Method, url: &str, options: RequestOptions) -> ClientResult<Response> {
        registry::current().request(method, url, options)
    }

    fn get_adapter(&self, url: &str) -> ClientResult<SharedAdapter> {
        registry::current().get_adapter(url)
    }

    fn mount(&self, prefix: &str, adapter: SharedAdapter) {
        registry::current().mount(prefix, adapter);
    }

    fn mounts(&self) -> Vec<String> {
        registry::current().mounts()
    }

    fn close(&self) {
        registry::current().close();
    }

    fn state(&self) -> SessionState {
        registry::current().state()
    }

    fn restore_state(&self, state: SessionState) {
        registry::current().restore_state(state);
    }
}
