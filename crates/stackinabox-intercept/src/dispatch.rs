//! Request functions installed in place of the client's surface while
//! interception is active.
//!
//! Each one sends through the calling thread's current session and then
//! closes that session's adapters (unless `close_after_dispatch` is off).
//! Request errors are returned unchanged.

use http::Method;
use stackinabox_client::{ClientResult, HttpSession, RequestOptions, Response};
use tracing::trace;

use crate::{registry, settings};

/// Sends a request through the current session.
pub fn dispatch(method: Method, url: &str, options: RequestOptions) -> ClientResult<Response> {
    let session = registry::current();
    trace!(session_id = %session.id(), http.method = %method, http.url = %url, "Dispatching");

    let result = session.request(method, url, options);
    if settings::close_after_dispatch() {
        session.close();
    }
    result
}

/// GET; follows redirects unless told otherwise.
pub fn get(url: &str, options: RequestOptions) -> ClientResult<Response> {
    dispatch(Method::GET, url, options.with_default_redirects(true))
}

/// OPTIONS; follows redirects unless told otherwise.
pub fn options(url: &str, options: RequestOptions) -> ClientResult<Response> {
    dispatch(Method::OPTIONS, url, options.with_default_redirects(true))
}

/// HEAD; does not follow redirects unless told otherwise.
pub fn head(url: &str, options: RequestOptions) -> ClientResult<Response> {
    dispatch(Method::HEAD, url, options.with_default_redirects(false))
}

/// POST.
pub fn post(url: &str, options: RequestOptions) -> ClientResult<Response> {
    dispatch(Method::POST, url, options)
}

/// PUT.
pub fn put(url: &str, options: RequestOptions) -> ClientResult<Response> {
    dispatch(Method::PUT, url, options)
}

/// PATCH.
pub fn patch(url: &str, options: RequestOptions) -> ClientResult<Response> {
    dispatch(Method::PATCH, url, options)
}

/// DELETE.
pub fn delete(url: &str, options: RequestOptions) -> ClientResult<Response> {
    dispatch(Method::DELETE, url, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    use bytes::Bytes;
    use http::{HeaderMap, StatusCode};
    use parking_lot::Mutex;
    use stackinabox_client::{Adapter, ClientError, PreparedRequest, SendSettings};
    use stackinabox_config::{InterceptConfig, StackConfig};
    use stackinabox_stack::{FnService, StackInABox, StackResponse};

    use crate::registration::Registrar;

    /// Serializes tests that depend on `close_after_dispatch`.
    static CLOSE_SETTING: Mutex<()> = Mutex::new(());

    /// Answers 200, or a connection error for paths containing `fail`, and
    /// counts `close` calls.
    #[derive(Debug, Default)]
    struct CountingAdapter {
        closed: AtomicUsize,
    }

    impl CountingAdapter {
        fn closed(&self) -> usize {
            self.closed.load(Ordering::SeqCst)
        }
    }

    impl Adapter for CountingAdapter {
        fn send(&self, request: &PreparedRequest, _: &SendSettings) -> ClientResult<Response> {
            if request.url.path().contains("fail") {
                return Err(ClientError::Connection("refused".into()));
            }
            Ok(Response::new(
                StatusCode::OK,
                HeaderMap::new(),
                Bytes::from_static(b"counted"),
                request.url.clone(),
            ))
        }

        fn close(&self) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn mount_counting() -> Arc<CountingAdapter> {
        let adapter = Arc::new(CountingAdapter::default());
        registry::current().mount("http://close.test/", adapter.clone());
        adapter
    }

    /// `redirect` answers 302 to `/v1/widgets/to`.
    fn stack() -> Arc<StackInABox> {
        let stack = Arc::new(StackInABox::new());
        stack
            .register(FnService::new("widgets", |request, path| {
                StackResponse::text(format!("{} {path}", request.method))
            }))
            .unwrap();
        stack
            .register(FnService::new("redirect", |_, _| {
                StackResponse::new(StatusCode::FOUND).with_header(
                    http::header::LOCATION,
                    http::HeaderValue::from_static("/v1/widgets/to"),
                )
            }))
            .unwrap();
        stack
    }

    fn on_fresh_thread<F: FnOnce() + Send + 'static>(f: F) {
        thread::spawn(f).join().unwrap();
    }

    #[test]
    fn test_dispatch_uses_current_session() {
        on_fresh_thread(|| {
            Registrar::new(stack()).register("svc.test/v1");

            let response = dispatch(Method::PUT, "http://svc.test/v1/widgets/3", RequestOptions::new())
                .unwrap();
            assert_eq!(response.text().unwrap(), "PUT /3");
        });
    }

    #[test]
    fn test_get_follows_redirects_by_default() {
        on_fresh_thread(|| {
            Registrar::new(stack()).register("svc.test/v1");

            let response = get("http://svc.test/v1/redirect", RequestOptions::new()).unwrap();
            assert_eq!(response.text().unwrap(), "GET /to");

            let response = get(
                "http://svc.test/v1/redirect",
                RequestOptions::new().allow_redirects(false),
            )
            .unwrap();
            assert_eq!(response.status(), StatusCode::FOUND);
        });
    }

    #[test]
    fn test_head_does_not_follow_by_default() {
        on_fresh_thread(|| {
            Registrar::new(stack()).register("svc.test/v1");

            let response = head("http://svc.test/v1/redirect", RequestOptions::new()).unwrap();
            assert_eq!(response.status(), StatusCode::FOUND);

            let response = head(
                "http://svc.test/v1/redirect",
                RequestOptions::new().allow_redirects(true),
            )
            .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        });
    }

    #[test]
    fn test_errors_pass_through() {
        on_fresh_thread(|| {
            Registrar::new(stack()).register("svc.test/v1");

            let err = delete("http://svc.test/v1/gadgets", RequestOptions::new()).unwrap_err();
            assert!(matches!(err, ClientError::Connection(_)));

            let err = post("not a url", RequestOptions::new()).unwrap_err();
            assert!(matches!(err, ClientError::InvalidUrl { .. }));
        });
    }

    #[test]
    fn test_mounts_survive_close() {
        on_fresh_thread(|| {
            Registrar::new(stack()).register("svc.test/v1");

            patch("http://svc.test/v1/widgets", RequestOptions::new()).unwrap();
            options("http://svc.test/v1/widgets", RequestOptions::new()).unwrap();
            put("http://svc.test/v1/widgets", RequestOptions::new()).unwrap();

            assert_eq!(registry::current().mounts().len(), 2);
        });
    }

    #[test]
    fn test_every_wrapper_closes_current_session_once() {
        let _lock = CLOSE_SETTING.lock();
        on_fresh_thread(|| {
            let adapter = mount_counting();
            let url = "http://close.test/widgets";
            let wrappers: [fn(&str, RequestOptions) -> ClientResult<Response>; 7] =
                [get, options, head, post, put, patch, delete];

            for (n, wrapper) in wrappers.iter().enumerate() {
                wrapper(url, RequestOptions::new()).unwrap();
                assert_eq!(adapter.closed(), n + 1);
            }

            dispatch(Method::GET, url, RequestOptions::new()).unwrap();
            assert_eq!(adapter.closed(), wrappers.len() + 1);
        });
    }

    #[test]
    fn test_failed_request_still_closes() {
        let _lock = CLOSE_SETTING.lock();
        on_fresh_thread(|| {
            let adapter = mount_counting();

            let err = get("http://close.test/fail", RequestOptions::new()).unwrap_err();

            assert!(err.is_connection());
            assert_eq!(adapter.closed(), 1);
        });
    }

    #[test]
    fn test_no_close_when_disabled() {
        let _lock = CLOSE_SETTING.lock();
        crate::configure(&StackConfig {
            intercept: InterceptConfig {
                close_after_dispatch: false,
                ..Default::default()
            },
            ..Default::default()
        });

        let outcome = thread::spawn(|| {
            let adapter = mount_counting();
            get("http://close.test/widgets", RequestOptions::new()).unwrap();
            post("http://close.test/fail", RequestOptions::new()).unwrap_err();
            adapter.closed()
        })
        .join();

        crate::configure(&StackConfig::default());
        assert_eq!(outcome.unwrap(), 0);
    }
}
