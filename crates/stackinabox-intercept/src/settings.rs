//! Process-wide settings used by registration, dispatch and new sessions.

use std::sync::OnceLock;

use parking_lot::RwLock;
use stackinabox_client::Session;
use stackinabox_config::{ClientConfig, InterceptConfig, StackConfig};
use tracing::debug;

#[derive(Debug, Clone, Default)]
struct Settings {
    client: ClientConfig,
    intercept: InterceptConfig,
}

fn settings() -> &'static RwLock<Settings> {
    static SETTINGS: OnceLock<RwLock<Settings>> = OnceLock::new();
    SETTINGS.get_or_init(|| RwLock::new(Settings::default()))
}

/// Applies the client and intercept sections of `config`.
///
/// Affects sessions created afterwards and registrations made afterwards;
/// existing sessions keep their defaults.
pub fn configure(config: &StackConfig) {
    let mut settings = settings().write();
    settings.client = config.client.clone();
    settings.intercept = config.intercept.clone();
    debug!(
        schemes = ?settings.intercept.schemes,
        close_after_dispatch = settings.intercept.close_after_dispatch,
        "Interception configured"
    );
}

pub(crate) fn intercept_config() -> InterceptConfig {
    settings().read().intercept.clone()
}

pub(crate) fn close_after_dispatch() -> bool {
    settings().read().intercept.close_after_dispatch
}

pub(crate) fn new_session() -> Session {
    let client = settings().read().client.clone();
    Session::with_config(&client)
}
