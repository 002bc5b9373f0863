//! Per-thread current session.
//!
//! Each thread sees exactly one current [`Session`], created on first access.
//! The store is keyed by [`ThreadId`]. A thread's entry is removed and its
//! session closed when the thread exits, or earlier through [`release`].

use std::cell::OnceCell;
use std::sync::OnceLock;
use std::thread::{self, ThreadId};

use dashmap::DashMap;
use stackinabox_client::{HttpSession, Session};
use tracing::{debug, trace};

use crate::settings;

fn slots() -> &'static DashMap<ThreadId, Session> {
    static SLOTS: OnceLock<DashMap<ThreadId, Session>> = OnceLock::new();
    SLOTS.get_or_init(DashMap::new)
}

/// Clears the owning thread's entry when thread-local storage is torn down.
struct SlotGuard(ThreadId);

impl Drop for SlotGuard {
    fn drop(&mut self) {
        if let Some((_, session)) = slots().remove(&self.0) {
            session.close();
            trace!(session_id = %session.id(), thread = ?self.0, "Dropped session of exited thread");
        }
    }
}

thread_local! {
    static SLOT_GUARD: OnceCell<SlotGuard> = const { OnceCell::new() };
}

fn arm_guard(id: ThreadId) {
    // Fails only while this thread's locals are being destroyed
    let _ = SLOT_GUARD.try_with(|guard| {
        guard.get_or_init(|| SlotGuard(id));
    });
}

/// Returns the calling thread's current session, creating it if absent.
pub fn current() -> Session {
    let id = thread::current().id();
    arm_guard(id);
    slots()
        .entry(id)
        .or_insert_with(|| {
            let session = settings::new_session();
            debug!(session_id = %session.id(), thread = ?id, "Created current session");
            session
        })
        .value()
        .clone()
}

/// Makes `session` the calling thread's current session.
///
/// Returns the session it displaced, if any.
pub fn replace(session: Session) -> Option<Session> {
    let id = thread::current().id();
    debug!(session_id = %session.id(), thread = ?id, "Replacing current session");
    arm_guard(id);
    slots().insert(id, session)
}

/// Drops the calling thread's entry, closing the removed session.
///
/// The next [`current`] call on this thread creates a new session.
pub fn release() -> Option<Session> {
    let id = thread::current().id();
    let (_, session) = slots().remove(&id)?;
    session.close();
    debug!(session_id = %session.id(), thread = ?id, "Released current session");
    Some(session)
}

/// Number of threads with a current session.
pub fn session_count() -> usize {
    slots().len()
}
