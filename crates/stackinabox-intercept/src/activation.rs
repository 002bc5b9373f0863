//! Installing and removing interception.
//!
//! While an [`Interception`] is active, every symbol of the client's call
//! surface is bound to this crate's dispatch functions, and the session
//! constructor yields [`CurrentSession`]. Leaving restores the exact bindings
//! captured on entry and gives the calling thread a fresh session with no
//! mounts.
//!
//! Only one interception may be active per process.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use stackinabox_client::surface::{self, Binding, Symbol};
use stackinabox_client::{HttpSession, SharedSession};
use tracing::{debug, error, warn};

use crate::error::{InterceptError, InterceptResult};
use crate::facade::CurrentSession;
use crate::{dispatch, registry, settings};

static ACTIVE: AtomicBool = AtomicBool::new(false);

/// Returns true if an interception is active anywhere in the process.
pub fn is_active() -> bool {
    ACTIVE.load(Ordering::SeqCst)
}

#[derive(Debug)]
struct Replacement {
    symbol: Symbol,
    original: Binding,
    installed: Binding,
}

fn interception_binding(symbol: Symbol) -> Binding {
    match symbol {
        Symbol::Request => Binding::request(dispatch::dispatch),
        Symbol::Get => Binding::verb(dispatch::get),
        Symbol::Options => Binding::verb(dispatch::options),
        Symbol::Head => Binding::verb(dispatch::head),
        Symbol::Post => Binding::verb(dispatch::post),
        Symbol::Put => Binding::verb(dispatch::put),
        Symbol::Patch => Binding::verb(dispatch::patch),
        Symbol::Delete => Binding::verb(dispatch::delete),
        Symbol::Session => Binding::session(|| Arc::new(CurrentSession) as SharedSession),
    }
}

/// Puts `table` back in reverse order; returns the symbols whose binding had
/// been changed by someone else in the meantime.
fn restore(table: Vec<Replacement>) -> Vec<Symbol> {
    let mut displaced = Vec::new();
    for replacement in table.into_iter().rev() {
        match surface::replace(replacement.symbol, replacement.original) {
            Ok(found) if found.ptr_eq(&replacement.installed) => {}
            Ok(_) => displaced.push(replacement.symbol),
            Err(e) => {
                error!(symbol = %replacement.symbol, error = %e, "Failed to restore binding");
                displaced.push(replacement.symbol);
            }
        }
    }
    displaced.reverse();
    displaced
}

/// Scoped substitution of the client's call surface.
///
/// Dropping an active `Interception` exits it.
#[derive(Debug, Default)]
pub struct Interception {
    table: Option<Vec<Replacement>>,
}

impl Interception {
    /// Creates an inactive interception.
    pub const fn new() -> Self {
        Self { table: None }
    }

    /// Creates an interception and enters it.
    pub fn activate() -> InterceptResult<ActivationGuard> {
        let mut interception = Self::new();
        interception.enter()?;
        Ok(ActivationGuard { interception })
    }

    /// Returns true if this interception is active.
    pub fn is_active(&self) -> bool {
        self.table.is_some()
    }

    /// Captures the current surface and installs the interception bindings.
    ///
    /// # Errors
    ///
    /// [`InterceptError::AlreadyActive`] if this or any other interception is
    /// active; nothing is changed in that case.
    pub fn enter(&mut self) -> InterceptResult<()> {
        if self.table.is_some()
            || ACTIVE
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
        {
            return Err(InterceptError::AlreadyActive);
        }

        let mut table = Vec::with_capacity(Symbol::ALL.len());
        for symbol in Symbol::ALL {
            let installed = interception_binding(symbol);
            match surface::replace(symbol, installed.clone()) {
                Ok(original) => table.push(Replacement {
                    symbol,
                    original,
                    installed,
                }),
                Err(e) => {
                    restore(table);
                    ACTIVE.store(false, Ordering::SeqCst);
                    return Err(e.into());
                }
            }
        }

        self.table = Some(table);
        debug!(session_id = %registry::current().id(), "Interception activated");
        Ok(())
    }

    /// Restores the captured surface and resets the thread's current session.
    ///
    /// Every captured binding is restored even if some were changed while
    /// active; those symbols are then reported.
    ///
    /// # Errors
    ///
    /// [`InterceptError::NotActive`] if not entered;
    /// [`InterceptError::Restoration`] if bindings were changed while active.
    pub fn exit(&mut self) -> InterceptResult<()> {
        let table = self.table.take().ok_or(InterceptError::NotActive)?;

        let displaced = restore(table);
        ACTIVE.store(false, Ordering::SeqCst);

        let fresh = settings::new_session();
        let fresh_id = fresh.id();
        if let Some(previous) = registry::replace(fresh) {
            debug!(session_id = %previous.id(), next_session_id = %fresh_id, "Interception deactivated");
        }

        if displaced.is_empty() {
            Ok(())
        } else {
            warn!(symbols = ?displaced, "Surface bindings changed during interception");
            Err(InterceptError::Restoration { symbols: displaced })
        }
    }
}

impl Drop for Interception {
    fn drop(&mut self) {
        if self.table.is_some() {
            if let Err(e) = self.exit() {
                error!(error = %e, "Interception exit on drop failed");
            }
        }
    }
}

/// An active interception that exits when dropped, including during unwinding.
#[derive(Debug)]
#[must_use = "interception ends when the guard is dropped"]
pub struct ActivationGuard {
    interception: Interception,
}

impl ActivationGuard {
    /// Exits now and reports the outcome.
    ///
    /// # Errors
    ///
    /// [`InterceptError::Restoration`] if bindings were changed while active.
    pub fn deactivate(mut self) -> InterceptResult<()> {
        self.interception.exit()
    }
}

/// Runs `f` with interception active.
///
/// # Errors
///
/// Fails if interception could not be entered, or if exit reports a
/// restoration problem; in the latter case `f` has already run.
pub fn intercept<T>(f: impl FnOnce() -> T) -> InterceptResult<T> {
    let guard = Interception::activate()?;
    let output = f();
    guard.deactivate()?;
    Ok(output)
}
