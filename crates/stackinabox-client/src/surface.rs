//! The process-wide call surface.
//!
//! The crate's free functions ([`crate::request`], [`crate::get`], ...,
//! [`crate::session`]) do not do the work themselves: each looks up its
//! current [`Binding`] in a process-wide table and calls it. Replacing a
//! binding redirects every caller of that function without the caller
//! knowing. [`restore_defaults`] puts back the built-in bindings, which keep
//! the same `Arc` identity for the life of the process.

use std::fmt;
use std::sync::{Arc, OnceLock};

use http::Method;
use parking_lot::RwLock;
use tracing::debug;

use crate::error::{ClientError, ClientResult};
use crate::request::RequestOptions;
use crate::response::Response;
use crate::session::{HttpSession, Session, SharedSession};

/// A substitutable entry point of the call surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    /// The generic `request(method, url, options)` function.
    Request,
    /// `get(url, options)`.
    Get,
    /// `options(url, options)`.
    Options,
    /// `head(url, options)`.
    Head,
    /// `post(url, options)`.
    Post,
    /// `put(url, options)`.
    Put,
    /// `patch(url, options)`.
    Patch,
    /// `delete(url, options)`.
    Delete,
    /// The session constructor.
    Session,
}

impl Symbol {
    /// Every symbol, in surface order.
    pub const ALL: [Self; 9] = [
        Self::Request,
        Self::Get,
        Self::Options,
        Self::Head,
        Self::Post,
        Self::Put,
        Self::Patch,
        Self::Delete,
        Self::Session,
    ];

    /// The function name this symbol stands for.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Get => "get",
            Self::Options => "options",
            Self::Head => "head",
            Self::Post => "post",
            Self::Put => "put",
            Self::Patch => "patch",
            Self::Delete => "delete",
            Self::Session => "session",
        }
    }

    /// The HTTP method of a verb symbol.
    #[must_use]
    pub fn method(self) -> Option<Method> {
        match self {
            Self::Get => Some(Method::GET),
            Self::Options => Some(Method::OPTIONS),
            Self::Head => Some(Method::HEAD),
            Self::Post => Some(Method::POST),
            Self::Put => Some(Method::PUT),
            Self::Patch => Some(Method::PATCH),
            Self::Delete => Some(Method::DELETE),
            Self::Request | Self::Session => None,
        }
    }

    /// Redirect default a verb applies when the caller leaves it unset.
    #[must_use]
    pub const fn default_redirects(self) -> Option<bool> {
        match self {
            Self::Get | Self::Options => Some(true),
            Self::Head => Some(false),
            _ => None,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Signature of the generic request function.
pub type RequestFn =
    Arc<dyn Fn(Method, &str, RequestOptions) -> ClientResult<Response> + Send + Sync>;

/// Signature of a verb convenience function.
pub type VerbFn = Arc<dyn Fn(&str, RequestOptions) -> ClientResult<Response> + Send + Sync>;

/// Signature of the session constructor.
pub type SessionFn = Arc<dyn Fn() -> SharedSession + Send + Sync>;

/// The implementation currently bound to a [`Symbol`].
#[derive(Clone)]
pub enum Binding {
    /// Bound to [`Symbol::Request`].
    Request(RequestFn),
    /// Bound to a verb symbol.
    Verb(VerbFn),
    /// Bound to [`Symbol::Session`].
    Session(SessionFn),
}

impl Binding {
    /// Wraps a request function.
    pub fn request<F>(f: F) -> Self
    where
        F: Fn(Method, &str, RequestOptions) -> ClientResult<Response> + Send + Sync + 'static,
    {
        Self::Request(Arc::new(f))
    }

    /// Wraps a verb function.
    pub fn verb<F>(f: F) -> Self
    where
        F: Fn(&str, RequestOptions) -> ClientResult<Response> + Send + Sync + 'static,
    {
        Self::Verb(Arc::new(f))
    }

    /// Wraps a session constructor.
    pub fn session<F>(f: F) -> Self
    where
        F: Fn() -> SharedSession + Send + Sync + 'static,
    {
        Self::Session(Arc::new(f))
    }

    /// Kind name, used in error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Request(_) => "request",
            Self::Verb(_) => "verb",
            Self::Session(_) => "session",
        }
    }

    /// Returns true if both bindings are the same function object.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Request(a), Self::Request(b)) => same_object(a, b),
            (Self::Verb(a), Self::Verb(b)) => same_object(a, b),
            (Self::Session(a), Self::Session(b)) => same_object(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ptr = match self {
            Self::Request(a) => Arc::as_ptr(a).cast::<()>(),
            Self::Verb(a) => Arc::as_ptr(a).cast::<()>(),
            Self::Session(a) => Arc::as_ptr(a).cast::<()>(),
        };
        write!(f, "Binding::{}({ptr:p})", self.kind())
    }
}

// Data pointers only; vtable pointers are not unique across codegen units.
fn same_object<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    Arc::as_ptr(a).cast::<()>() == Arc::as_ptr(b).cast::<()>()
}

#[derive(Clone)]
struct SurfaceTable {
    request: RequestFn,
    get: VerbFn,
    options: VerbFn,
    head: VerbFn,
    post: VerbFn,
    put: VerbFn,
    patch: VerbFn,
    delete: VerbFn,
    session: SessionFn,
}

impl SurfaceTable {
    fn builtin() -> Self {
        Self {
            request: Arc::new(default_request),
            get: default_verb(Symbol::Get),
            options: default_verb(Symbol::Options),
            head: default_verb(Symbol::Head),
            post: default_verb(Symbol::Post),
            put: default_verb(Symbol::Put),
            patch: default_verb(Symbol::Patch),
            delete: default_verb(Symbol::Delete),
            session: Arc::new(|| Arc::new(Session::new()) as SharedSession),
        }
    }

    fn verb_slot(&mut self, symbol: Symbol) -> Option<&mut VerbFn> {
        match symbol {
            Symbol::Get => Some(&mut self.get),
            Symbol::Options => Some(&mut self.options),
            Symbol::Head => Some(&mut self.head),
            Symbol::Post => Some(&mut self.post),
            Symbol::Put => Some(&mut self.put),
            Symbol::Patch => Some(&mut self.patch),
            Symbol::Delete => Some(&mut self.delete),
            Symbol::Request | Symbol::Session => None,
        }
    }

    fn get(&self, symbol: Symbol) -> Binding {
        match symbol {
            Symbol::Request => Binding::Request(Arc::clone(&self.request)),
            Symbol::Get => Binding::Verb(Arc::clone(&self.get)),
            Symbol::Options => Binding::Verb(Arc::clone(&self.options)),
            Symbol::Head => Binding::Verb(Arc::clone(&self.head)),
            Symbol::Post => Binding::Verb(Arc::clone(&self.post)),
            Symbol::Put => Binding::Verb(Arc::clone(&self.put)),
            Symbol::Patch => Binding::Verb(Arc::clone(&self.patch)),
            Symbol::Delete => Binding::Verb(Arc::clone(&self.delete)),
            Symbol::Session => Binding::Session(Arc::clone(&self.session)),
        }
    }

    fn set(&mut self, symbol: Symbol, binding: Binding) -> ClientResult<Binding> {
        let previous = self.get(symbol);
        match (symbol, binding) {
            (Symbol::Request, Binding::Request(f)) => self.request = f,
            (Symbol::Session, Binding::Session(f)) => self.session = f,
            (symbol, Binding::Verb(f)) if symbol.method().is_some() => {
                if let Some(slot) = self.verb_slot(symbol) {
                    *slot = f;
                }
            }
            (symbol, _) => {
                return Err(ClientError::BindingKind {
                    symbol,
                    expected: previous.kind(),
                })
            }
        }
        Ok(previous)
    }
}

fn builtin() -> &'static SurfaceTable {
    static BUILTIN: OnceLock<SurfaceTable> = OnceLock::new();
    BUILTIN.get_or_init(SurfaceTable::builtin)
}

fn table() -> &'static RwLock<SurfaceTable> {
    static TABLE: OnceLock<RwLock<SurfaceTable>> = OnceLock::new();
    TABLE.get_or_init(|| RwLock::new(builtin().clone()))
}

fn default_request(method: Method, url: &str, options: RequestOptions) -> ClientResult<Response> {
    let session = Session::new();
    let _closing = session.scoped();
    session.request(method, url, options)
}

fn default_verb(symbol: Symbol) -> VerbFn {
    let method = symbol.method().unwrap_or(Method::GET);
    let redirects = symbol.default_redirects();
    Arc::new(move |url: &str, options: RequestOptions| {
        let options = match redirects {
            Some(allow) => options.with_default_redirects(allow),
            None => options,
        };
        default_request(method.clone(), url, options)
    })
}

/// Returns the binding currently installed for `symbol`.
#[must_use]
pub fn binding(symbol: Symbol) -> Binding {
    table().read().get(symbol)
}

/// Returns the built-in binding for `symbol`.
#[must_use]
pub fn default_binding(symbol: Symbol) -> Binding {
    builtin().get(symbol)
}

/// Installs `binding` for `symbol`, returning the binding it replaced.
///
/// # Errors
///
/// Returns [`ClientError::BindingKind`] if the binding's kind does not fit
/// the symbol; the table is left unchanged.
pub fn replace(symbol: Symbol, binding: Binding) -> ClientResult<Binding> {
    let previous = table().write().set(symbol, binding)?;
    debug!(symbol = %symbol, "Surface binding replaced");
    Ok(previous)
}

/// Reinstalls every built-in binding.
pub fn restore_defaults() {
    *table().write() = builtin().clone();
    debug!("Surface bindings restored to defaults");
}

/// Returns true if every symbol is bound to its built-in binding.
#[must_use]
pub fn is_default() -> bool {
    let current = table().read();
    let builtin = builtin();
    Symbol::ALL
        .iter()
        .all(|s| current.get(*s).ptr_eq(&builtin.get(*s)))
}

pub(crate) fn request_fn() -> RequestFn {
    Arc::clone(&table().read().request)
}

pub(crate) fn verb_fn(symbol: Symbol) -> Option<VerbFn> {
    match table().read().get(symbol) {
        Binding::Verb(f) => Some(f),
        _ => None,
    }
}

pub(crate) fn session_fn() -> SessionFn {
    Arc::clone(&table().read().session)
}
