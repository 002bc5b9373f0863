//! # Stack-In-A-Box Service Stack
//!
//! An in-process stack of mock services. The interception layer hands every
//! captured request to a [`ServiceStack`]; [`StackInABox`] is the concrete
//! stack, routing on the first path segment to a registered
//! [`StackService`].
//!
//! Besides answering requests, a stack offers keyed storage
//! ([`ServiceStack::hold_onto`] / [`ServiceStack::hold_out`]) that
//! interception code uses to keep its transport adapters reachable.
//!
//! A stack answers `595` when nothing handled a request; see
//! [`StackResponse::not_handled`].

#![doc(html_root_url = "https://docs.rs/stackinabox-stack/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod message;
mod service;
mod stack;

pub use error::{StackError, StackResult};
pub use message::{StackRequest, StackResponse, NOT_HANDLED};
pub use service::{FnService, RoutedService, StackService};
pub use stack::{Held, ServiceStack, StackInABox};
