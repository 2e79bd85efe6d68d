//! Extension points consulted by the bus.
//!
//! This module groups the chains that let applications customize **which**
//! owners and methods become handlers, **how** they are invoked, **what** happens
//! when one fails, and **how** their return values are awaited.
//!
//! ## Contents
//! - [`RegistrantFilter`] / [`InvocationFilter`] reject owners / single methods at registration
//! - [`InvocationFactory`] turns an accepted method into the stored callable
//! - [`ExceptionHandler`] claims handler failures (first `true` wins)
//! - [`AwaitableConverter`] turns returned values into an [`Awaitable`]
//!
//! ## Ordering
//! ```text
//! added last ──► ... ──► added first ──► defaults
//! ```
//! Every chain is consulted most-recently-added first; the built-in defaults
//! (if enabled in [`Config`](crate::Config)) always sit at the tail.

mod awaitable;
mod chain;
mod exceptions;
mod factory;
mod filters;

pub use awaitable::{Awaitable, AwaitableConverter, Awaitables, TypedConverter};
pub use exceptions::{ExceptionHandler, LogExceptions};
pub use factory::{DirectInvocation, InvocationFactory};
pub use filters::{
    ExcludeDeclaredBy, ExcludeMarked, ExcludeMethods, ExcludeTagged, InvocationFilter,
    RegistrantFilter,
};

pub(crate) use awaitable::default_converters;
pub(crate) use chain::Chain;
