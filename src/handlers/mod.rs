//! # Handler abstractions and registration scanning.
//!
//! This module provides the handler-related types:
//! - [`Invoke`] - trait for the callable stored in each descriptor
//! - [`Handler`] / [`HandlerRef`] - immutable descriptor bound to one event type
//! - [`Method`] - scan candidate, before filters and factories have run
//! - [`Subscribe`] / [`StaticSubscribe`] - owners producing candidates through a [`Scan`]
//! - [`Owner`] - registration handle (instance or type) with its identity
//!
//! ## Flow
//! ```text
//! Owner ──► Subscribe::handlers(&mut Scan) ──► Vec<Method>
//!                                               │  invocation filters
//!                                               │  arity / event-parameter check
//!                                               ▼  invocation factories
//!                                         Vec<HandlerRef> ──► dispatch nodes
//! ```

mod handler;
mod method;
mod subscribe;

pub use handler::{Handler, HandlerKey, HandlerRef, HandlerResult, Invoke, InvokeRef, Returned};
pub use method::{Method, Param, ReturnShape, Sequence};
pub use subscribe::{Exclusion, Owner, OwnerKey, OwnerKind, Scan, StaticSubscribe, Subscribe};
