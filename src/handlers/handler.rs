//! # Handler descriptor and the invocation trait.
//!
//! A [`Handler`] is the immutable record of one subscribed callable: the owner
//! it came from, the event type it accepts, its priority and concurrency group,
//! and the [`Invoke`] object that runs it. Descriptors are shared as
//! [`HandlerRef`] between every dispatch node they were inserted into.
//!
//! Equality is by [`HandlerKey`] (owner identity + method position in the scan),
//! never by value.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::HandlerError;
use crate::events::{Event, EventType};

use super::method::Method;
use super::subscribe::OwnerKey;

/// Value returned by an invocation; resolved later by the dispatch discipline.
pub type Returned = Option<Box<dyn Any + Send>>;

/// Outcome of one invocation.
pub type HandlerResult = Result<Returned, HandlerError>;

/// # Callable stored in a descriptor.
///
/// Implemented for every `Fn(&dyn Event) -> HandlerResult` closure.
///
/// # Example
/// ```
/// use typebus::{Event, HandlerResult, Invoke};
///
/// struct Ping;
/// impl Event for Ping {}
///
/// let call = |_ev: &dyn Event| -> HandlerResult { Ok(None) };
/// assert!(call.invoke(&Ping).unwrap().is_none());
/// ```
pub trait Invoke: Send + Sync + 'static {
    /// Runs the handler against `event`.
    fn invoke(&self, event: &dyn Event) -> HandlerResult;
}

impl<F> Invoke for F
where
    F: Fn(&dyn Event) -> HandlerResult + Send + Sync + 'static,
{
    fn invoke(&self, event: &dyn Event) -> HandlerResult {
        self(event)
    }
}

/// Shared handle to an [`Invoke`] object.
pub type InvokeRef = Arc<dyn Invoke>;

/// Identity of a descriptor: owner plus position of the method in its scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HandlerKey {
    owner: OwnerKey,
    method: usize,
}

impl HandlerKey {
    pub(crate) fn new(owner: OwnerKey, method: usize) -> Self {
        Self { owner, method }
    }

    /// Owner the method belongs to.
    pub fn owner(&self) -> OwnerKey {
        self.owner
    }
}

/// Immutable descriptor of one subscribed callable.
pub struct Handler {
    key: HandlerKey,
    owner: &'static str,
    method: Arc<str>,
    event_type: EventType,
    priority: i32,
    group: Arc<str>,
    invoker: InvokeRef,
}

/// Shared descriptor (`Arc<Handler>`).
pub type HandlerRef = Arc<Handler>;

impl Handler {
    /// Builds the descriptor for a scanned method accepted by the filter chain.
    pub(crate) fn from_method(
        key: HandlerKey,
        owner: &'static str,
        method: &Method,
        event_type: EventType,
        invoker: InvokeRef,
    ) -> Self {
        Self {
            key,
            owner,
            method: method.name_arc(),
            event_type,
            priority: method.priority_value(),
            group: method.group_arc(),
            invoker,
        }
    }

    #[inline]
    pub fn key(&self) -> HandlerKey {
        self.key
    }

    /// Name of the owner (for logs).
    #[inline]
    pub fn owner_name(&self) -> &'static str {
        self.owner
    }

    /// Name of the method (for logs).
    #[inline]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Event type the handler was declared for.
    #[inline]
    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    /// Higher runs first.
    #[inline]
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Concurrency group tag; empty for the default group.
    #[inline]
    pub fn group(&self) -> &str {
        &self.group
    }

    pub(crate) fn group_arc(&self) -> Arc<str> {
        Arc::clone(&self.group)
    }

    /// Calls the stored callable.
    #[inline]
    pub fn invoke(&self, event: &dyn Event) -> HandlerResult {
        self.invoker.invoke(event)
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Handler {}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("owner", &self.owner)
            .field("method", &self.method)
            .field("event_type", &self.event_type)
            .field("priority", &self.priority)
            .field("group", &self.group)
            .finish()
    }
}
