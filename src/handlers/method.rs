//! # Scan candidates (`Method`)
//!
//! A [`Method`] describes one callable an owner offers during a [`Scan`](super::Scan):
//! name, declaring type, parameter list, priority, concurrency group, metadata
//! tags, the shape of its return value and the call itself.
//!
//! Typed constructors wrap a closure over the concrete event type and produce
//! exactly one event parameter. [`Method::raw`] lets code generators or other
//! discovery mechanisms describe arbitrary signatures; the bus rejects those that
//! do not take exactly one event parameter.
//!
//! ## Example
//! ```rust
//! use typebus::{Event, HandlerError, Method, ReturnShape};
//!
//! struct Ping;
//! impl Event for Ping {}
//!
//! let m = Method::sync("on_ping", |_ev: &Ping| Ok::<_, HandlerError>(()))
//!     .priority(100)
//!     .group("net")
//!     .tag("audit");
//!
//! assert_eq!(m.name(), "on_ping");
//! assert_eq!(m.priority_value(), 100);
//! assert_eq!(m.group_name(), "net");
//! assert_eq!(m.returns(), ReturnShape::Unit);
//! ```

use std::any::{type_name, Any};
use std::future::Future;
use std::sync::Arc;

use crate::error::HandlerError;
use crate::events::{Event, EventType};
use crate::extensions::Awaitable;

use super::handler::{HandlerResult, Invoke, InvokeRef};

/// Lazy, non-restartable sequence returned by iterable handlers.
pub type Sequence<T> = Box<dyn Iterator<Item = Result<T, HandlerError>> + Send>;

/// Declared parameter of a candidate method.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Param {
    /// Parameter of an event type.
    Event(EventType),
    /// Anything else (type name only).
    Other(&'static str),
}

/// Shape of the value a method returns; lets factories pick an implementation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReturnShape {
    /// Nothing to await or iterate.
    Unit,
    /// An [`Awaitable`].
    Future,
    /// A [`Sequence`].
    Sequence,
    /// Any other value; resolved through the awaitable converters.
    Value(&'static str),
}

/// Candidate method produced by a registration scan.
#[derive(Clone)]
pub struct Method {
    name: Arc<str>,
    declaring_type: &'static str,
    params: Vec<Param>,
    priority: i32,
    group: Arc<str>,
    tags: Vec<&'static str>,
    returns: ReturnShape,
    call: InvokeRef,
}

fn view<E: Event>(event: &dyn Event) -> Result<&E, HandlerError> {
    event.downcast_ref::<E>().ok_or(HandlerError::EventMismatch {
        expected: type_name::<E>(),
    })
}

impl Method {
    /// Describes an arbitrary signature.
    pub fn raw(
        name: impl Into<Arc<str>>,
        params: Vec<Param>,
        returns: ReturnShape,
        call: impl Invoke,
    ) -> Self {
        Self {
            name: name.into(),
            declaring_type: "",
            params,
            priority: 0,
            group: Arc::from(""),
            tags: Vec::new(),
            returns,
            call: Arc::new(call),
        }
    }

    /// Synchronous handler for `E`.
    pub fn sync<E, F>(name: impl Into<Arc<str>>, f: F) -> Self
    where
        E: Event,
        F: Fn(&E) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        let call = move |event: &dyn Event| -> HandlerResult {
            f(view::<E>(event)?)?;
            Ok(None)
        };
        Self::raw(name, vec![Param::Event(EventType::of::<E>())], ReturnShape::Unit, call)
    }

    /// Handler for every event, registered at the root of the hierarchy.
    pub fn any<F>(name: impl Into<Arc<str>>, f: F) -> Self
    where
        F: Fn(&dyn Event) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        let call = move |event: &dyn Event| -> HandlerResult {
            f(event)?;
            Ok(None)
        };
        Self::raw(name, vec![Param::Event(EventType::root())], ReturnShape::Unit, call)
    }

    /// Asynchronous handler for `E`; the future is awaited by `publish_async`.
    ///
    /// The closure runs synchronously and must move what it needs into the future.
    pub fn future<E, F, Fut>(name: impl Into<Arc<str>>, f: F) -> Self
    where
        E: Event,
        F: Fn(&E) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        let call = move |event: &dyn Event| -> HandlerResult {
            let fut: Awaitable = Box::pin(f(view::<E>(event)?));
            Ok(Some(Box::new(fut)))
        };
        Self::raw(name, vec![Param::Event(EventType::of::<E>())], ReturnShape::Future, call)
    }

    /// Iterable handler for `E`; its items feed `publish_iterable`.
    pub fn sequence<E, T, F, I>(name: impl Into<Arc<str>>, f: F) -> Self
    where
        E: Event,
        T: Send + 'static,
        F: Fn(&E) -> I + Send + Sync + 'static,
        I: IntoIterator<Item = Result<T, HandlerError>>,
        I::IntoIter: Send + 'static,
    {
        let call = move |event: &dyn Event| -> HandlerResult {
            let seq: Sequence<T> = Box::new(f(view::<E>(event)?).into_iter());
            Ok(Some(Box::new(seq)))
        };
        Self::raw(name, vec![Param::Event(EventType::of::<E>())], ReturnShape::Sequence, call)
    }

    /// Handler returning an arbitrary value, resolved through the awaitable converters.
    pub fn returning<E, R, F>(name: impl Into<Arc<str>>, f: F) -> Self
    where
        E: Event,
        R: Any + Send,
        F: Fn(&E) -> Result<R, HandlerError> + Send + Sync + 'static,
    {
        let call = move |event: &dyn Event| -> HandlerResult {
            let value = f(view::<E>(event)?)?;
            Ok(Some(Box::new(value)))
        };
        Self::raw(
            name,
            vec![Param::Event(EventType::of::<E>())],
            ReturnShape::Value(type_name::<R>()),
            call,
        )
    }

    /// Sets the priority (default `0`, higher runs first).
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the concurrency group (default empty).
    pub fn group(mut self, group: impl Into<Arc<str>>) -> Self {
        self.group = group.into();
        self
    }

    /// Attaches a metadata tag, visible to invocation filters.
    pub fn tag(mut self, tag: &'static str) -> Self {
        self.tags.push(tag);
        self
    }

    /// Overrides the declaring type (defaults to the owner name).
    pub fn declared_by(mut self, declaring_type: &'static str) -> Self {
        self.declaring_type = declaring_type;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn name_arc(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }

    pub fn declaring_type(&self) -> &'static str {
        self.declaring_type
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn priority_value(&self) -> i32 {
        self.priority
    }

    pub fn group_name(&self) -> &str {
        &self.group
    }

    pub(crate) fn group_arc(&self) -> Arc<str> {
        Arc::clone(&self.group)
    }

    pub fn tags(&self) -> &[&'static str] {
        &self.tags
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| *t == tag)
    }

    pub fn returns(&self) -> ReturnShape {
        self.returns
    }

    /// The call as scanned; the default factory uses it unchanged.
    pub fn call(&self) -> &InvokeRef {
        &self.call
    }

    /// The single event parameter, if the signature has exactly one.
    pub(crate) fn event_param(&self) -> Option<EventType> {
        match self.params.as_slice() {
            [Param::Event(ty)] => Some(*ty),
            _ => None,
        }
    }

    pub(crate) fn default_declaring_type(&mut self, owner: &'static str) {
        if self.declaring_type.is_empty() {
            self.declaring_type = owner;
        }
    }
}

impl std::fmt::Debug for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Method")
            .field("name", &self.name)
            .field("declaring_type", &self.declaring_type)
            .field("params", &self.params)
            .field("priority", &self.priority)
            .field("group", &self.group)
            .field("tags", &self.tags)
            .field("returns", &self.returns)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ping(u32);
    impl Event for Ping {}

    struct Pong;
    impl Event for Pong {}

    #[test]
    fn sync_method_views_its_event() {
        let m = Method::sync("on_ping", |ev: &Ping| {
            if ev.0 == 0 {
                Err(HandlerError::fail("zero"))
            } else {
                Ok(())
            }
        });

        assert_eq!(m.event_param(), Some(EventType::of::<Ping>()));
        assert!(m.call().invoke(&Ping(1)).unwrap().is_none());
        assert_eq!(m.call().invoke(&Ping(0)).unwrap_err(), HandlerError::fail("zero"));
        assert!(matches!(
            m.call().invoke(&Pong),
            Err(HandlerError::EventMismatch { .. })
        ));
    }

    #[test]
    fn sequence_method_returns_boxed_sequence() {
        let m = Method::sequence("numbers", |ev: &Ping| (0..ev.0).map(Ok));
        let value = m.call().invoke(&Ping(3)).unwrap().unwrap();
        let seq = value.downcast::<Sequence<u32>>().ok().unwrap();
        let items: Vec<u32> = seq.map(Result::unwrap).collect();
        assert_eq!(items, vec![0, 1, 2]);
    }

    #[test]
    fn raw_method_with_two_params_has_no_event_param() {
        let m = Method::raw(
            "two",
            vec![Param::Event(EventType::of::<Ping>()), Param::Other("u8")],
            ReturnShape::Unit,
            |_ev: &dyn Event| -> HandlerResult { Ok(None) },
        );
        assert_eq!(m.event_param(), None);

        let other = Method::raw(
            "not_event",
            vec![Param::Other("String")],
            ReturnShape::Unit,
            |_ev: &dyn Event| -> HandlerResult { Ok(None) },
        );
        assert_eq!(other.event_param(), None);
    }

    #[test]
    fn declaring_type_defaults_once() {
        let mut m = Method::any("all", |_| Ok(()));
        m.default_declaring_type("Owner");
        assert_eq!(m.declaring_type(), "Owner");

        let mut n = Method::any("all", |_| Ok(())).declared_by("Mixin");
        n.default_declaring_type("Owner");
        assert_eq!(n.declaring_type(), "Mixin");
    }
}
