//! # Published values and their type identities.
//!
//! [`Event`] is implemented by every value that travels through the bus.
//! [`EventType`] identifies a concrete event type together with its declared
//! parent, which is how the bus builds its dispatch tree.
//!
//! A subtype declares its parent with a [`Parent`] built from a projection to
//! the embedded parent value. The same declaration routes the subtype into its
//! ancestors' handler lists and gives those handlers their typed view, so the
//! two cannot disagree.
//!
//! ## Example
//! ```rust
//! use typebus::{Event, EventType, Parent};
//!
//! struct Input { device: u8 }
//! impl Event for Input {}
//!
//! struct KeyPressed { base: Input, key: char }
//! impl Event for KeyPressed {
//!     fn parent() -> Option<Parent<Self>> {
//!         Some(Parent::of(|k: &Self| &k.base))
//!     }
//! }
//!
//! let ev = KeyPressed { base: Input { device: 2 }, key: 'q' };
//! let erased: &dyn Event = &ev;
//! assert_eq!(erased.downcast_ref::<Input>().map(|i| i.device), Some(2));
//! assert_eq!(erased.downcast_ref::<KeyPressed>().map(|k| k.key), Some('q'));
//! assert_eq!(EventType::of::<KeyPressed>().parent(), Some(EventType::of::<Input>()));
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use super::capability::{AsyncEvent, Cancellable, IterableEvent};

/// Value published through the [`Bus`](crate::Bus).
///
/// Every method has a default; a plain event is just `impl Event for T {}`.
/// The capability accessors select the dispatch discipline:
/// - neither async nor iterable → [`Bus::publish`](crate::Bus::publish)
/// - [`as_async`](Event::as_async) → [`Bus::publish_async`](crate::Bus::publish_async)
/// - [`as_iterable`](Event::as_iterable) → [`Bus::publish_iterable`](crate::Bus::publish_iterable)
pub trait Event: EventMeta + Send + Sync + 'static {
    /// Declared parent. `None` places the type directly below the root.
    fn parent() -> Option<Parent<Self>>
    where
        Self: Sized,
    {
        None
    }

    /// Internal "should stop" predicate, polled before every handler.
    fn as_cancellable(&self) -> Option<&dyn Cancellable> {
        None
    }

    /// Marks the event for asynchronous dispatch.
    fn as_async(&self) -> Option<&dyn AsyncEvent> {
        None
    }

    /// Marks the event for lazy-sequence dispatch.
    fn as_iterable(&self) -> Option<&dyn IterableEvent> {
        None
    }
}

/// Object-safe type information, implemented for every [`Event`].
pub trait EventMeta: Any {
    /// Upcast for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Concrete type of this value.
    fn event_type(&self) -> EventType;

    /// Embedded value of the declared parent type.
    fn base(&self) -> Option<&dyn Event>;
}

impl<E: Event> EventMeta for E {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn event_type(&self) -> EventType {
        EventType::of::<E>()
    }

    fn base(&self) -> Option<&dyn Event> {
        E::parent().map(|parent| parent.view.project(self))
    }
}

/// Parent declaration of `E`: the parent's type plus the way to reach the
/// embedded parent value.
pub struct Parent<E> {
    ty: EventType,
    view: Box<dyn Project<E>>,
}

impl<E: Event> Parent<E> {
    /// Declares `P` as the parent, reached through `view`.
    ///
    /// `view` is usually a field access such as `|k: &Self| &k.base`.
    pub fn of<P, F>(view: F) -> Self
    where
        P: Event,
        F: Fn(&E) -> &P,
        F: 'static,
    {
        Self {
            ty: EventType::of::<P>(),
            view: Box::new(Projection {
                view,
                _parent: PhantomData::<fn() -> P>,
            }),
        }
    }

    /// Type of the declared parent.
    pub fn event_type(&self) -> EventType {
        self.ty
    }
}

impl<E> fmt::Debug for Parent<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Parent").field(&self.ty).finish()
    }
}

trait Project<E> {
    fn project<'a>(&self, event: &'a E) -> &'a dyn Event;
}

struct Projection<F, P> {
    view: F,
    _parent: PhantomData<fn() -> P>,
}

impl<E, P, F> Project<E> for Projection<F, P>
where
    P: Event,
    F: Fn(&E) -> &P,
{
    fn project<'a>(&self, event: &'a E) -> &'a dyn Event {
        (self.view)(event)
    }
}

impl dyn Event {
    /// Returns `true` if the value is, or embeds through its parent chain, an `E`.
    pub fn is<E: Event>(&self) -> bool {
        self.downcast_ref::<E>().is_some()
    }

    /// Views the value as `E`, walking [`EventMeta::base`] links towards the root.
    pub fn downcast_ref<E: Event>(&self) -> Option<&E> {
        let mut current: &dyn Event = self;
        loop {
            if let Some(found) = current.as_any().downcast_ref::<E>() {
                return Some(found);
            }
            current = current.base()?;
        }
    }

    /// Name of the capability that selects a discipline other than `publish`.
    pub(crate) fn special_capability(&self) -> Option<&'static str> {
        if self.as_async().is_some() {
            Some("async")
        } else if self.as_iterable().is_some() {
            Some("iterable")
        } else {
            None
        }
    }
}

/// Identity of an event type plus its declared parent.
///
/// Equality and hashing use the `TypeId` only.
#[derive(Clone, Copy)]
pub struct EventType {
    id: TypeId,
    name: &'static str,
    parent: fn() -> Option<EventType>,
}

fn no_parent() -> Option<EventType> {
    None
}

fn declared_parent<E: Event>() -> Option<EventType> {
    E::parent().map(|parent| parent.ty)
}

impl EventType {
    /// Type identity of `E`.
    pub fn of<E: Event>() -> Self {
        Self {
            id: TypeId::of::<E>(),
            name: std::any::type_name::<E>(),
            parent: declared_parent::<E>,
        }
    }

    /// The root of every hierarchy; handlers registered here see every event.
    pub fn root() -> Self {
        Self {
            id: TypeId::of::<dyn Event>(),
            name: "Event",
            parent: no_parent,
        }
    }

    /// Underlying `TypeId`.
    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Type name (for logs).
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.id == TypeId::of::<dyn Event>()
    }

    /// Parent in the hierarchy; `None` only for the root.
    pub fn parent(&self) -> Option<EventType> {
        if self.is_root() {
            None
        } else {
            Some((self.parent)().unwrap_or_else(EventType::root))
        }
    }
}

impl PartialEq for EventType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EventType {}

impl Hash for EventType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
