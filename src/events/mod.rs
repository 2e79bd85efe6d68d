//! Event data model: the [`Event`] trait, type identities and capabilities.
//!
//! ## Contents
//! - [`Event`], [`EventType`], [`Parent`] the published value and its position in the hierarchy
//! - [`Cancellable`], [`AsyncEvent`], [`IterableEvent`] optional capabilities
//! - [`CancelFlag`] ready-made lock-free [`Cancellable`] state
//!
//! ## Hierarchy
//! ```text
//!                    Event (root, always present)
//!                   /                \
//!              Input                 Tick
//!             /     \
//!     KeyPressed   MouseMoved
//! ```
//! A type names its parent through [`Event::parent`], as a [`Parent`] that also
//! projects to the embedded ancestor value. Handlers subscribed to `Input`
//! receive `KeyPressed` events viewed as `Input`.

mod capability;
mod event;

pub use capability::{AsyncEvent, CancelFlag, Cancellable, IterableEvent};
pub use event::{Event, EventMeta, EventType, Parent};

pub(crate) use capability::should_stop;
