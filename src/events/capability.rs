//! # Optional event capabilities.
//!
//! Capabilities are orthogonal flags, not parents in the hierarchy:
//! - [`Cancellable`]: event-owned "should stop" predicate, polled before every
//!   handler (and after every pull in the sequence discipline);
//! - [`AsyncEvent`]: external [`CancellationToken`] plus the default-group flag;
//! - [`IterableEvent`]: handlers may return lazy sequences.
//!
//! ## Example
//! ```rust
//! use typebus::{CancelFlag, Cancellable, Event};
//!
//! #[derive(Default)]
//! struct Shutdown { stop: CancelFlag }
//!
//! impl Event for Shutdown {
//!     fn as_cancellable(&self) -> Option<&dyn Cancellable> { Some(&self.stop) }
//! }
//!
//! let ev = Shutdown::default();
//! assert!(!ev.stop.is_cancelled());
//! ev.stop.cancel();
//! assert!(ev.stop.is_cancelled());
//! ```

use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;

use super::event::Event;

/// Event-owned cancellation predicate.
///
/// Polled from arbitrary threads without any bus lock; implementations must be
/// safe to call concurrently with their own mutation.
pub trait Cancellable: Send + Sync {
    /// `true` once remaining handlers should be skipped.
    fn is_cancelled(&self) -> bool;
}

/// Capability selecting [`Bus::publish_async`](crate::Bus::publish_async).
pub trait AsyncEvent: Send + Sync {
    /// External cancellation signal, checked before each handler.
    fn cancellation(&self) -> &CancellationToken;

    /// When `true`, handlers without a concurrency group run sequentially as one
    /// implicit group instead of one unit each.
    fn synchronize_default_group(&self) -> bool {
        false
    }
}

/// Capability selecting [`Bus::publish_iterable`](crate::Bus::publish_iterable).
pub trait IterableEvent: Send + Sync {
    /// Optional external cancellation signal, checked before each handler and pull.
    fn cancellation(&self) -> Option<&CancellationToken> {
        None
    }
}

/// Lock-free [`Cancellable`] state to embed in events.
#[derive(Debug, Default)]
pub struct CancelFlag {
    cancelled: AtomicBool,
}

impl CancelFlag {
    /// Creates a flag in the "running" state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests that remaining handlers be skipped.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }
}

impl Cancellable for CancelFlag {
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Combined check point: external token first, then the event's own predicate.
#[inline]
pub(crate) fn should_stop(event: &dyn Event, token: Option<&CancellationToken>) -> bool {
    token.is_some_and(|t| t.is_cancelled())
        || event.as_cancellable().is_some_and(|c| c.is_cancelled())
}
