//! # Lazy output of `publish_iterable`.
//!
//! [`EventSequence`] walks the node's ordered handlers on the caller's thread and
//! splices every returned sequence into one continuous iterator.
//!
//! ```text
//! handlers:  H1 (100) ──► [1, 2, Err]      H2 (50) ──► [3]      H3 (10) ──► 42 (not iterable)
//! output:    1, 2,                          3                    (skipped, still invoked)
//!                  └─► exception chain
//! ```
//!
//! ## Rules
//! - a handler is invoked only when the previous handler's sequence is drained;
//! - cancellation (event predicate or the event's optional token) is checked
//!   before each handler and before each pull; once it fires the whole output ends;
//! - an error or panic while pulling drops that handler's sequence and moves on;
//! - the output is not restartable; publishing again produces a fresh traversal.

use std::any::Any;
use std::fmt;
use std::iter::FusedIterator;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::{panic_message, HandlerError};
use crate::events::{should_stop, Event};
use crate::handlers::{HandlerRef, Sequence};

use super::bus::Bus;
use super::node::DispatchNode;
use super::runner;

/// Continuous lazy sequence of items produced by iterable handlers.
///
/// Handlers feed items by returning one of:
/// - a [`Sequence<T>`](crate::Sequence) (fallible items, see [`Method::sequence`](crate::Method::sequence));
/// - a `Box<dyn Iterator<Item = T> + Send>`;
/// - a `Vec<T>`.
///
/// Anything else is treated as zero items.
pub struct EventSequence<E: Event, T> {
    bus: Bus,
    node: Arc<DispatchNode>,
    event: E,
    token: Option<CancellationToken>,
    next: usize,
    current: Option<(HandlerRef, Sequence<T>)>,
    done: bool,
}

impl<E: Event, T: Send + 'static> EventSequence<E, T> {
    pub(crate) fn new(bus: Bus, node: Arc<DispatchNode>, event: E) -> Self {
        let token = event
            .as_iterable()
            .and_then(|it| it.cancellation())
            .cloned();
        Self {
            bus,
            node,
            event,
            token,
            next: 0,
            current: None,
            done: false,
        }
    }

    /// The published event.
    pub fn event(&self) -> &E {
        &self.event
    }

    /// Stops the traversal and hands the event back.
    pub fn into_event(self) -> E {
        self.event
    }

    fn stopped(&self) -> bool {
        should_stop(&self.event, self.token.as_ref())
    }

    fn finish(&mut self) {
        self.done = true;
        self.current = None;
    }

    fn pull(&self, seq: &mut Sequence<T>) -> Option<Result<T, HandlerError>> {
        if !self.bus.config().catch_panics {
            return seq.next();
        }
        match panic::catch_unwind(AssertUnwindSafe(|| seq.next())) {
            Ok(item) => item,
            Err(payload) => Some(Err(HandlerError::Panicked {
                info: panic_message(payload.as_ref()),
            })),
        }
    }
}

/// Accepts the iterable shapes handlers may return.
fn into_sequence<T: Send + 'static>(value: Box<dyn Any + Send>) -> Option<Sequence<T>> {
    let value = match value.downcast::<Sequence<T>>() {
        Ok(seq) => return Some(*seq),
        Err(other) => other,
    };
    let value = match value.downcast::<Box<dyn Iterator<Item = T> + Send>>() {
        Ok(iter) => return Some(Box::new(iter.map(Ok))),
        Err(other) => other,
    };
    value
        .downcast::<Vec<T>>()
        .ok()
        .map(|items| -> Sequence<T> { Box::new(items.into_iter().map(Ok)) })
}

impl<E: Event, T: Send + 'static> Iterator for EventSequence<E, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        while !self.done {
            if self.stopped() {
                self.finish();
                break;
            }

            if let Some((handler, mut seq)) = self.current.take() {
                match self.pull(&mut seq) {
                    Some(Ok(item)) => {
                        self.current = Some((handler, seq));
                        return Some(item);
                    }
                    Some(Err(err)) => self.bus.raise(&handler, &self.event, err),
                    None => {}
                }
                continue;
            }

            let Some(handler) = self.node.handlers().get(self.next).cloned() else {
                self.finish();
                break;
            };
            self.next += 1;

            match runner::invoke(&handler, &self.event, self.bus.config().catch_panics) {
                Ok(Some(value)) => {
                    if let Some(seq) = into_sequence::<T>(value) {
                        self.current = Some((handler, seq));
                    }
                }
                Ok(None) => {}
                Err(err) => self.bus.raise(&handler, &self.event, err),
            }
        }
        None
    }
}

impl<E: Event, T: Send + 'static> FusedIterator for EventSequence<E, T> {}

impl<E: Event, T> fmt::Debug for EventSequence<E, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSequence")
            .field("event", &self.node.event_type())
            .field("next_handler", &self.next)
            .field("pulling", &self.current.is_some())
            .field("done", &self.done)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepted_shapes() {
        let seq: Sequence<u8> = Box::new(vec![Ok(1), Err(HandlerError::fail("x"))].into_iter());
        let got: Vec<_> = into_sequence::<u8>(Box::new(seq)).unwrap().collect();
        assert_eq!(got, vec![Ok(1), Err(HandlerError::fail("x"))]);

        let plain: Box<dyn Iterator<Item = u8> + Send> = Box::new(2..4);
        let got: Vec<_> = into_sequence::<u8>(Box::new(plain)).unwrap().collect();
        assert_eq!(got, vec![Ok(2), Ok(3)]);

        let got: Vec<_> = into_sequence::<u8>(Box::new(vec![9u8])).unwrap().collect();
        assert_eq!(got, vec![Ok(9)]);
    }

    #[test]
    fn other_values_are_not_sequences() {
        assert!(into_sequence::<u8>(Box::new(7u8)).is_none());
        assert!(into_sequence::<u8>(Box::new(vec![1u16])).is_none());
    }
}
