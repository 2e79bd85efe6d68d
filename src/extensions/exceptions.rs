//! # Exception handling chain.
//!
//! Every [`HandlerError`] raised during dispatch is offered to the chain in order;
//! the first handler returning `true` claims it and the rest are skipped. The
//! default [`LogExceptions`] sits last, logs, and claims everything, so by default
//! nothing ever reaches the publisher.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use typebus::{Bus, Config, Event, Handler, HandlerError};
//!
//! let panics = Arc::new(AtomicUsize::new(0));
//! let seen = Arc::clone(&panics);
//!
//! let bus = Bus::builder(Config::default())
//!     .with_exception_handler(move |_: &Bus, _: &Handler, _: &dyn Event, err: &HandlerError| {
//!         if matches!(err, HandlerError::Panicked { .. }) {
//!             seen.fetch_add(1, Ordering::Relaxed);
//!             return true;
//!         }
//!         false // fall through to logging
//!     })
//!     .build();
//! # let _ = bus;
//! ```

use crate::core::Bus;
use crate::error::HandlerError;
use crate::events::Event;
use crate::handlers::Handler;

/// Link of the exception chain.
pub trait ExceptionHandler: Send + Sync + 'static {
    /// Returns `true` to claim the error and stop the chain.
    fn catch(&self, bus: &Bus, handler: &Handler, event: &dyn Event, error: &HandlerError)
        -> bool;
}

impl<F> ExceptionHandler for F
where
    F: Fn(&Bus, &Handler, &dyn Event, &HandlerError) -> bool + Send + Sync + 'static,
{
    fn catch(
        &self,
        bus: &Bus,
        handler: &Handler,
        event: &dyn Event,
        error: &HandlerError,
    ) -> bool {
        self(bus, handler, event, error)
    }
}

/// Default link: logs at error level and claims every error.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogExceptions;

impl ExceptionHandler for LogExceptions {
    fn catch(
        &self,
        bus: &Bus,
        handler: &Handler,
        event: &dyn Event,
        error: &HandlerError,
    ) -> bool {
        if let Some(logger) = bus.logger() {
            logger.error(&format!(
                "handler {}::{} failed on {}: {} [{}]",
                handler.owner_name(),
                handler.method(),
                event.event_type(),
                error.as_message(),
                error.as_label(),
            ));
        }
        true
    }
}
