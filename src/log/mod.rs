//! # Diagnostics sink.
//!
//! The bus reports registration decisions, node derivation and unclaimed handler
//! failures through an optional [`Logger`]. Dispatch behaves identically with or
//! without one.
//!
//! With the `logging` feature (on by default) [`TracingLogger`] forwards
//! everything to `tracing` and is installed unless the builder is told
//! otherwise.
//!
//! ## Example
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use typebus::{Bus, Config, Logger};
//!
//! #[derive(Default)]
//! struct Collect(Mutex<Vec<String>>);
//!
//! impl Logger for Collect {
//!     fn debug(&self, msg: &str) { self.0.lock().unwrap().push(msg.to_owned()); }
//!     fn info(&self, msg: &str) { self.debug(msg) }
//!     fn warn(&self, msg: &str) { self.debug(msg) }
//!     fn error(&self, msg: &str) { self.debug(msg) }
//! }
//!
//! let sink = Arc::new(Collect::default());
//! let bus = Bus::builder(Config::default()).with_logger(sink.clone()).build();
//! # let _ = bus;
//! ```

#[cfg(feature = "logging")]
mod tracing_logger;

#[cfg(feature = "logging")]
pub use tracing_logger::TracingLogger;

use std::fmt;
use std::sync::Arc;

/// Structured logger accepted by the bus.
pub trait Logger: Send + Sync + 'static {
    fn debug(&self, msg: &str);
    fn info(&self, msg: &str);
    fn warn(&self, msg: &str);
    fn error(&self, msg: &str);
}

/// Optional logger plus lazy formatting: messages are only rendered when a
/// logger is present.
#[derive(Clone, Default)]
pub(crate) struct Diagnostics {
    logger: Option<Arc<dyn Logger>>,
}

impl Diagnostics {
    pub(crate) fn new(logger: Option<Arc<dyn Logger>>) -> Self {
        Self { logger }
    }

    pub(crate) fn logger(&self) -> Option<&Arc<dyn Logger>> {
        self.logger.as_ref()
    }

    pub(crate) fn debug(&self, args: fmt::Arguments<'_>) {
        if let Some(l) = &self.logger {
            l.debug(&args.to_string());
        }
    }

    pub(crate) fn info(&self, args: fmt::Arguments<'_>) {
        if let Some(l) = &self.logger {
            l.info(&args.to_string());
        }
    }

    pub(crate) fn warn(&self, args: fmt::Arguments<'_>) {
        if let Some(l) = &self.logger {
            l.warn(&args.to_string());
        }
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("enabled", &self.logger.is_some())
            .finish()
    }
}
