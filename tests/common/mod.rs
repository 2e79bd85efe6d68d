//! Shared fixtures for the dispatch integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use typebus::{
    AsyncEvent, Bus, BusBuilder, CancelFlag, Cancellable, Config, Event,
    ExceptionHandler, Handler, HandlerError, IterableEvent, Method, Parent, Scan, Subscribe,
};

// ---------------------------------------------------------------------------
// Journal
// ---------------------------------------------------------------------------

/// Thread-safe list of observations.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().push(entry.into());
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock())
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.0.lock().clone()
    }
}

// ---------------------------------------------------------------------------
// Owners
// ---------------------------------------------------------------------------

/// Owner whose scan yields a fixed list of methods.
pub struct Table(Vec<Method>);

impl Table {
    pub fn new(methods: impl IntoIterator<Item = Method>) -> Arc<Self> {
        Arc::new(Self(methods.into_iter().collect()))
    }
}

impl Subscribe for Table {
    fn handlers(self: Arc<Self>, scan: &mut Scan) {
        for method in &self.0 {
            scan.push(method.clone());
        }
    }
}

/// Sync handler for `E` that records `label`.
pub fn record<E: Event>(journal: &Journal, label: &'static str) -> Method {
    let journal = journal.clone();
    Method::sync(label, move |_: &E| {
        journal.push(label);
        Ok(())
    })
}

/// Sync handler for `E` that records `label` and then fails.
pub fn record_then_fail<E: Event>(journal: &Journal, label: &'static str) -> Method {
    let journal = journal.clone();
    Method::sync(label, move |_: &E| {
        journal.push(label);
        Err(HandlerError::fail(label))
    })
}

/// Exception handler writing `"<method>: <label>"` and claiming everything.
pub fn capture_errors(journal: &Journal) -> impl ExceptionHandler {
    let journal = journal.clone();
    move |_: &Bus, handler: &Handler, _: &dyn Event, err: &HandlerError| {
        journal.push(format!("{}: {}", handler.method(), err.as_label()));
        true
    }
}

pub fn quiet(cfg: Config) -> BusBuilder {
    Bus::builder(cfg).without_logger()
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct Ping;
impl Event for Ping {}

#[derive(Debug, Default)]
pub struct Input {
    pub device: u8,
}
impl Event for Input {}

#[derive(Debug, Default)]
pub struct KeyPressed {
    pub base: Input,
    pub key: char,
}
impl Event for KeyPressed {
    fn parent() -> Option<Parent<Self>> {
        Some(Parent::of(|e: &Self| &e.base))
    }
}

#[derive(Debug, Default)]
pub struct MouseMoved {
    pub base: Input,
}
impl Event for MouseMoved {
    fn parent() -> Option<Parent<Self>> {
        Some(Parent::of(|e: &Self| &e.base))
    }
}

/// Plain event with an internal stop flag.
#[derive(Debug, Default)]
pub struct Stoppable {
    pub flag: CancelFlag,
}
impl Event for Stoppable {
    fn as_cancellable(&self) -> Option<&dyn Cancellable> {
        Some(&self.flag)
    }
}

/// Async event.
#[derive(Debug, Default)]
pub struct Job {
    pub token: CancellationToken,
    pub flag: CancelFlag,
    pub serial_default: bool,
}

impl Job {
    pub fn serial() -> Self {
        Self {
            serial_default: true,
            ..Self::default()
        }
    }
}

impl AsyncEvent for Job {
    fn cancellation(&self) -> &CancellationToken {
        &self.token
    }
    fn synchronize_default_group(&self) -> bool {
        self.serial_default
    }
}

impl Event for Job {
    fn as_async(&self) -> Option<&dyn AsyncEvent> {
        Some(self)
    }
    fn as_cancellable(&self) -> Option<&dyn Cancellable> {
        Some(&self.flag)
    }
}

/// Iterable event.
#[derive(Debug, Default)]
pub struct Query {
    pub flag: CancelFlag,
    pub token: Option<CancellationToken>,
}

impl IterableEvent for Query {
    fn cancellation(&self) -> Option<&CancellationToken> {
        self.token.as_ref()
    }
}

impl Event for Query {
    fn as_iterable(&self) -> Option<&dyn IterableEvent> {
        Some(self)
    }
    fn as_cancellable(&self) -> Option<&dyn Cancellable> {
        Some(&self.flag)
    }
}
