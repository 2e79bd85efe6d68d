//! # Bus: registration manager and the three publish disciplines.
//!
//! The [`Bus`] owns the type hierarchy registry, the extension chains and the
//! optional concurrency limiter. It is cheap to clone; clones share state.
//!
//! ## Key responsibilities
//! - turn owners into handlers (filters → scan → arity check → factories)
//! - insert/remove handlers along the event type hierarchy (write lock)
//! - dispatch events: `publish`, `publish_async`, `publish_iterable`
//! - route every handler failure through the exception chain
//!
//! ## High-level architecture
//! ```text
//! register(owner):
//!   registrant filters ──► duplicate? ──► scan (no lock) ──► invocation filters
//!        │ reject              │ yes                               │
//!        ▼                     ▼                                   ▼
//!      false                 false               event param? ──► factories ──► Handler
//!                                                                                  │
//!   write lock ◄──────────────────────────────────────────────────────────────────┘
//!     └─► Registry::insert (declared type + known descendants), record owner
//!
//! publish*(event):
//!   capability check ──► node_for(type)   (read lock; write lock only to derive)
//!                          │
//!        ┌─────────────────┼─────────────────────┐
//!        ▼                 ▼                     ▼
//!   sync loop       JoinSet of DispatchUnit   EventSequence
//!        │                 │                     │
//!        └──── Err ───► exception chain ◄────────┘
//! ```
//!
//! ## Rules
//! - publishers never see handler errors; only [`DispatchError`] usage errors;
//! - a dispatch iterates its own `Arc` of the node, so concurrent (un)registration
//!   never changes the list it is walking;
//! - duplicate and filtered owners are ignored (logged at debug).
//!
//! ## Example
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use typebus::{Bus, Config, Event, Method, Scan, Subscribe};
//!
//! struct Ping;
//! impl Event for Ping {}
//!
//! #[derive(Default)]
//! struct Recorder { calls: Mutex<Vec<&'static str>> }
//!
//! impl Subscribe for Recorder {
//!     fn handlers(self: Arc<Self>, scan: &mut Scan) {
//!         let a = Arc::clone(&self);
//!         scan.push(Method::sync("a", move |_: &Ping| {
//!             a.calls.lock().unwrap().push("A");
//!             Ok(())
//!         }).priority(100));
//!         scan.push(Method::sync("b", move |_: &Ping| {
//!             self.calls.lock().unwrap().push("B");
//!             Ok(())
//!         }).priority(50));
//!     }
//! }
//!
//! let bus = Bus::new(Config::default());
//! let recorder = Arc::new(Recorder::default());
//! assert!(bus.register(&recorder));
//!
//! bus.publish(Ping).unwrap();
//! assert_eq!(*recorder.calls.lock().unwrap(), vec!["A", "B"]);
//! ```

use std::any::type_name;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::error::{panic_message, DispatchError, HandlerError, RegistrationError};
use crate::events::{should_stop, Event, EventType};
use crate::extensions::{
    Awaitables, Chain, ExceptionHandler, InvocationFactory, InvocationFilter, RegistrantFilter,
};
use crate::handlers::{Handler, HandlerKey, HandlerRef, Method, Owner, Scan};
use crate::log::{Diagnostics, Logger};

use super::builder::BusBuilder;
use super::config::Config;
use super::node::DispatchNode;
use super::registry::Registry;
use super::runner;
use super::sequence::EventSequence;
use super::unit::DispatchUnit;

/// State shared by every clone of a [`Bus`].
pub(crate) struct Inner {
    pub(crate) cfg: Config,
    pub(crate) registry: RwLock<Registry>,
    pub(crate) registrant_filters: Chain<dyn RegistrantFilter>,
    pub(crate) invocation_filters: Chain<dyn InvocationFilter>,
    pub(crate) factories: Chain<dyn InvocationFactory>,
    pub(crate) exceptions: Chain<dyn ExceptionHandler>,
    pub(crate) awaitables: Awaitables,
    pub(crate) semaphore: Option<Semaphore>,
    pub(crate) diag: Diagnostics,
}

/// Typed in-process event bus.
#[derive(Clone)]
pub struct Bus {
    inner: Arc<Inner>,
}

impl Bus {
    /// Bus with the default chains and, with the `logging` feature, the tracing logger.
    pub fn new(cfg: Config) -> Self {
        BusBuilder::new(cfg).build()
    }

    /// Starts a builder for custom filters, factories, handlers and converters.
    pub fn builder(cfg: Config) -> BusBuilder {
        BusBuilder::new(cfg)
    }

    pub(crate) fn from_inner(inner: Inner) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Configuration the bus was built with.
    pub fn config(&self) -> &Config {
        &self.inner.cfg
    }

    /// Diagnostics sink, if any.
    pub fn logger(&self) -> Option<&Arc<dyn Logger>> {
        self.inner.diag.logger()
    }

    /// Awaitable converters and their per-type cache.
    pub fn awaitables(&self) -> &Awaitables {
        &self.inner.awaitables
    }

    pub(crate) fn semaphore(&self) -> Option<&Semaphore> {
        self.inner.semaphore.as_ref()
    }

    // ---- registration ----

    /// Registers an owner's handlers.
    ///
    /// Returns `false` when a registrant filter rejects the owner or it is
    /// already registered. Methods excluded by invocation filters, the
    /// event-parameter check or a failing factory are skipped individually.
    pub fn register(&self, owner: impl Into<Owner>) -> bool {
        let owner = owner.into();
        let diag = &self.inner.diag;

        if self.rejected(&owner) {
            diag.debug(format_args!("owner {} rejected by registrant filter", owner.name()));
            return false;
        }
        if self.inner.registry.read().contains(owner.key()) {
            diag.debug(format_args!("owner {} already registered", owner.name()));
            return false;
        }

        let handlers = self.build_handlers(&owner);

        let mut registry = self.inner.registry.write();
        if registry.contains(owner.key()) {
            diag.debug(format_args!("owner {} already registered", owner.name()));
            return false;
        }
        let mut inserted = Vec::with_capacity(handlers.len());
        for handler in handlers {
            match registry.insert(&handler) {
                Ok(()) => inserted.push(handler),
                Err(err) => diag.warn(format_args!(
                    "skipping {}::{}: {} [{}]",
                    owner.name(),
                    handler.method(),
                    err,
                    err.as_label()
                )),
            }
        }
        diag.info(format_args!(
            "registered {} with {} handlers",
            owner.name(),
            inserted.len()
        ));
        registry.record(owner, inserted);
        true
    }

    /// Removes every handler of `owner` from every node. Returns `false` if it
    /// was not registered.
    pub fn unregister(&self, owner: impl Into<Owner>) -> bool {
        let owner = owner.into();
        let mut registry = self.inner.registry.write();
        let Some(handlers) = registry.forget(owner.key()) else {
            return false;
        };
        for handler in &handlers {
            registry.remove(handler);
        }
        self.inner.diag.debug(format_args!(
            "unregistered {} ({} handlers)",
            owner.name(),
            handlers.len()
        ));
        true
    }

    fn rejected(&self, owner: &Owner) -> bool {
        self.inner.registrant_filters.iter().any(|filter| {
            self.guarded(|| filter.rejects(owner), |info| filter_panicked(owner.name(), info))
                .unwrap_or(true)
        })
    }

    /// Runs a filter, scan or factory step, catching panics when configured to.
    fn guarded<R>(
        &self,
        f: impl FnOnce() -> R,
        on_panic: impl FnOnce(String) -> RegistrationError,
    ) -> Option<R> {
        if !self.inner.cfg.catch_panics {
            return Some(f());
        }
        match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(res) => Some(res),
            Err(payload) => {
                self.warn_registration(&on_panic(panic_message(payload.as_ref())));
                None
            }
        }
    }

    fn warn_registration(&self, err: &RegistrationError) {
        self.inner
            .diag
            .warn(format_args!("{} [{}]", err, err.as_label()));
    }

    /// Scans `owner` outside the lock and builds its handlers.
    fn build_handlers(&self, owner: &Owner) -> Vec<HandlerRef> {
        let mut scan = Scan::new(owner.name());
        let scanned = self.guarded(
            || owner.scan_into(&mut scan),
            |info| filter_panicked(owner.name(), info),
        );
        if scanned.is_none() {
            self.inner.diag.warn(format_args!(
                "scan of {} panicked; keeping {} candidates collected before the panic",
                owner.name(),
                scan.len()
            ));
        }

        let mut handlers = Vec::new();
        for (index, candidate) in scan.into_candidates().into_iter().enumerate() {
            let method = match candidate {
                Ok(method) => method,
                Err(err) => {
                    self.warn_registration(&err);
                    continue;
                }
            };
            if let Some(handler) = self.build_handler(owner, index, &method) {
                handlers.push(handler);
            }
        }
        handlers
    }

    fn build_handler(&self, owner: &Owner, index: usize, method: &Method) -> Option<HandlerRef> {
        let diag = &self.inner.diag;

        let filtered = self.inner.invocation_filters.iter().any(|filter| {
            self.guarded(
                || filter.rejects(owner, method),
                |info| filter_panicked(method.name(), info),
            )
            .unwrap_or(true)
        });
        if filtered {
            diag.debug(format_args!(
                "{}::{} rejected by invocation filter",
                owner.name(),
                method.name()
            ));
            return None;
        }

        let Some(event_type) = method.event_param() else {
            diag.debug(format_args!(
                "{}::{} skipped: needs exactly one event parameter, has {:?}",
                owner.name(),
                method.name(),
                method.params()
            ));
            return None;
        };

        for factory in self.inner.factories.iter() {
            let created = self.guarded(
                || factory.create(owner, method),
                |info| RegistrationError::FactoryPanicked {
                    method: method.name().to_string(),
                    info,
                },
            )?;
            match created {
                Ok(Some(invoker)) => {
                    let key = HandlerKey::new(owner.key(), index);
                    return Some(Arc::new(Handler::from_method(
                        key,
                        owner.name(),
                        method,
                        event_type,
                        invoker,
                    )));
                }
                Ok(None) => continue,
                Err(err) => {
                    self.warn_registration(&err);
                    return None;
                }
            }
        }
        diag.warn(format_args!(
            "no invocation factory accepted {}::{}",
            owner.name(),
            method.name()
        ));
        None
    }

    // ---- dispatch ----

    /// Node for `ty`, deriving it under the write lock on first use.
    fn node_for(&self, ty: EventType) -> Result<Arc<DispatchNode>, DispatchError> {
        if let Some(node) = self.inner.registry.read().get(ty.id()) {
            return Ok(node);
        }
        self.inner.registry.write().derive(ty)
    }

    /// Synchronous discipline: handlers run on the caller's thread in priority order.
    ///
    /// The event is handed back once every handler ran (or it was cancelled).
    /// Return values of handlers are dropped without awaiting.
    ///
    /// # Errors
    /// [`DispatchError::WrongDiscipline`] if the event is async or iterable.
    pub fn publish<E: Event>(&self, event: E) -> Result<E, DispatchError> {
        let erased: &dyn Event = &event;
        if let Some(capability) = erased.special_capability() {
            return Err(DispatchError::WrongDiscipline {
                event: type_name::<E>(),
                capability,
                expected: if capability == "async" {
                    "publish_async"
                } else {
                    "publish_iterable"
                },
            });
        }

        let node = self.node_for(EventType::of::<E>())?;
        let catch_panics = self.inner.cfg.catch_panics;
        for handler in node.handlers() {
            if should_stop(erased, None) {
                break;
            }
            if let Err(err) = runner::invoke(handler, erased, catch_panics) {
                self.raise(handler, erased, err);
            }
        }
        Ok(event)
    }

    /// Asynchronous discipline: groups run concurrently, handlers within a
    /// group run in priority order.
    ///
    /// Completes once every unit finished. Returns immediately (no handler
    /// invoked) when the event's token is already cancelled.
    ///
    /// # Errors
    /// [`DispatchError::MissingCapability`] if the event is not async.
    pub async fn publish_async<E: Event>(&self, event: E) -> Result<Arc<E>, DispatchError> {
        self.publish_shared(Arc::new(event)).await
    }

    /// [`publish_async`](Bus::publish_async) for an event that is already shared.
    pub async fn publish_shared<E: Event>(&self, event: Arc<E>) -> Result<Arc<E>, DispatchError> {
        let Some(capability) = event.as_async() else {
            return Err(DispatchError::MissingCapability {
                event: type_name::<E>(),
                capability: "async",
            });
        };
        let token = capability.cancellation().clone();
        let synchronize_default = capability.synchronize_default_group();
        if token.is_cancelled() {
            return Ok(event);
        }

        let node = self.node_for(EventType::of::<E>())?;
        let erased: Arc<dyn Event> = event.clone();

        let mut set = JoinSet::new();
        for group in node.groups() {
            if group.is_default() && !synchronize_default {
                for handler in group.handlers() {
                    let unit = DispatchUnit::new(
                        self.clone(),
                        Arc::clone(&erased),
                        vec![Arc::clone(handler)],
                        token.clone(),
                    );
                    set.spawn(unit.run());
                }
            } else {
                let unit = DispatchUnit::new(
                    self.clone(),
                    Arc::clone(&erased),
                    group.handlers().to_vec(),
                    token.clone(),
                );
                set.spawn(unit.run());
            }
        }
        drop(node);

        while let Some(res) = set.join_next().await {
            if let Err(err) = res {
                self.inner.diag.warn(format_args!(
                    "dispatch unit for {} aborted: {}",
                    type_name::<E>(),
                    err
                ));
            }
        }
        Ok(event)
    }

    /// Iterator discipline: a lazy, non-restartable sequence over every item
    /// yielded by the handlers, in priority order.
    ///
    /// # Errors
    /// [`DispatchError::MissingCapability`] if the event is not iterable.
    pub fn publish_iterable<E: Event, T: Send + 'static>(
        &self,
        event: E,
    ) -> Result<EventSequence<E, T>, DispatchError> {
        if event.as_iterable().is_none() {
            return Err(DispatchError::MissingCapability {
                event: type_name::<E>(),
                capability: "iterable",
            });
        }
        let node = self.node_for(EventType::of::<E>())?;
        Ok(EventSequence::new(self.clone(), node, event))
    }

    /// Offers `error` to the exception chain until a link claims it.
    pub(crate) fn raise(&self, handler: &Handler, event: &dyn Event, error: HandlerError) {
        for link in self.inner.exceptions.iter() {
            let claimed = if self.inner.cfg.catch_panics {
                panic::catch_unwind(AssertUnwindSafe(|| link.catch(self, handler, event, &error)))
                    .unwrap_or_else(|payload| {
                        self.inner.diag.warn(format_args!(
                            "exception handler panicked: {}",
                            panic_message(payload.as_ref())
                        ));
                        false
                    })
            } else {
                link.catch(self, handler, event, &error)
            };
            if claimed {
                return;
            }
        }
        self.inner.diag.warn(format_args!(
            "unclaimed error from {}::{} on {}: {}",
            handler.owner_name(),
            handler.method(),
            event.event_type(),
            error
        ));
    }

    // ---- introspection ----

    /// Whether `owner` is currently registered.
    pub fn is_registered(&self, owner: impl Into<Owner>) -> bool {
        self.inner.registry.read().contains(owner.into().key())
    }

    /// Number of registered owners.
    pub fn owner_count(&self) -> usize {
        self.inner.registry.read().owner_count()
    }

    /// Snapshot of the handlers an event of type `ty` would reach, in priority order.
    ///
    /// Derives the node if it does not exist yet.
    pub fn handlers_for(&self, ty: EventType) -> Result<Vec<HandlerRef>, DispatchError> {
        Ok(self.node_for(ty)?.handlers().to_vec())
    }

    /// Event types with a materialized dispatch node (the root included).
    pub fn known_types(&self) -> Vec<EventType> {
        self.inner.registry.read().known_types()
    }
}

fn filter_panicked(subject: &str, info: String) -> RegistrationError {
    RegistrationError::FilterPanicked {
        subject: subject.to_string(),
        info,
    }
}

impl Default for Bus {
    fn default() -> Self {
        Bus::new(Config::default())
    }
}

impl fmt::Debug for Bus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bus")
            .field("config", &self.inner.cfg)
            .field("owners", &self.owner_count())
            .field("awaitables", &self.inner.awaitables)
            .field("diagnostics", &self.inner.diag)
            .finish()
    }
}
