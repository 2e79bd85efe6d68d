//! # typebus
//!
//! **Typebus** is a typed in-process event bus for Rust.
//!
//! Handlers subscribe to event *types*; publishing a value reaches every handler
//! registered for its type or any of its declared ancestors, in priority order.
//! Three dispatch disciplines share one registry: synchronous, asynchronous with
//! concurrency groups, and lazy iteration over handler-produced sequences.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │ Subscribe    │   │ Subscribe    │   │StaticSubscribe│
//!     │ (instance)   │   │ (instance)   │   │   (type)      │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬────────┘
//!            ▼  register()      ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Bus (registration manager)                                       │
//! │  - registrant / invocation filters                                │
//! │  - invocation factories            ──► Handler descriptors        │
//! │  - Registry: type → DispatchNode, type → known subtypes           │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!    publish()        publish_async()    publish_iterable()
//!   (caller thread)  (JoinSet of units)  (lazy EventSequence)
//!        │                  │                  │
//!        └────── HandlerError ──► exception chain (LogExceptions last)
//! ```
//!
//! ### Dispatch tree
//! ```text
//! Event (root) ──► Input ──► KeyPressed        nodes are derived lazily on the
//!              └─► Tick                         first publish/registration and
//!                                               copy their parent's handlers
//! ```
//!
//! ## Features
//! | Area              | Description                                              | Key types / traits                              |
//! |-------------------|----------------------------------------------------------|-------------------------------------------------|
//! | **Events**        | Typed values with declared parents and capabilities.     | [`Event`], [`EventType`], [`CancelFlag`]        |
//! | **Handlers**      | Owners describe their callables through a scan.          | [`Subscribe`], [`StaticSubscribe`], [`Method`]  |
//! | **Dispatch**      | Sync, async (groups, cancellation) and iterator.         | [`Bus`], [`EventSequence`]                      |
//! | **Extensions**    | Filters, factories, exception handlers, converters.      | [`InvocationFilter`], [`ExceptionHandler`], ... |
//! | **Errors**        | Typed errors for usage, handlers and registration.       | [`DispatchError`], [`HandlerError`]             |
//! | **Configuration** | Central bus settings.                                    | [`Config`], [`BusBuilder`]                      |
//!
//! ## Optional features
//! - `logging` (default): [`TracingLogger`] forwards diagnostics to `tracing`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use tokio_util::sync::CancellationToken;
//! use typebus::{AsyncEvent, Bus, Config, Event, Method, Scan, Subscribe};
//!
//! struct Reload { token: CancellationToken }
//! impl AsyncEvent for Reload {
//!     fn cancellation(&self) -> &CancellationToken { &self.token }
//! }
//! impl Event for Reload {
//!     fn as_async(&self) -> Option<&dyn AsyncEvent> { Some(self) }
//! }
//!
//! #[derive(Default)]
//! struct Cache { reloads: AtomicU32 }
//!
//! impl Subscribe for Cache {
//!     fn handlers(self: Arc<Self>, scan: &mut Scan) {
//!         scan.push(Method::future("reload", move |_: &Reload| {
//!             let me = Arc::clone(&self);
//!             async move {
//!                 me.reloads.fetch_add(1, Ordering::Relaxed);
//!                 Ok(())
//!             }
//!         }).group("cache"));
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bus = Bus::new(Config::default());
//!     let cache = Arc::new(Cache::default());
//!     bus.register(&cache);
//!
//!     bus.publish_async(Reload { token: CancellationToken::new() }).await?;
//!     assert_eq!(cache.reloads.load(Ordering::Relaxed), 1);
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod extensions;
mod handlers;
mod log;

// ---- Public re-exports ----

pub use core::{Bus, BusBuilder, Config, EventSequence};
pub use error::{DispatchError, HandlerError, RegistrationError};
pub use events::{
    AsyncEvent, CancelFlag, Cancellable, Event, EventMeta, EventType, IterableEvent, Parent,
};
pub use extensions::{
    Awaitable, AwaitableConverter, Awaitables, DirectInvocation, ExceptionHandler,
    ExcludeDeclaredBy, ExcludeMarked, ExcludeMethods, ExcludeTagged, InvocationFactory,
    InvocationFilter, LogExceptions, RegistrantFilter, TypedConverter,
};
pub use handlers::{
    Exclusion, Handler, HandlerKey, HandlerRef, HandlerResult, Invoke, InvokeRef, Method, Owner,
    OwnerKey, OwnerKind, Param, ReturnShape, Returned, Scan, Sequence, StaticSubscribe,
    Subscribe,
};
pub use log::Logger;

// Optional: forward diagnostics to `tracing`.
// Enabled by default via the `logging` feature.
#[cfg(feature = "logging")]
pub use log::TracingLogger;
