//! # Awaitable conversion registry.
//!
//! Handlers may return any value. In the asynchronous discipline the bus asks
//! [`Awaitables`] whether that value can be waited on: the first
//! [`AwaitableConverter`] whose [`can_convert`](AwaitableConverter::can_convert)
//! accepts the value's concrete type turns it into an [`Awaitable`]. The decision
//! is cached per `TypeId`. Values nobody converts are treated as already complete.
//!
//! ## Default converters
//! - [`Awaitable`] itself (boxed fallible future);
//! - `BoxFuture<'static, ()>`;
//! - `tokio::task::JoinHandle<()>` and `JoinHandle<Result<(), HandlerError>>`.
//!
//! ## Example
//! ```rust
//! use typebus::{Awaitable, Bus, Config, HandlerError, TypedConverter};
//!
//! // Completes once the sender side fires.
//! struct Done(tokio::sync::oneshot::Receiver<()>);
//!
//! let bus = Bus::builder(Config::default())
//!     .with_awaitable_converter(TypedConverter::new(|done: Done| -> Awaitable {
//!         Box::pin(async move { done.0.await.map_err(|_| HandlerError::Cancelled) })
//!     }))
//!     .build();
//! # let _ = bus;
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use parking_lot::RwLock;
use tokio::task::{JoinError, JoinHandle};

use crate::error::{panic_message, HandlerError};

use super::chain::Chain;

/// Uniform completion the asynchronous discipline waits on.
pub type Awaitable = BoxFuture<'static, Result<(), HandlerError>>;

/// Turns a returned value into an [`Awaitable`].
pub trait AwaitableConverter: Send + Sync + 'static {
    /// Whether values of concrete type `ty` are handled.
    fn can_convert(&self, ty: TypeId) -> bool;

    /// Converts the value; `None` means "nothing to wait for".
    fn convert(&self, value: Box<dyn Any + Send>) -> Option<Awaitable>;
}

/// Converter for exactly one concrete type `T`.
pub struct TypedConverter<T, F> {
    f: F,
    _marker: PhantomData<fn(T)>,
}

impl<T, F> TypedConverter<T, F>
where
    T: Any + Send,
    F: Fn(T) -> Awaitable + Send + Sync + 'static,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: PhantomData,
        }
    }
}

impl<T, F> AwaitableConverter for TypedConverter<T, F>
where
    T: Any + Send,
    F: Fn(T) -> Awaitable + Send + Sync + 'static,
{
    fn can_convert(&self, ty: TypeId) -> bool {
        ty == TypeId::of::<T>()
    }

    fn convert(&self, value: Box<dyn Any + Send>) -> Option<Awaitable> {
        value.downcast::<T>().ok().map(|v| (self.f)(*v))
    }
}

fn join_error(err: JoinError) -> HandlerError {
    if err.is_panic() {
        HandlerError::Panicked {
            info: panic_message(err.into_panic().as_ref()),
        }
    } else {
        HandlerError::Cancelled
    }
}

/// Converters installed when [`Config::default_converters`](crate::Config) is set.
pub(crate) fn default_converters() -> Vec<Arc<dyn AwaitableConverter>> {
    vec![
        Arc::new(TypedConverter::new(|fut: Awaitable| fut)),
        Arc::new(TypedConverter::new(|fut: BoxFuture<'static, ()>| -> Awaitable {
            Box::pin(fut.map(Ok))
        })),
        Arc::new(TypedConverter::new(|handle: JoinHandle<()>| -> Awaitable {
            Box::pin(handle.map(|res| res.map_err(join_error)))
        })),
        Arc::new(TypedConverter::new(
            |handle: JoinHandle<Result<(), HandlerError>>| -> Awaitable {
                Box::pin(handle.map(|res| res.map_err(join_error).and_then(|r| r)))
            },
        )),
    ]
}

/// Ordered converters plus the per-type lookup cache.
pub struct Awaitables {
    converters: Chain<dyn AwaitableConverter>,
    cache: RwLock<HashMap<TypeId, Option<usize>>>,
}

impl Awaitables {
    pub(crate) fn new(converters: Chain<dyn AwaitableConverter>) -> Self {
        Self {
            converters,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Converts a returned value, or `None` when nothing needs awaiting.
    pub fn resolve(&self, value: Box<dyn Any + Send>) -> Option<Awaitable> {
        let ty = (*value).type_id();
        let index = self.lookup(ty)?;
        self.converters.get(index)?.convert(value)
    }

    /// Whether some converter accepts values of type `ty`.
    pub fn can_await(&self, ty: TypeId) -> bool {
        self.lookup(ty).is_some()
    }

    /// Number of concrete types whose converter has been looked up.
    pub fn cached_types(&self) -> usize {
        self.cache.read().len()
    }

    pub fn len(&self) -> usize {
        self.converters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.len() == 0
    }

    fn lookup(&self, ty: TypeId) -> Option<usize> {
        if let Some(hit) = self.cache.read().get(&ty) {
            return *hit;
        }
        let found = self.converters.iter().position(|c| c.can_convert(ty));
        self.cache.write().insert(ty, found);
        found
    }
}

impl fmt::Debug for Awaitables {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Awaitables")
            .field("converters", &self.converters.len())
            .field("cached_types", &self.cached_types())
            .finish()
    }
}
