//! # Handler owners and the registration scan.
//!
//! An owner is either an object instance implementing [`Subscribe`] (instance
//! handlers) or a type implementing [`StaticSubscribe`] (static handlers). During
//! `register` the bus asks the owner to fill a [`Scan`] with candidate
//! [`Method`]s; how the owner discovers them (hand-written tables, generated
//! code, ...) is up to the owner.
//!
//! ## Identity
//! - instance owners are identified by their `Arc` allocation;
//! - static owners are identified by their `TypeId`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use typebus::{Event, Method, Scan, Subscribe};
//!
//! struct Ping;
//! impl Event for Ping {}
//!
//! #[derive(Default)]
//! struct Counter { seen: AtomicUsize }
//!
//! impl Subscribe for Counter {
//!     fn handlers(self: Arc<Self>, scan: &mut Scan) {
//!         scan.push(Method::sync("on_ping", move |_: &Ping| {
//!             self.seen.fetch_add(1, Ordering::Relaxed);
//!             Ok(())
//!         }));
//!     }
//! }
//! ```

use std::any::{type_name, TypeId};
use std::fmt;
use std::sync::Arc;

use crate::error::RegistrationError;

use super::method::Method;

/// Object owning instance handlers.
pub trait Subscribe: Send + Sync + 'static {
    /// Pushes this instance's handler candidates.
    fn handlers(self: Arc<Self>, scan: &mut Scan);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        type_name::<Self>()
    }

    /// Exclusion marker consulted by [`ExcludeMarked`](crate::ExcludeMarked).
    fn exclusion(&self) -> Exclusion {
        Exclusion::NONE
    }
}

/// Type owning static handlers.
pub trait StaticSubscribe: 'static {
    /// Pushes the type's handler candidates.
    fn static_handlers(scan: &mut Scan);

    /// Exclusion marker consulted by [`ExcludeMarked`](crate::ExcludeMarked).
    fn exclusion() -> Exclusion {
        Exclusion::NONE
    }
}

/// Marker asking the default registrant filter to skip an owner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Exclusion {
    /// Reject the owner when registered as an instance.
    pub instance: bool,
    /// Reject the owner when registered as a type.
    pub statics: bool,
}

impl Exclusion {
    pub const NONE: Exclusion = Exclusion {
        instance: false,
        statics: false,
    };
    pub const INSTANCE: Exclusion = Exclusion {
        instance: true,
        statics: false,
    };
    pub const STATIC: Exclusion = Exclusion {
        instance: false,
        statics: true,
    };
    pub const ALL: Exclusion = Exclusion {
        instance: true,
        statics: true,
    };

    /// Whether an owner of `kind` is excluded.
    pub fn excludes(&self, kind: OwnerKind) -> bool {
        match kind {
            OwnerKind::Instance => self.instance,
            OwnerKind::Static => self.statics,
        }
    }
}

/// Registration identity of an owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OwnerKey {
    /// Address of the `Arc` allocation.
    Instance(usize),
    /// Type of a static owner.
    Type(TypeId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OwnerKind {
    Instance,
    Static,
}

#[derive(Clone)]
enum Source {
    Instance(Arc<dyn Subscribe>),
    Static(fn(&mut Scan)),
}

/// Registration handle passed to [`Bus::register`](crate::Bus::register).
///
/// Instance owners keep their `Arc` alive while registered, so the identity
/// cannot be reused by another allocation.
#[derive(Clone)]
pub struct Owner {
    key: OwnerKey,
    kind: OwnerKind,
    name: &'static str,
    type_id: TypeId,
    exclusion: Exclusion,
    source: Source,
}

impl Owner {
    /// Owner for an object's instance handlers.
    pub fn instance<S: Subscribe>(subscriber: Arc<S>) -> Self {
        let key = OwnerKey::Instance(Arc::as_ptr(&subscriber) as *const () as usize);
        Self {
            key,
            kind: OwnerKind::Instance,
            name: subscriber.name(),
            type_id: TypeId::of::<S>(),
            exclusion: subscriber.exclusion(),
            source: Source::Instance(subscriber),
        }
    }

    /// Owner for `T`'s static handlers.
    pub fn of_type<T: StaticSubscribe>() -> Self {
        Self {
            key: OwnerKey::Type(TypeId::of::<T>()),
            kind: OwnerKind::Static,
            name: type_name::<T>(),
            type_id: TypeId::of::<T>(),
            exclusion: T::exclusion(),
            source: Source::Static(T::static_handlers),
        }
    }

    #[inline]
    pub fn key(&self) -> OwnerKey {
        self.key
    }

    #[inline]
    pub fn kind(&self) -> OwnerKind {
        self.kind
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Concrete type of the instance, or the static owner type.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    #[inline]
    pub fn exclusion(&self) -> Exclusion {
        self.exclusion
    }

    pub(crate) fn scan_into(&self, scan: &mut Scan) {
        match &self.source {
            Source::Instance(subscriber) => Arc::clone(subscriber).handlers(scan),
            Source::Static(scan_fn) => scan_fn(scan),
        }
    }
}

impl<S: Subscribe> From<Arc<S>> for Owner {
    fn from(subscriber: Arc<S>) -> Self {
        Owner::instance(subscriber)
    }
}

impl<S: Subscribe> From<&Arc<S>> for Owner {
    fn from(subscriber: &Arc<S>) -> Self {
        Owner::instance(Arc::clone(subscriber))
    }
}

impl From<&Owner> for Owner {
    fn from(owner: &Owner) -> Self {
        owner.clone()
    }
}

impl fmt::Debug for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Owner")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("key", &self.key)
            .finish()
    }
}

/// Collector for an owner's handler candidates.
pub struct Scan {
    owner: &'static str,
    candidates: Vec<Result<Method, RegistrationError>>,
}

impl Scan {
    pub(crate) fn new(owner: &'static str) -> Self {
        Self {
            owner,
            candidates: Vec::new(),
        }
    }

    /// Adds a candidate. Its declaring type defaults to the owner name.
    pub fn push(&mut self, mut method: Method) -> &mut Self {
        method.default_declaring_type(self.owner);
        self.candidates.push(Ok(method));
        self
    }

    /// Records a candidate that could not be described; it is skipped and logged.
    pub fn fail(&mut self, reason: impl Into<String>) -> &mut Self {
        self.candidates.push(Err(RegistrationError::Scan {
            owner: self.owner,
            reason: reason.into(),
        }));
        self
    }

    /// Name of the owner being scanned.
    pub fn owner(&self) -> &'static str {
        self.owner
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub(crate) fn into_candidates(self) -> Vec<Result<Method, RegistrationError>> {
        self.candidates
    }
}
