//! # Registration filters.
//!
//! - [`RegistrantFilter`] runs once per `register` call and can reject a whole owner.
//! - [`InvocationFilter`] runs once per scanned candidate and can reject one method.
//!
//! Both chains short-circuit on the first filter that rejects. Closures implement
//! both traits.
//!
//! ## Example
//! ```rust
//! use typebus::{Bus, Config, ExcludeTagged, Method, Owner};
//!
//! let bus = Bus::builder(Config::default())
//!     .with_invocation_filter(ExcludeTagged::new("debug-only"))
//!     .with_registrant_filter(|owner: &Owner| owner.name().ends_with("Legacy"))
//!     .build();
//! # let _ = bus;
//! ```

use std::borrow::Cow;

use crate::handlers::{Method, Owner};

/// Rejects whole owners before they are scanned.
pub trait RegistrantFilter: Send + Sync + 'static {
    /// `true` rejects the owner.
    fn rejects(&self, owner: &Owner) -> bool;
}

impl<F> RegistrantFilter for F
where
    F: Fn(&Owner) -> bool + Send + Sync + 'static,
{
    fn rejects(&self, owner: &Owner) -> bool {
        self(owner)
    }
}

/// Rejects single candidate methods during the scan.
pub trait InvocationFilter: Send + Sync + 'static {
    /// `true` rejects the method.
    fn rejects(&self, owner: &Owner, method: &Method) -> bool;
}

impl<F> InvocationFilter for F
where
    F: Fn(&Owner, &Method) -> bool + Send + Sync + 'static,
{
    fn rejects(&self, owner: &Owner, method: &Method) -> bool {
        self(owner, method)
    }
}

/// Default registrant filter: honors the owner's [`Exclusion`](crate::Exclusion) marker.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExcludeMarked;

impl RegistrantFilter for ExcludeMarked {
    fn rejects(&self, owner: &Owner) -> bool {
        owner.exclusion().excludes(owner.kind())
    }
}

/// Rejects methods by name.
#[derive(Debug, Clone)]
pub struct ExcludeMethods {
    names: Vec<Cow<'static, str>>,
}

impl ExcludeMethods {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Cow<'static, str>>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl InvocationFilter for ExcludeMethods {
    fn rejects(&self, _owner: &Owner, method: &Method) -> bool {
        self.names.iter().any(|n| n.as_ref() == method.name())
    }
}

/// Rejects methods carrying a metadata tag.
#[derive(Debug, Clone, Copy)]
pub struct ExcludeTagged {
    tag: &'static str,
}

impl ExcludeTagged {
    pub fn new(tag: &'static str) -> Self {
        Self { tag }
    }
}

impl InvocationFilter for ExcludeTagged {
    fn rejects(&self, _owner: &Owner, method: &Method) -> bool {
        method.has_tag(self.tag)
    }
}

/// Rejects methods declared by a given type.
#[derive(Debug, Clone, Copy)]
pub struct ExcludeDeclaredBy {
    declaring_type: &'static str,
}

impl ExcludeDeclaredBy {
    pub fn new(declaring_type: &'static str) -> Self {
        Self { declaring_type }
    }
}

impl InvocationFilter for ExcludeDeclaredBy {
    fn rejects(&self, _owner: &Owner, method: &Method) -> bool {
        method.declaring_type() == self.declaring_type
    }
}
