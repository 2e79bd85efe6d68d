//! # Invocation factories.
//!
//! A factory decides how an accepted [`Method`] becomes the callable stored in its
//! [`Handler`](crate::Handler). The first factory returning `Some` wins; the default
//! [`DirectInvocation`] uses the scanned call unchanged.
//!
//! Factories can pick a different implementation per [`ReturnShape`](crate::ReturnShape),
//! wrap calls (timing, tracing spans), or refuse a method with an error, which
//! excludes only that method.

use std::sync::Arc;

use crate::error::RegistrationError;
use crate::handlers::{InvokeRef, Method, Owner};

/// Builds the stored callable for an accepted method.
pub trait InvocationFactory: Send + Sync + 'static {
    /// `Ok(None)` passes the method on to the next factory.
    fn create(&self, owner: &Owner, method: &Method)
        -> Result<Option<InvokeRef>, RegistrationError>;
}

impl<F> InvocationFactory for F
where
    F: Fn(&Owner, &Method) -> Result<Option<InvokeRef>, RegistrationError>
        + Send
        + Sync
        + 'static,
{
    fn create(
        &self,
        owner: &Owner,
        method: &Method,
    ) -> Result<Option<InvokeRef>, RegistrationError> {
        self(owner, method)
    }
}

/// Default factory: stores the scanned call as is.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectInvocation;

impl InvocationFactory for DirectInvocation {
    fn create(
        &self,
        _owner: &Owner,
        method: &Method,
    ) -> Result<Option<InvokeRef>, RegistrationError> {
        Ok(Some(Arc::clone(method.call())))
    }
}
