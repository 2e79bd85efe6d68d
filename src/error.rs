//! Error types used by the bus and by handlers.
//!
//! This module defines three error enums:
//!
//! - [`DispatchError`] — misuse of the publish API or a broken event hierarchy.
//!   Returned to the caller of `publish*`.
//! - [`HandlerError`] — failures raised by (or while awaiting / pulling from) a
//!   handler. Never returned to the publisher; routed through the exception chain.
//! - [`RegistrationError`] — structural failures while scanning an owner. Only the
//!   offending method is dropped; the registration continues.
//!
//! All types provide helper methods (`as_label`, `as_message`) for logging.

use thiserror::Error;

/// # Errors returned to the publisher.
///
/// These signal a programming mistake at the call site and are never routed
/// through the exception chain.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The event declares a capability that selects another publish method.
    #[error("event `{event}` declares the {capability} capability; publish it with `{expected}`")]
    WrongDiscipline {
        /// Concrete event type name.
        event: &'static str,
        /// Capability that was found on the event.
        capability: &'static str,
        /// Publish method that accepts this event.
        expected: &'static str,
    },

    /// The event lacks the capability the publish method requires.
    #[error("event `{event}` does not declare the {capability} capability")]
    MissingCapability {
        /// Concrete event type name.
        event: &'static str,
        /// Capability required by the publish method.
        capability: &'static str,
    },

    /// The ancestor chain of an event type loops back onto itself.
    #[error("event type `{event}` has a cyclic ancestor chain")]
    BrokenHierarchy {
        /// Event type whose chain could not be resolved.
        event: &'static str,
    },
}

impl DispatchError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use typebus::DispatchError;
    ///
    /// let err = DispatchError::MissingCapability { event: "Ping", capability: "async" };
    /// assert_eq!(err.as_label(), "dispatch_missing_capability");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            DispatchError::WrongDiscipline { .. } => "dispatch_wrong_discipline",
            DispatchError::MissingCapability { .. } => "dispatch_missing_capability",
            DispatchError::BrokenHierarchy { .. } => "dispatch_broken_hierarchy",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            DispatchError::WrongDiscipline {
                event, expected, ..
            } => format!("wrong publish method for {event}; use {expected}"),
            DispatchError::MissingCapability { event, capability } => {
                format!("{event} is not {capability}")
            }
            DispatchError::BrokenHierarchy { event } => format!("cyclic hierarchy at {event}"),
        }
    }
}

/// # Errors produced by handler invocations.
///
/// Any of these stops the current handler (or its sequence), is handed to the
/// exception chain, and dispatch moves on to the next handler.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// Handler returned an error.
    #[error("handler failed: {error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },

    /// Handler panicked; the panic was caught at the invocation boundary.
    #[error("handler panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },

    /// The awaited completion was cancelled before it finished.
    #[error("handler completion cancelled")]
    Cancelled,

    /// The handler could not view the published event as its declared type.
    #[error("event cannot be viewed as `{expected}`")]
    EventMismatch {
        /// Type name the handler declared.
        expected: &'static str,
    },
}

impl HandlerError {
    /// Builds a [`HandlerError::Failed`] from any displayable error.
    ///
    /// # Example
    /// ```
    /// use typebus::HandlerError;
    ///
    /// let err = HandlerError::fail("boom");
    /// assert_eq!(err.to_string(), "handler failed: boom");
    /// ```
    pub fn fail(error: impl std::fmt::Display) -> Self {
        HandlerError::Failed {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            HandlerError::Failed { .. } => "handler_failed",
            HandlerError::Panicked { .. } => "handler_panicked",
            HandlerError::Cancelled => "handler_cancelled",
            HandlerError::EventMismatch { .. } => "handler_event_mismatch",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            HandlerError::Failed { error } => format!("error: {error}"),
            HandlerError::Panicked { info } => format!("panic: {info}"),
            HandlerError::Cancelled => "completion cancelled".to_string(),
            HandlerError::EventMismatch { expected } => format!("not a {expected}"),
        }
    }
}

/// # Errors raised while turning an owner into handlers.
///
/// Each error excludes a single candidate method; the rest of the owner is
/// still registered.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// The owner's scan reported a broken candidate.
    #[error("scan of `{owner}` failed: {reason}")]
    Scan {
        /// Owner type name.
        owner: &'static str,
        /// What went wrong.
        reason: String,
    },

    /// An invocation factory refused to build the method.
    #[error("factory failed for `{method}`: {reason}")]
    Factory {
        /// Method name.
        method: String,
        /// What went wrong.
        reason: String,
    },

    /// A filter panicked while evaluating a candidate.
    #[error("filter panicked while evaluating `{subject}`: {info}")]
    FilterPanicked {
        /// Owner or method being evaluated.
        subject: String,
        /// Panic payload rendered as text.
        info: String,
    },

    /// An invocation factory panicked while building the method.
    #[error("factory panicked while building `{method}`: {info}")]
    FactoryPanicked {
        /// Method name.
        method: String,
        /// Panic payload rendered as text.
        info: String,
    },
}

impl RegistrationError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            RegistrationError::Scan { .. } => "registration_scan",
            RegistrationError::Factory { .. } => "registration_factory",
            RegistrationError::FilterPanicked { .. } => "registration_filter_panicked",
            RegistrationError::FactoryPanicked { .. } => "registration_factory_panicked",
        }
    }
}

/// Renders a caught panic payload as text.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
