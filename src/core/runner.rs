//! # Run a single handler invocation.
//!
//! Every discipline calls handlers through this module so the panic boundary is
//! the same everywhere.
//!
//! ## Flow
//! ```text
//! sync / iterable:  invoke() ──► Ok(returned) | Err(HandlerError)
//!
//! async:            invoke() ──► returned ──► Awaitables::resolve()
//!                                               ├─ None      → Ok(())   (already complete)
//!                                               └─ Some(fut) → await (panics caught)
//! ```
//!
//! ## Rules
//! - a panic becomes [`HandlerError::Panicked`] when `catch_panics` is set;
//! - nothing here touches the exception chain; callers route the error.

use std::panic::{self, AssertUnwindSafe};

use futures::FutureExt;

use crate::error::{panic_message, HandlerError};
use crate::events::Event;
use crate::extensions::{Awaitable, Awaitables};
use crate::handlers::{Handler, HandlerResult};

/// Calls `handler` once, synchronously.
pub(crate) fn invoke(handler: &Handler, event: &dyn Event, catch_panics: bool) -> HandlerResult {
    if !catch_panics {
        return handler.invoke(event);
    }
    match panic::catch_unwind(AssertUnwindSafe(|| handler.invoke(event))) {
        Ok(res) => res,
        Err(payload) => Err(HandlerError::Panicked {
            info: panic_message(payload.as_ref()),
        }),
    }
}

/// Calls `handler` and waits for whatever awaitable it returned.
pub(crate) async fn complete(
    handler: &Handler,
    event: &dyn Event,
    awaitables: &Awaitables,
    catch_panics: bool,
) -> Result<(), HandlerError> {
    let Some(value) = invoke(handler, event, catch_panics)? else {
        return Ok(());
    };
    match awaitables.resolve(value) {
        Some(fut) => wait(fut, catch_panics).await,
        None => Ok(()),
    }
}

async fn wait(fut: Awaitable, catch_panics: bool) -> Result<(), HandlerError> {
    if !catch_panics {
        return fut.await;
    }
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(res) => res,
        Err(payload) => Err(HandlerError::Panicked {
            info: panic_message(payload.as_ref()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::any::TypeId;
    use std::sync::Arc;

    use crate::events::EventType;
    use crate::extensions::{default_converters, Chain};
    use crate::handlers::{HandlerKey, Method, OwnerKey};

    struct Ping;
    impl Event for Ping {}

    fn handler(method: Method) -> Handler {
        let key = HandlerKey::new(OwnerKey::Type(TypeId::of::<Ping>()), 0);
        Handler::from_method(
            key,
            "Owner",
            &method,
            EventType::of::<Ping>(),
            Arc::clone(method.call()),
        )
    }

    fn awaitables() -> Awaitables {
        let mut chain = Chain::new();
        for c in default_converters() {
            chain.push_default(c);
        }
        Awaitables::new(chain)
    }

    #[test]
    fn panics_become_handler_errors() {
        let h = handler(Method::sync("boom", |_: &Ping| panic!("kaboom")));
        let err = invoke(&h, &Ping, true).unwrap_err();
        assert_eq!(
            err,
            HandlerError::Panicked {
                info: "kaboom".into()
            }
        );
    }

    #[tokio::test]
    async fn returned_futures_are_awaited() {
        let h = handler(Method::future("later", |_: &Ping| async {
            tokio::task::yield_now().await;
            Err(HandlerError::fail("late"))
        }));
        let res = complete(&h, &Ping, &awaitables(), true).await;
        assert_eq!(res, Err(HandlerError::fail("late")));
    }

    #[tokio::test]
    async fn panics_inside_futures_are_caught() {
        let h = handler(Method::future("later", |_: &Ping| async {
            let armed = true;
            if armed {
                panic!("deep");
            }
            Ok(())
        }));
        let res = complete(&h, &Ping, &awaitables(), true).await;
        assert!(matches!(res, Err(HandlerError::Panicked { .. })));
    }

    #[tokio::test]
    async fn plain_values_complete_immediately() {
        let h = handler(Method::returning("value", |_: &Ping| Ok(5u64)));
        assert_eq!(complete(&h, &Ping, &awaitables(), true).await, Ok(()));
    }
}
