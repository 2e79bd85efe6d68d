//! # DispatchUnit: one concurrent slice of an async publish.
//!
//! `publish_async` splits a node into units and spawns each into a `JoinSet`:
//! - every handler of the default group is its own unit (unless the event asks
//!   to synchronize the default group);
//! - every named group is one unit running its handlers in priority order.
//!
//! ## Architecture
//! ```text
//! DispatchUnit::run()
//!   ├─► acquire semaphore (cancellable)
//!   └─► for handler in handlers {
//!         ├─► token cancelled / event cancelled? → stop
//!         ├─► runner::complete()  (invoke + await returned awaitable)
//!         └─► Err → bus exception chain, continue
//!       }
//! ```
//!
//! ## Rules
//! - handlers inside one unit never overlap;
//! - one failing handler never stops its unit or sibling units;
//! - the permit is held for the whole unit.

use std::sync::Arc;

use tokio::select;
use tokio_util::sync::CancellationToken;

use crate::events::{should_stop, Event};
use crate::handlers::HandlerRef;

use super::bus::Bus;
use super::runner;

/// Sequential run of handlers sharing one concurrency slot.
pub(crate) struct DispatchUnit {
    bus: Bus,
    event: Arc<dyn Event>,
    handlers: Vec<HandlerRef>,
    token: CancellationToken,
}

impl DispatchUnit {
    pub(crate) fn new(
        bus: Bus,
        event: Arc<dyn Event>,
        handlers: Vec<HandlerRef>,
        token: CancellationToken,
    ) -> Self {
        Self {
            bus,
            event,
            handlers,
            token,
        }
    }

    /// Runs the unit until its handlers are exhausted or the event is cancelled.
    pub(crate) async fn run(self) {
        if self.token.is_cancelled() {
            return;
        }
        let _guard = match self.bus.semaphore() {
            Some(sem) => {
                let permit_future = sem.acquire();
                tokio::pin!(permit_future);

                select! {
                    res = &mut permit_future => {
                        match res {
                            Ok(permit) => Some(permit),
                            Err(_closed) => return,
                        }
                    }
                    _ = self.token.cancelled() => return,
                }
            }
            None => None,
        };

        let event: &dyn Event = &*self.event;
        let catch_panics = self.bus.config().catch_panics;
        for handler in &self.handlers {
            if should_stop(event, Some(&self.token)) {
                break;
            }
            let res = runner::complete(handler, event, self.bus.awaitables(), catch_panics).await;
            if let Err(err) = res {
                self.bus.raise(handler, event, err);
            }
        }
    }
}
