//! # Dispatch node: handlers of one event type.
//!
//! A [`DispatchNode`] holds the canonical priority-ordered handler list of one
//! event type plus a per-group index derived from it.
//!
//! ```text
//! ordered:  [A:100 ""] [C:80 "io"] [B:50 ""] [D:10 "io"]
//!                 │          │          │          │
//! groups:   ""   → [A, B]    │          │          │
//!           "io" → [C, D] ◄──┴──────────┴──────────┘
//! ```
//!
//! ## Rules
//! - `ordered` is descending by priority, FIFO among equal priorities;
//! - every group list is the `ordered` list filtered by group, so both views
//!   change together on every insert and remove;
//! - nodes are shared as `Arc`; mutation goes through `Arc::make_mut`, so a node
//!   still referenced by an in-flight dispatch is copied first.

use std::sync::Arc;

use crate::events::EventType;
use crate::handlers::{HandlerKey, HandlerRef};

/// Handlers of one concurrency group, in priority order.
#[derive(Clone, Debug)]
pub(crate) struct Group {
    name: Arc<str>,
    handlers: Vec<HandlerRef>,
}

impl Group {
    /// `true` for the implicit empty-tag group.
    pub(crate) fn is_default(&self) -> bool {
        self.name.is_empty()
    }

    pub(crate) fn handlers(&self) -> &[HandlerRef] {
        &self.handlers
    }
}

#[derive(Clone, Debug)]
pub(crate) struct DispatchNode {
    event_type: EventType,
    ordered: Vec<HandlerRef>,
    groups: Vec<Group>,
}

impl DispatchNode {
    pub(crate) fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            ordered: Vec::new(),
            groups: Vec::new(),
        }
    }

    /// Structural copy of this node's lists for a subtype.
    pub(crate) fn derive_for(&self, event_type: EventType) -> Self {
        Self {
            event_type,
            ordered: self.ordered.clone(),
            groups: self.groups.clone(),
        }
    }

    pub(crate) fn event_type(&self) -> EventType {
        self.event_type
    }

    pub(crate) fn handlers(&self) -> &[HandlerRef] {
        &self.ordered
    }

    pub(crate) fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub(crate) fn len(&self) -> usize {
        self.ordered.len()
    }

    /// Inserts before the first handler with strictly lower priority.
    pub(crate) fn insert(&mut self, handler: HandlerRef) {
        let at = self
            .ordered
            .iter()
            .position(|h| h.priority() < handler.priority())
            .unwrap_or(self.ordered.len());
        self.ordered.insert(at, handler);
        self.reindex();
    }

    /// Removes every handler with `key`; returns how many were dropped.
    pub(crate) fn remove(&mut self, key: HandlerKey) -> usize {
        let before = self.ordered.len();
        self.ordered.retain(|h| h.key() != key);
        let removed = before - self.ordered.len();
        if removed > 0 {
            self.reindex();
        }
        removed
    }

    fn reindex(&mut self) {
        let mut groups: Vec<Group> = Vec::new();
        for handler in &self.ordered {
            match groups.iter_mut().find(|g| *g.name == *handler.group()) {
                Some(group) => group.handlers.push(Arc::clone(handler)),
                None => groups.push(Group {
                    name: handler.group_arc(),
                    handlers: vec![Arc::clone(handler)],
                }),
            }
        }
        self.groups = groups;
    }
}
