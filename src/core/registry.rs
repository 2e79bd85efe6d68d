//! # Type hierarchy registry.
//!
//! Owns the `type → node` map, the `type → known subtypes` links and the
//! `owner → handlers` records. Every method here runs under the bus write lock
//! except [`Registry::get`].
//!
//! ## Architecture
//! ```text
//! derive(KeyPressed)            nodes                      children
//!   KeyPressed? no              Event      [*]             Event → [Input]
//!   Input?      no ──► copy ──► Input      [*, i]          Input → [KeyPressed]
//!   Event?      yes             KeyPressed [*, i]
//!
//! insert(h @ Input)             Input      [*, i, h]   ──► KeyPressed [*, i, h]
//! ```
//!
//! ## Rules
//! - the root node exists from construction on;
//! - a derived node starts as a structural copy of its parent's node and is
//!   linked as that parent's child;
//! - insert/remove start at the handler's declared type and walk every known
//!   descendant;
//! - nodes are mutated through `Arc::make_mut` (copy-on-write when shared).

use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::error::DispatchError;
use crate::events::EventType;
use crate::handlers::{Handler, HandlerRef, Owner, OwnerKey};
use crate::log::Diagnostics;

use super::node::DispatchNode;

/// Handlers recorded for one registered owner.
struct Registration {
    /// Keeps instance owners alive while registered.
    #[allow(dead_code)]
    owner: Owner,
    handlers: Vec<HandlerRef>,
}

pub(crate) struct Registry {
    nodes: HashMap<TypeId, Arc<DispatchNode>>,
    children: HashMap<TypeId, Vec<TypeId>>,
    owners: HashMap<OwnerKey, Registration>,
    diag: Diagnostics,
}

impl Registry {
    pub(crate) fn new(diag: Diagnostics) -> Self {
        let root = EventType::root();
        let mut nodes = HashMap::new();
        nodes.insert(root.id(), Arc::new(DispatchNode::new(root)));
        Self {
            nodes,
            children: HashMap::new(),
            owners: HashMap::new(),
            diag,
        }
    }

    /// Fast path: the node if it already exists.
    pub(crate) fn get(&self, ty: TypeId) -> Option<Arc<DispatchNode>> {
        self.nodes.get(&ty).cloned()
    }

    /// Returns the node for `ty`, deriving it and any missing ancestors.
    pub(crate) fn derive(&mut self, ty: EventType) -> Result<Arc<DispatchNode>, DispatchError> {
        if let Some(node) = self.get(ty.id()) {
            return Ok(node);
        }

        // Walk up to the nearest materialized ancestor.
        let mut missing = vec![ty];
        let mut seen = HashSet::from([ty.id()]);
        let mut cursor = ty;
        let mut ancestor = loop {
            let parent = cursor
                .parent()
                .ok_or(DispatchError::BrokenHierarchy { event: ty.name() })?;
            if let Some(node) = self.get(parent.id()) {
                break node;
            }
            if !seen.insert(parent.id()) {
                return Err(DispatchError::BrokenHierarchy { event: ty.name() });
            }
            missing.push(parent);
            cursor = parent;
        };

        // Materialize top-down so each copy sees its parent's handlers.
        for ty in missing.into_iter().rev() {
            let node = Arc::new(ancestor.derive_for(ty));
            self.children
                .entry(ancestor.event_type().id())
                .or_default()
                .push(ty.id());
            self.nodes.insert(ty.id(), Arc::clone(&node));
            self.diag.debug(format_args!(
                "derived dispatch node {} from {} ({} handlers)",
                ty,
                ancestor.event_type(),
                node.len()
            ));
            ancestor = node;
        }
        Ok(ancestor)
    }

    /// Inserts `handler` into its declared type's node and every known descendant.
    pub(crate) fn insert(&mut self, handler: &HandlerRef) -> Result<(), DispatchError> {
        self.derive(handler.event_type())?;
        self.walk(handler.event_type().id(), |node| {
            node.insert(Arc::clone(handler));
        });
        Ok(())
    }

    /// Removes `handler` from its declared type's node and every known descendant.
    pub(crate) fn remove(&mut self, handler: &Handler) {
        let key = handler.key();
        self.walk(handler.event_type().id(), |node| {
            node.remove(key);
        });
    }

    fn walk(&mut self, start: TypeId, mut apply: impl FnMut(&mut DispatchNode)) {
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(&id) {
                apply(Arc::make_mut(node));
            }
            if let Some(kids) = self.children.get(&id) {
                stack.extend(kids.iter().copied());
            }
        }
    }

    pub(crate) fn contains(&self, owner: OwnerKey) -> bool {
        self.owners.contains_key(&owner)
    }

    pub(crate) fn record(&mut self, owner: Owner, handlers: Vec<HandlerRef>) {
        self.owners
            .insert(owner.key(), Registration { owner, handlers });
    }

    /// Forgets `owner`, returning the handlers it had inserted.
    pub(crate) fn forget(&mut self, owner: OwnerKey) -> Option<Vec<HandlerRef>> {
        self.owners.remove(&owner).map(|r| r.handlers)
    }

    pub(crate) fn owner_count(&self) -> usize {
        self.owners.len()
    }

    pub(crate) fn known_types(&self) -> Vec<EventType> {
        self.nodes.values().map(|n| n.event_type()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Event, Parent};
    use crate::handlers::{HandlerKey, Method};

    struct Input;
    impl Event for Input {}

    struct Key(Input);
    impl Event for Key {
        fn parent() -> Option<Parent<Self>> {
            Some(Parent::of(|k: &Self| &k.0))
        }
    }

    struct Chord(Key);
    impl Event for Chord {
        fn parent() -> Option<Parent<Self>> {
            Some(Parent::of(|c: &Self| &c.0))
        }
    }

    struct Tick;
    impl Event for Tick {}

    // Never instantiated; only their declared types are walked.
    struct Loop1(Box<Loop2>);
    impl Event for Loop1 {
        fn parent() -> Option<Parent<Self>> {
            Some(Parent::of(|l: &Self| &*l.0))
        }
    }

    struct Loop2(Box<Loop1>);
    impl Event for Loop2 {
        fn parent() -> Option<Parent<Self>> {
            Some(Parent::of(|l: &Self| &*l.0))
        }
    }

    fn handler(index: usize, ty: EventType) -> HandlerRef {
        let method = Method::any(format!("h{index}"), |_| Ok(()));
        let key = HandlerKey::new(OwnerKey::Type(TypeId::of::<Registry>()), index);
        Arc::new(Handler::from_method(key, "Owner", &method, ty, Arc::clone(method.call())))
    }

    fn names(reg: &Registry, ty: EventType) -> Vec<String> {
        reg.get(ty.id())
            .map(|n| n.handlers().iter().map(|h| h.method().to_string()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn derive_copies_nearest_ancestor_and_links_children() {
        let mut reg = Registry::new(Diagnostics::default());
        reg.insert(&handler(0, EventType::root())).unwrap();

        let chord = reg.derive(EventType::of::<Chord>()).unwrap();
        assert_eq!(chord.len(), 1);
        assert!(reg.get(EventType::of::<Key>().id()).is_some());
        assert!(reg.get(EventType::of::<Input>().id()).is_some());
        assert_eq!(reg.known_types().len(), 4);
    }

    #[test]
    fn insert_propagates_to_derived_descendants_only() {
        let mut reg = Registry::new(Diagnostics::default());
        reg.derive(EventType::of::<Chord>()).unwrap();
        reg.derive(EventType::of::<Tick>()).unwrap();

        reg.insert(&handler(1, EventType::of::<Input>())).unwrap();

        assert_eq!(names(&reg, EventType::of::<Input>()), vec!["h1"]);
        assert_eq!(names(&reg, EventType::of::<Key>()), vec!["h1"]);
        assert_eq!(names(&reg, EventType::of::<Chord>()), vec!["h1"]);
        assert!(names(&reg, EventType::of::<Tick>()).is_empty());
        assert!(names(&reg, EventType::root()).is_empty());
    }

    #[test]
    fn remove_walks_the_same_subtree() {
        let mut reg = Registry::new(Diagnostics::default());
        let h = handler(2, EventType::of::<Key>());
        reg.insert(&h).unwrap();
        reg.derive(EventType::of::<Chord>()).unwrap();
        assert_eq!(names(&reg, EventType::of::<Chord>()), vec!["h2"]);

        reg.remove(&h);
        assert!(names(&reg, EventType::of::<Key>()).is_empty());
        assert!(names(&reg, EventType::of::<Chord>()).is_empty());
    }

    #[test]
    fn shared_nodes_are_copied_before_mutation() {
        let mut reg = Registry::new(Diagnostics::default());
        reg.insert(&handler(0, EventType::of::<Tick>())).unwrap();

        let in_flight = reg.get(EventType::of::<Tick>().id()).unwrap();
        reg.insert(&handler(1, EventType::of::<Tick>())).unwrap();

        assert_eq!(in_flight.len(), 1);
        assert_eq!(names(&reg, EventType::of::<Tick>()), vec!["h0", "h1"]);
    }

    #[test]
    fn cyclic_ancestry_is_reported() {
        let mut reg = Registry::new(Diagnostics::default());
        let err = reg.derive(EventType::of::<Loop1>()).unwrap_err();
        assert_eq!(err.as_label(), "dispatch_broken_hierarchy");
        assert_eq!(reg.known_types().len(), 1);
    }
}
