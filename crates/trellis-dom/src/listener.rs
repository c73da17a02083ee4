//! Tree-change and touch listener registries.
//!
//! Both registries run their callbacks synchronously on the document's task
//! runner. A panicking callback is caught and logged so the remaining
//! callbacks of the same dispatch still run.
//!
//! The two registries differ on removal: a tree listener is removed through
//! the [`ListenerId`] handed out when it was added, while touch listeners are
//! removed for a whole [`TouchEventKind`] at once. Touch dispatch is keyed by
//! the originating node, so there is one slot per node and kind.

use std::panic::{self, AssertUnwindSafe};

use crate::batch::{ChangeKind, CommitReport, NodeChange};
use crate::collections::map::{HashMap, IndexMap};
use crate::node::{NodeId, RootId};

/// Handle returned when a tree listener is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u32);

impl ListenerId {
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomTreeEventKind {
    /// The batch created at least one node.
    Create,
    /// The batch updated at least one node.
    Update,
    /// The batch deleted at least one node.
    Delete,
    /// Any non-empty batch.
    Commit,
}

impl DomTreeEventKind {
    const DISPATCH_ORDER: [DomTreeEventKind; 4] = [
        DomTreeEventKind::Create,
        DomTreeEventKind::Update,
        DomTreeEventKind::Delete,
        DomTreeEventKind::Commit,
    ];

    fn matches(self, changes: &[NodeChange]) -> bool {
        let wanted = match self {
            DomTreeEventKind::Create => ChangeKind::Created,
            DomTreeEventKind::Update => ChangeKind::Updated,
            DomTreeEventKind::Delete => ChangeKind::Deleted,
            DomTreeEventKind::Commit => return !changes.is_empty(),
        };
        changes.iter().any(|change| change.kind == wanted)
    }
}

/// Delivered to tree listeners once per committed batch.
#[derive(Debug, Clone, Copy)]
pub struct DomTreeEvent<'a> {
    pub kind: DomTreeEventKind,
    pub root_id: RootId,
    pub changes: &'a [NodeChange],
    pub report: &'a CommitReport,
}

pub type DomTreeEventListener = Box<dyn FnMut(&DomTreeEvent<'_>) + Send + 'static>;

#[derive(Default)]
pub(crate) struct TreeListenerRegistry {
    listeners: HashMap<DomTreeEventKind, IndexMap<ListenerId, DomTreeEventListener>>,
}

impl TreeListenerRegistry {
    pub(crate) fn add(
        &mut self,
        kind: DomTreeEventKind,
        id: ListenerId,
        listener: DomTreeEventListener,
    ) {
        self.listeners
            .entry(kind)
            .or_default()
            .insert(id, listener);
    }

    pub(crate) fn remove(&mut self, kind: DomTreeEventKind, id: ListenerId) -> bool {
        let Some(listeners) = self.listeners.get_mut(&kind) else {
            return false;
        };
        // shift_remove keeps the remaining registrations in order.
        listeners.shift_remove(&id).is_some()
    }

    pub(crate) fn len(&self, kind: DomTreeEventKind) -> usize {
        self.listeners.get(&kind).map_or(0, |listeners| listeners.len())
    }

    /// Fans a committed batch out to every matching kind. Returns the number
    /// of listeners that panicked.
    pub(crate) fn dispatch(
        &mut self,
        root_id: RootId,
        changes: &[NodeChange],
        report: &CommitReport,
    ) -> usize {
        let mut failures = 0;
        for kind in DomTreeEventKind::DISPATCH_ORDER {
            if !kind.matches(changes) {
                continue;
            }
            let Some(listeners) = self.listeners.get_mut(&kind) else {
                continue;
            };
            let event = DomTreeEvent {
                kind,
                root_id,
                changes,
                report,
            };
            for (id, listener) in listeners.iter_mut() {
                if panic::catch_unwind(AssertUnwindSafe(|| listener(&event))).is_err() {
                    failures += 1;
                    log::error!(
                        "tree listener {} for {kind:?} on document {root_id} panicked",
                        id.raw()
                    );
                }
            }
        }
        failures
    }

    pub(crate) fn clear(&mut self) {
        self.listeners.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TouchEventKind {
    Start,
    Move,
    End,
    Cancel,
    Click,
    LongClick,
}

/// Input event reported by the platform for a hit node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchEvent {
    pub node_id: NodeId,
    pub kind: TouchEventKind,
    pub x: f32,
    pub y: f32,
    pub timestamp_millis: u64,
}

impl TouchEvent {
    pub fn new(node_id: NodeId, kind: TouchEventKind, x: f32, y: f32) -> Self {
        Self {
            node_id,
            kind,
            x,
            y,
            timestamp_millis: 0,
        }
    }
}

pub type TouchEventListener = Box<dyn FnMut(&TouchEvent) + Send + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TouchDispatch {
    Delivered,
    NoListener,
    Failed,
}

#[derive(Default)]
pub(crate) struct TouchListenerRegistry {
    listeners: HashMap<TouchEventKind, HashMap<NodeId, TouchEventListener>>,
}

impl TouchListenerRegistry {
    /// Returns `true` when an earlier registration for the same node and kind
    /// was replaced.
    pub(crate) fn add(
        &mut self,
        node_id: NodeId,
        kind: TouchEventKind,
        listener: TouchEventListener,
    ) -> bool {
        self.listeners
            .entry(kind)
            .or_default()
            .insert(node_id, listener)
            .is_some()
    }

    /// Drops every registration of `kind`, whatever node it was bound to.
    pub(crate) fn remove_kind(&mut self, kind: TouchEventKind) -> usize {
        self.listeners.remove(&kind).map_or(0, |slots| slots.len())
    }

    pub(crate) fn remove_node(&mut self, node_id: NodeId) {
        for slots in self.listeners.values_mut() {
            slots.remove(&node_id);
        }
    }

    pub(crate) fn dispatch(&mut self, event: &TouchEvent) -> TouchDispatch {
        let Some(listener) = self
            .listeners
            .get_mut(&event.kind)
            .and_then(|slots| slots.get_mut(&event.node_id))
        else {
            return TouchDispatch::NoListener;
        };
        match panic::catch_unwind(AssertUnwindSafe(|| listener(event))) {
            Ok(()) => TouchDispatch::Delivered,
            Err(_) => {
                log::error!(
                    "touch listener for {:?} on node {} panicked",
                    event.kind,
                    event.node_id
                );
                TouchDispatch::Failed
            }
        }
    }

    pub(crate) fn clear(&mut self) {
        self.listeners.clear();
    }
}

#[cfg(test)]
#[path = "tests/listener_tests.rs"]
mod tests;
