use crate::batch::{apply_batch, BatchOperation, ChangeKind, CommitReport};
use crate::collections::map::HashSet;
use crate::config::DocumentConfig;
use crate::error::CallFunctionError;
use crate::listener::{
    DomTreeEventKind, DomTreeEventListener, ListenerId, TouchDispatch, TouchEvent,
    TouchEventKind, TouchEventListener, TouchListenerRegistry, TreeListenerRegistry,
};
use crate::node::{DomNode, NodeId, RootId};
use crate::platform::{FunctionResponder, LayoutService, RenderManager};
use crate::registry::DomNodeRegistry;
use crate::value::PropertyMap;

/// State of one document. Only ever touched from tasks running on the
/// document's task runner.
pub(crate) struct Document {
    root_id: RootId,
    config: DocumentConfig,
    registry: DomNodeRegistry,
    render_manager: Box<dyn RenderManager>,
    layout: Option<Box<dyn LayoutService>>,
    tree_listeners: TreeListenerRegistry,
    touch_listeners: TouchListenerRegistry,
    committed_batches: u64,
}

impl Document {
    pub(crate) fn new(
        root_id: RootId,
        config: DocumentConfig,
        render_manager: Box<dyn RenderManager>,
        layout: Option<Box<dyn LayoutService>>,
    ) -> Self {
        let mut registry = DomNodeRegistry::new();
        let root = DomNode::new(root_id, &config.root_tag_name, &config.root_view_name);
        if let Err(err) = registry.add_node(root) {
            log::error!("document {root_id}: {err}");
        }
        Self {
            root_id,
            config,
            registry,
            render_manager,
            layout,
            tree_listeners: TreeListenerRegistry::default(),
            touch_listeners: TouchListenerRegistry::default(),
            committed_batches: 0,
        }
    }

    pub(crate) fn registry(&self) -> &DomNodeRegistry {
        &self.registry
    }

    pub(crate) fn commit(&mut self, operations: Vec<BatchOperation>) -> CommitReport {
        self.committed_batches += 1;
        let batch = self.committed_batches;
        let operation_count = operations.len();
        let (mut changes, mut report) = apply_batch(&mut self.registry, self.root_id, operations);
        report.batch = batch;
        log::trace!(
            "document {}: batch {batch} applied {}/{operation_count} operations",
            self.root_id,
            report.applied
        );
        if !report.is_clean() {
            log::warn!(
                "document {}: batch {batch} skipped {} operations",
                self.root_id,
                report.skipped.len()
            );
        }
        if changes.is_empty() {
            return report;
        }

        if self.config.purge_touch_listeners_on_delete {
            for change in changes.iter().filter(|change| change.kind == ChangeKind::Deleted) {
                self.touch_listeners.remove_node(change.id());
            }
        }

        if let Some(layout) = self.layout.as_mut() {
            for (id, result) in layout.compute_layout(&self.registry, self.root_id, &changes) {
                match self.registry.get_node_mut(id) {
                    Some(node) => node.set_layout(result),
                    None => log::debug!("layout result for missing node {id} ignored"),
                }
            }
        }

        // The bridge sees the committed state of every live node. Changes
        // to an incarnation deleted later in the batch keep their own state.
        let mut deleted_later: HashSet<NodeId> = HashSet::default();
        for change in changes.iter_mut().rev() {
            if change.kind == ChangeKind::Deleted {
                deleted_later.insert(change.id());
                continue;
            }
            if deleted_later.contains(&change.id()) {
                continue;
            }
            if let Some(node) = self.registry.get_node(change.id()) {
                change.node = node.clone();
            }
        }

        if let Err(err) = self.render_manager.apply_changes(self.root_id, &changes) {
            log::error!("document {}: batch {batch}: {err}", self.root_id);
        }

        let failures = self
            .tree_listeners
            .dispatch(self.root_id, &changes, &report);
        if failures > 0 {
            log::warn!(
                "document {}: {failures} tree listeners failed during batch {batch}",
                self.root_id
            );
        }
        report
    }

    pub(crate) fn call_function(
        &mut self,
        id: NodeId,
        name: &str,
        params: PropertyMap,
        responder: FunctionResponder,
    ) {
        match self.registry.get_node(id) {
            Some(node) => self
                .render_manager
                .call_function(node, name, params, responder),
            None => {
                log::warn!(
                    "document {}: call-function `{name}` on missing node {id}",
                    self.root_id
                );
                responder.respond(Err(CallFunctionError::NodeNotFound { id }));
            }
        }
    }

    pub(crate) fn add_tree_listener(
        &mut self,
        kind: DomTreeEventKind,
        id: ListenerId,
        listener: DomTreeEventListener,
    ) {
        self.tree_listeners.add(kind, id, listener);
        log::trace!(
            "document {}: {} {kind:?} tree listeners",
            self.root_id,
            self.tree_listeners.len(kind)
        );
    }

    pub(crate) fn remove_tree_listener(&mut self, kind: DomTreeEventKind, id: ListenerId) {
        if !self.tree_listeners.remove(kind, id) {
            log::debug!(
                "document {}: no tree listener {} for {kind:?}",
                self.root_id,
                id.raw()
            );
        }
    }

    pub(crate) fn add_touch_listener(
        &mut self,
        node_id: NodeId,
        kind: TouchEventKind,
        listener: TouchEventListener,
    ) {
        if !self.registry.contains(node_id) {
            log::debug!(
                "document {}: touch listener registered for node {node_id} before it exists",
                self.root_id
            );
        }
        if self.touch_listeners.add(node_id, kind, listener) {
            log::debug!("replaced {kind:?} touch listener of node {node_id}");
        }
    }

    pub(crate) fn remove_touch_listeners(&mut self, kind: TouchEventKind) {
        let removed = self.touch_listeners.remove_kind(kind);
        log::trace!(
            "document {}: removed {removed} {kind:?} touch listeners",
            self.root_id
        );
    }

    pub(crate) fn dispatch_touch(&mut self, event: TouchEvent) {
        if !self.registry.contains(event.node_id) {
            log::warn!(
                "document {}: touch {:?} for missing node {}",
                self.root_id,
                event.kind,
                event.node_id
            );
            return;
        }
        if self.touch_listeners.dispatch(&event) == TouchDispatch::NoListener {
            log::trace!(
                "document {}: no {:?} listener on node {}",
                self.root_id,
                event.kind,
                event.node_id
            );
        }
    }

    /// Releases nodes and listeners. The render manager and layout service
    /// are dropped with the document itself.
    pub(crate) fn tear_down(&mut self) {
        log::debug!(
            "document {}: tearing down {} nodes after {} batches",
            self.root_id,
            self.registry.len(),
            self.committed_batches
        );
        self.tree_listeners.clear();
        self.touch_listeners.clear();
        self.registry.clear();
    }
}

#[cfg(test)]
#[path = "tests/document_tests.rs"]
mod tests;
