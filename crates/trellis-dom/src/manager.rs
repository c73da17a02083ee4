//! Public entry point of one document.
//!
//! A [`DomManager`] is shared by every caller that mutates a document. The
//! document state itself lives on the manager's [`TaskRunner`]: every method
//! here either records an operation in the pending batch or posts a task, and
//! returns without waiting for that work to run.
//!
//! Batch protocol:
//!
//! * [`begin_batch`](DomManager::begin_batch) opens a batch. Opening one while
//!   another is open does nothing; batches do not nest.
//! * [`create_dom_nodes`](DomManager::create_dom_nodes),
//!   [`update_dom_node`](DomManager::update_dom_node) and
//!   [`delete_dom_node`](DomManager::delete_dom_node) append one operation per
//!   descriptor, keeping call order across operation kinds.
//! * [`end_batch`](DomManager::end_batch) takes the pending operations and
//!   posts their commit. Calling it with no open batch does nothing.
//!
//! The pending queue is swapped out and the commit is posted under the same
//! lock, so batches reach the runner in the order they were closed.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::batch::{BatchOperation, CommitReport};
use crate::config::{DocumentConfig, IdleOperationPolicy};
use crate::document::Document;
use crate::error::{CallFunctionError, DomError};
use crate::listener::{
    DomTreeEvent, DomTreeEventKind, ListenerId, TouchEvent, TouchEventKind,
};
use crate::node::{NodeDescriptor, NodeId, RootId};
use crate::platform::{
    CallFunctionResult, FunctionResponder, LayoutService, RenderManager, TaskRunner,
};
use crate::registry::DomNodeRegistry;
use crate::value::PropertyMap;

type DocumentCell = Arc<Mutex<Option<Document>>>;

#[derive(Default)]
struct BatchState {
    batching: bool,
    pending: Vec<BatchOperation>,
}

pub struct DomManager {
    root_id: RootId,
    idle_operations: IdleOperationPolicy,
    runner: Arc<dyn TaskRunner>,
    document: DocumentCell,
    batch: Mutex<BatchState>,
    destroyed: AtomicBool,
    next_listener_id: AtomicU32,
}

impl DomManager {
    pub fn new(
        root_id: RootId,
        config: DocumentConfig,
        runner: Arc<dyn TaskRunner>,
        render_manager: Box<dyn RenderManager>,
        layout: Option<Box<dyn LayoutService>>,
    ) -> Self {
        let idle_operations = config.idle_operations;
        let document = Document::new(root_id, config, render_manager, layout);
        Self {
            root_id,
            idle_operations,
            runner,
            document: Arc::new(Mutex::new(Some(document))),
            batch: Mutex::new(BatchState::default()),
            destroyed: AtomicBool::new(false),
            next_listener_id: AtomicU32::new(1),
        }
    }

    pub fn root_id(&self) -> RootId {
        self.root_id
    }

    pub fn runner(&self) -> Arc<dyn TaskRunner> {
        Arc::clone(&self.runner)
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    pub fn is_batching(&self) -> bool {
        self.lock_batch().batching
    }

    pub fn create_dom_nodes(&self, nodes: Vec<NodeDescriptor>) -> Result<(), DomError> {
        self.enqueue(nodes.into_iter().map(BatchOperation::Create).collect())
    }

    pub fn update_dom_node(&self, nodes: Vec<NodeDescriptor>) -> Result<(), DomError> {
        self.enqueue(nodes.into_iter().map(BatchOperation::Update).collect())
    }

    pub fn delete_dom_node(&self, nodes: Vec<NodeDescriptor>) -> Result<(), DomError> {
        self.enqueue(
            nodes
                .into_iter()
                .map(|node| BatchOperation::Delete(node.id))
                .collect(),
        )
    }

    pub fn begin_batch(&self) -> Result<(), DomError> {
        self.ensure_alive()?;
        let mut batch = self.lock_batch();
        if batch.batching {
            log::debug!("document {}: begin_batch while batching ignored", self.root_id);
            return Ok(());
        }
        batch.batching = true;
        Ok(())
    }

    pub fn end_batch(&self) -> Result<(), DomError> {
        self.ensure_alive()?;
        let mut batch = self.lock_batch();
        if !batch.batching {
            log::debug!("document {}: end_batch without a batch ignored", self.root_id);
            return Ok(());
        }
        batch.batching = false;
        let operations = std::mem::take(&mut batch.pending);
        self.post_commit(operations);
        Ok(())
    }

    /// Looks `id` up on the document runner and forwards the call to the
    /// render manager. `callback` always runs on the document runner, with
    /// [`CallFunctionError::NodeNotFound`] when the node does not exist.
    pub fn call_function(
        &self,
        id: NodeId,
        name: impl Into<String>,
        params: PropertyMap,
        callback: impl FnOnce(CallFunctionResult) + Send + 'static,
    ) -> Result<(), DomError> {
        self.ensure_alive()?;
        let name = name.into();
        let root_id = self.root_id;
        let responder = FunctionResponder::new(self.runner(), Box::new(callback));
        self.post_with(move |document| match document {
            Some(document) => document.call_function(id, &name, params, responder),
            None => responder.respond(Err(CallFunctionError::DocumentDestroyed { root_id })),
        });
        Ok(())
    }

    pub fn add_dom_tree_event_listener(
        &self,
        kind: DomTreeEventKind,
        listener: impl FnMut(&DomTreeEvent<'_>) + Send + 'static,
    ) -> Result<ListenerId, DomError> {
        self.ensure_alive()?;
        let id = ListenerId(self.next_listener_id.fetch_add(1, Ordering::Relaxed));
        let listener = Box::new(listener);
        self.post(move |document| document.add_tree_listener(kind, id, listener));
        Ok(id)
    }

    pub fn remove_dom_tree_event_listener(
        &self,
        kind: DomTreeEventKind,
        id: ListenerId,
    ) -> Result<(), DomError> {
        self.ensure_alive()?;
        self.post(move |document| document.remove_tree_listener(kind, id));
        Ok(())
    }

    /// Binds `listener` to `kind` events hitting node `id`, replacing an
    /// earlier listener for the same node and kind.
    pub fn add_touch_event_listener(
        &self,
        id: NodeId,
        kind: TouchEventKind,
        listener: impl FnMut(&TouchEvent) + Send + 'static,
    ) -> Result<(), DomError> {
        self.ensure_alive()?;
        let listener = Box::new(listener);
        self.post(move |document| document.add_touch_listener(id, kind, listener));
        Ok(())
    }

    /// Removes every touch listener registered for `kind`.
    pub fn remove_touch_event_listener(&self, kind: TouchEventKind) -> Result<(), DomError> {
        self.ensure_alive()?;
        self.post(move |document| document.remove_touch_listeners(kind));
        Ok(())
    }

    /// Entry point for the platform input source.
    pub fn dispatch_touch_event(&self, event: TouchEvent) -> Result<(), DomError> {
        self.ensure_alive()?;
        self.post(move |document| document.dispatch_touch(event));
        Ok(())
    }

    /// Runs `inspect` against the node registry on the document runner, after
    /// every task posted before it.
    pub fn inspect(
        &self,
        inspect: impl FnOnce(&DomNodeRegistry) + Send + 'static,
    ) -> Result<(), DomError> {
        self.ensure_alive()?;
        self.post(move |document| inspect(document.registry()));
        Ok(())
    }

    /// Marks the document destroyed and schedules its teardown behind any
    /// work already posted. Every later call fails with
    /// [`DomError::Destroyed`]. Returns `false` if it was already destroyed.
    pub fn destroy(&self) -> bool {
        if self.destroyed.swap(true, Ordering::AcqRel) {
            return false;
        }
        let dropped = std::mem::take(&mut self.lock_batch().pending);
        if !dropped.is_empty() {
            log::warn!(
                "document {}: destroyed with {} uncommitted operations",
                self.root_id,
                dropped.len()
            );
        }
        let document = Arc::clone(&self.document);
        self.runner.post_task(Box::new(move || {
            let mut slot = document.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(mut document) = slot.take() {
                document.tear_down();
            }
        }));
        true
    }

    fn enqueue(&self, mut operations: Vec<BatchOperation>) -> Result<(), DomError> {
        self.ensure_alive()?;
        let mut batch = self.lock_batch();
        batch.pending.append(&mut operations);
        if !batch.batching && self.idle_operations == IdleOperationPolicy::Commit {
            let operations = std::mem::take(&mut batch.pending);
            self.post_commit(operations);
        }
        Ok(())
    }

    fn post_commit(&self, operations: Vec<BatchOperation>) {
        if operations.is_empty() {
            log::trace!("document {}: empty batch", self.root_id);
            return;
        }
        self.post(move |document| {
            let CommitReport { batch, applied, .. } = document.commit(operations);
            log::trace!("batch {batch} committed ({applied} applied)");
        });
    }

    fn post(&self, task: impl FnOnce(&mut Document) + Send + 'static) {
        let root_id = self.root_id;
        self.post_with(move |document| match document {
            Some(document) => task(document),
            None => log::warn!("document {root_id} torn down; task dropped"),
        });
    }

    fn post_with(&self, task: impl FnOnce(Option<&mut Document>) + Send + 'static) {
        let document = Arc::clone(&self.document);
        self.runner.post_task(Box::new(move || {
            let mut slot = document.lock().unwrap_or_else(PoisonError::into_inner);
            task(slot.as_mut());
        }));
    }

    fn ensure_alive(&self) -> Result<(), DomError> {
        if self.is_destroyed() {
            log::error!("document {} used after destroy", self.root_id);
            return Err(DomError::Destroyed {
                root_id: self.root_id,
            });
        }
        Ok(())
    }

    fn lock_batch(&self) -> MutexGuard<'_, BatchState> {
        self.batch.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for DomManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomManager")
            .field("root_id", &self.root_id)
            .field("destroyed", &self.is_destroyed())
            .field("batching", &self.is_batching())
            .finish()
    }
}
