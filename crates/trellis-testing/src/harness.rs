//! Single-threaded document harness.
//!
//! [`TestDocument`] wires a [`DomManager`] to a [`ManualTaskRunner`] and a
//! [`RecordingRenderManager`](crate::RecordingRenderManager), so a test can
//! issue operations, run the document's queue to completion and read the
//! resulting tree without any threads involved.

use std::sync::{Arc, Mutex, PoisonError};

use trellis_dom::collections::map::HashMap;
use trellis_dom::{
    DocumentConfig, DocumentFactory, DomError, DomManager, DomNode, LayoutService, NodeId,
    RenderManager, RootId, TaskRunner,
};

use crate::testing::{ManualTaskRunner, RenderRecorder};

pub struct TestDocument {
    runner: Arc<ManualTaskRunner>,
    recorder: RenderRecorder,
    manager: Arc<DomManager>,
}

impl TestDocument {
    pub fn new(root_id: RootId) -> Self {
        Self::build(root_id, DocumentConfig::default(), None)
    }

    pub fn with_config(root_id: RootId, config: DocumentConfig) -> Self {
        Self::build(root_id, config, None)
    }

    pub fn with_layout(root_id: RootId, layout: impl LayoutService + 'static) -> Self {
        Self::build(root_id, DocumentConfig::default(), Some(Box::new(layout)))
    }

    fn build(
        root_id: RootId,
        config: DocumentConfig,
        layout: Option<Box<dyn LayoutService>>,
    ) -> Self {
        let runner = ManualTaskRunner::new();
        let recorder = RenderRecorder::new();
        let manager = Arc::new(DomManager::new(
            root_id,
            config,
            runner.clone(),
            Box::new(recorder.manager()),
            layout,
        ));
        Self {
            runner,
            recorder,
            manager,
        }
    }

    pub fn manager(&self) -> &Arc<DomManager> {
        &self.manager
    }

    pub fn recorder(&self) -> &RenderRecorder {
        &self.recorder
    }

    pub fn runner(&self) -> &Arc<ManualTaskRunner> {
        &self.runner
    }

    pub fn root_id(&self) -> RootId {
        self.manager.root_id()
    }

    /// Drains the document's task queue.
    pub fn run(&self) -> usize {
        self.runner.run_until_idle()
    }

    /// Opens a batch, lets `build` issue operations, closes the batch and runs
    /// the commit.
    pub fn batch(&self, build: impl FnOnce(&DomManager)) {
        self.manager.begin_batch().expect("begin_batch");
        build(&self.manager);
        self.manager.end_batch().expect("end_batch");
        self.run();
    }

    /// Reads the committed state of `id` after running every queued task.
    pub fn node(&self, id: NodeId) -> Option<DomNode> {
        self.read(move |registry| registry.get_node(id).cloned())
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.node(id)
            .map(|node| node.children().to_vec())
            .unwrap_or_default()
    }

    pub fn node_count(&self) -> usize {
        self.read(|registry| registry.len())
    }

    pub fn dump_tree(&self) -> String {
        let root_id = self.root_id();
        self.read(move |registry| registry.dump_tree(Some(root_id)))
    }

    fn read<R: Send + 'static>(
        &self,
        read: impl FnOnce(&trellis_dom::DomNodeRegistry) -> R + Send + 'static,
    ) -> R {
        let slot = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&slot);
        self.manager
            .inspect(move |registry| {
                *sink.lock().unwrap_or_else(PoisonError::into_inner) = Some(read(registry));
            })
            .expect("inspect on a live document");
        self.run();
        let value = slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        value.expect("inspect task ran")
    }
}

/// [`DocumentFactory`] handing out a [`ManualTaskRunner`] and a recorded
/// render manager per root id.
#[derive(Default)]
pub struct TestDocumentFactory {
    config: DocumentConfig,
    documents: Mutex<HashMap<RootId, (Arc<ManualTaskRunner>, RenderRecorder)>>,
}

impl TestDocumentFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_config(config: DocumentConfig) -> Arc<Self> {
        Arc::new(Self {
            config,
            documents: Mutex::default(),
        })
    }

    fn entry(&self, root_id: RootId) -> (Arc<ManualTaskRunner>, RenderRecorder) {
        let mut documents = self
            .documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        documents
            .entry(root_id)
            .or_insert_with(|| (ManualTaskRunner::new(), RenderRecorder::new()))
            .clone()
    }

    /// Runner of `root_id`; created on first request.
    pub fn runner(&self, root_id: RootId) -> Arc<ManualTaskRunner> {
        self.entry(root_id).0
    }

    pub fn recorder(&self, root_id: RootId) -> RenderRecorder {
        self.entry(root_id).1
    }

    /// Runs the queues of every known document until all are idle.
    pub fn run_all(&self) -> usize {
        let runners: Vec<Arc<ManualTaskRunner>> = self
            .documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|(runner, _)| Arc::clone(runner))
            .collect();
        let mut ran = 0;
        loop {
            let step: usize = runners.iter().map(|runner| runner.run_until_idle()).sum();
            if step == 0 {
                return ran;
            }
            ran += step;
        }
    }
}

impl DocumentFactory for TestDocumentFactory {
    fn create_runner(&self, root_id: RootId) -> Result<Arc<dyn TaskRunner>, DomError> {
        Ok(self.runner(root_id))
    }

    fn create_render_manager(&self, root_id: RootId) -> Box<dyn RenderManager> {
        Box::new(self.recorder(root_id).manager())
    }

    fn config(&self, _root_id: RootId) -> DocumentConfig {
        self.config.clone()
    }
}
