use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use trellis_dom::collections::map::HashMap;
use trellis_dom::{
    CallFunctionError, CallFunctionResult, ChangeKind, DomNode, DomNodeRegistry, DomValue,
    FunctionResponder, LayoutResult, LayoutService, NodeChange, NodeId, PropertyMap,
    RenderError, RenderManager, RootId, Task, TaskRunner,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Task runner that only runs tasks when the test asks it to, on the test's
/// own thread.
#[derive(Default)]
pub struct ManualTaskRunner {
    queue: Mutex<VecDeque<Task>>,
}

impl ManualTaskRunner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn pending(&self) -> usize {
        lock(&self.queue).len()
    }

    /// Runs the oldest queued task, if any.
    pub fn run_next(&self) -> bool {
        let task = lock(&self.queue).pop_front();
        match task {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Runs tasks, including ones posted by the tasks themselves, until the
    /// queue is empty. Returns how many ran.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while self.run_next() {
            ran += 1;
        }
        ran
    }
}

impl TaskRunner for ManualTaskRunner {
    fn post_task(&self, task: Task) {
        lock(&self.queue).push_back(task);
    }
}

impl fmt::Debug for ManualTaskRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualTaskRunner")
            .field("pending", &self.pending())
            .finish()
    }
}

/// One `apply_changes` call seen by a [`RecordingRenderManager`].
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedBatch {
    pub root_id: RootId,
    pub changes: Vec<NodeChange>,
}

impl RenderedBatch {
    pub fn ids(&self) -> Vec<NodeId> {
        self.changes.iter().map(NodeChange::id).collect()
    }

    pub fn ids_of(&self, kind: ChangeKind) -> Vec<NodeId> {
        self.changes
            .iter()
            .filter(|change| change.kind == kind)
            .map(NodeChange::id)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub node_id: NodeId,
    pub name: String,
    pub params: PropertyMap,
}

#[derive(Default)]
struct RenderState {
    batches: Vec<RenderedBatch>,
    calls: Vec<FunctionCall>,
    answers: HashMap<String, CallFunctionResult>,
    hold_calls: bool,
    held: Vec<FunctionResponder>,
    fail_next_apply: Option<String>,
}

/// Shared view of what a [`RecordingRenderManager`] received, and the knobs
/// that script its answers.
#[derive(Clone, Default)]
pub struct RenderRecorder {
    state: Arc<Mutex<RenderState>>,
}

impl RenderRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A render manager that reports into this recorder.
    pub fn manager(&self) -> RecordingRenderManager {
        RecordingRenderManager {
            state: Arc::clone(&self.state),
        }
    }

    pub fn batches(&self) -> Vec<RenderedBatch> {
        lock(&self.state).batches.clone()
    }

    pub fn batch_count(&self) -> usize {
        lock(&self.state).batches.len()
    }

    pub fn last_batch(&self) -> Option<RenderedBatch> {
        lock(&self.state).batches.last().cloned()
    }

    pub fn calls(&self) -> Vec<FunctionCall> {
        lock(&self.state).calls.clone()
    }

    /// Answers every later call of `name` with `result`. Unscripted calls
    /// answer `Ok(DomValue::Null)`.
    pub fn answer(&self, name: impl Into<String>, result: CallFunctionResult) {
        lock(&self.state).answers.insert(name.into(), result);
    }

    /// When set, calls are kept unanswered until [`release_held`](Self::release_held).
    pub fn hold_calls(&self, hold: bool) {
        lock(&self.state).hold_calls = hold;
    }

    pub fn held_calls(&self) -> usize {
        lock(&self.state).held.len()
    }

    /// Answers every held call with `result`.
    pub fn release_held(&self, result: CallFunctionResult) -> usize {
        let held = std::mem::take(&mut lock(&self.state).held);
        let count = held.len();
        for responder in held {
            responder.respond(result.clone());
        }
        count
    }

    /// Drops every held call without answering it.
    pub fn drop_held(&self) -> usize {
        let held = std::mem::take(&mut lock(&self.state).held);
        log::trace!("dropping {} held calls", held.len());
        held.len()
    }

    pub fn fail_next_apply(&self, message: impl Into<String>) {
        lock(&self.state).fail_next_apply = Some(message.into());
    }
}

impl fmt::Debug for RenderRecorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("RenderRecorder")
            .field("batches", &state.batches.len())
            .field("calls", &state.calls.len())
            .field("held", &state.held.len())
            .finish()
    }
}

/// Render manager that records every batch it is handed.
pub struct RecordingRenderManager {
    state: Arc<Mutex<RenderState>>,
}

impl RenderManager for RecordingRenderManager {
    fn apply_changes(&mut self, root_id: RootId, changes: &[NodeChange]) -> Result<(), RenderError> {
        let mut state = lock(&self.state);
        state.batches.push(RenderedBatch {
            root_id,
            changes: changes.to_vec(),
        });
        match state.fail_next_apply.take() {
            Some(message) => {
                log::debug!("scripted render failure for document {root_id}: {message}");
                Err(RenderError::new(message))
            }
            None => Ok(()),
        }
    }

    fn call_function(
        &mut self,
        node: &DomNode,
        name: &str,
        params: PropertyMap,
        responder: FunctionResponder,
    ) {
        let mut state = lock(&self.state);
        state.calls.push(FunctionCall {
            node_id: node.id(),
            name: name.to_owned(),
            params,
        });
        if state.hold_calls {
            state.held.push(responder);
            return;
        }
        let result = state
            .answers
            .get(name)
            .cloned()
            .unwrap_or(Ok(DomValue::Null));
        drop(state);
        responder.respond(result);
    }
}

/// Render manager that accepts everything and records nothing.
#[derive(Debug, Default)]
pub struct NullRenderManager;

impl RenderManager for NullRenderManager {
    fn apply_changes(&mut self, _root_id: RootId, _changes: &[NodeChange]) -> Result<(), RenderError> {
        Ok(())
    }

    fn call_function(
        &mut self,
        _node: &DomNode,
        _name: &str,
        _params: PropertyMap,
        responder: FunctionResponder,
    ) {
        responder.respond(Err(CallFunctionError::Backend("null backend".to_owned())));
    }
}

/// Stacks every node's children vertically inside it.
///
/// Heights and widths come from the numeric `height`/`width` props, falling
/// back to [`StackLayoutService::DEFAULT_HEIGHT`] and the parent width.
#[derive(Debug, Clone, Default)]
pub struct StackLayoutService {
    passes: Arc<AtomicUsize>,
}

impl StackLayoutService {
    pub const DEFAULT_HEIGHT: f32 = 10.0;
    pub const ROOT_WIDTH: f32 = 360.0;

    pub fn new() -> Self {
        Self::default()
    }

    /// Number of layout passes run so far, shared between clones.
    pub fn passes(&self) -> usize {
        self.passes.load(Ordering::SeqCst)
    }

    fn size_prop(node: &DomNode, key: &str) -> Option<f32> {
        node.prop(key).and_then(DomValue::as_f64).map(|value| value as f32)
    }

    fn layout_node(
        registry: &DomNodeRegistry,
        node: &DomNode,
        frame: LayoutResult,
        results: &mut Vec<(NodeId, LayoutResult)>,
    ) {
        results.push((node.id(), frame));
        let mut top = frame.top;
        for child in node.children().iter().filter_map(|&id| registry.get_node(id)) {
            let width = Self::size_prop(child, "width").unwrap_or(frame.width);
            let height = Self::size_prop(child, "height").unwrap_or(Self::DEFAULT_HEIGHT);
            let child_frame = LayoutResult::new(frame.left, top, width, height);
            Self::layout_node(registry, child, child_frame, results);
            top += height;
        }
    }
}

impl LayoutService for StackLayoutService {
    fn compute_layout(
        &mut self,
        registry: &DomNodeRegistry,
        root_id: RootId,
        _changes: &[NodeChange],
    ) -> Vec<(NodeId, LayoutResult)> {
        self.passes.fetch_add(1, Ordering::SeqCst);
        let mut results = Vec::new();
        if let Some(root) = registry.get_node(root_id) {
            let frame = LayoutResult::new(0.0, 0.0, Self::ROOT_WIDTH, 0.0);
            Self::layout_node(registry, root, frame, &mut results);
        }
        results
    }
}
