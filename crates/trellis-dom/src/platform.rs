//! Platform abstraction traits for the document core.
//!
//! These traits let the core hand work to the host: a [`TaskRunner`]
//! provides the single execution context of a document, a [`RenderManager`]
//! turns committed batches into drawing operations and a [`LayoutService`]
//! computes positions. None of them are implemented here beyond what tests
//! need; see `trellis-runtime-std` for a thread backed runner.

use std::fmt;
use std::sync::Arc;

use crate::batch::NodeChange;
use crate::error::{CallFunctionError, RenderError};
use crate::node::{DomNode, LayoutResult, NodeId, RootId};
use crate::registry::DomNodeRegistry;
use crate::value::{DomValue, PropertyMap};

pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Single-consumer execution context of one document.
///
/// Implementations must run tasks one at a time, in the order they were
/// posted, and must never run a task inline inside `post_task`: callers post
/// while holding the batch lock.
pub trait TaskRunner: Send + Sync {
    fn post_task(&self, task: Task);
}

/// Bridge towards the platform rendering backend.
pub trait RenderManager: Send {
    /// Called once per committed batch with every change of that batch, in
    /// application order.
    fn apply_changes(&mut self, root_id: RootId, changes: &[NodeChange]) -> Result<(), RenderError>;

    /// Forwards a call-function request for `node`. The backend answers
    /// through `responder`, from any thread and at any later time.
    fn call_function(
        &mut self,
        node: &DomNode,
        name: &str,
        params: PropertyMap,
        responder: FunctionResponder,
    ) {
        let _ = (node, params);
        responder.respond(Err(CallFunctionError::Backend(format!(
            "function `{name}` is not supported"
        ))));
    }
}

/// Opaque layout collaborator consulted before the render manager sees a
/// batch.
pub trait LayoutService: Send {
    /// Returns layout results for any nodes whose geometry changed.
    fn compute_layout(
        &mut self,
        registry: &DomNodeRegistry,
        root_id: RootId,
        changes: &[NodeChange],
    ) -> Vec<(NodeId, LayoutResult)>;
}

pub type CallFunctionResult = Result<DomValue, CallFunctionError>;
pub type CallFunctionCallback = Box<dyn FnOnce(CallFunctionResult) + Send + 'static>;

/// Completion side of a call-function request.
///
/// Answering posts the caller's callback onto the document's task runner, so
/// the callback always runs in the document's execution context no matter
/// which thread the backend answers from. Dropping the responder unanswered
/// completes the call with [`CallFunctionError::Dropped`].
pub struct FunctionResponder {
    pending: Option<(Arc<dyn TaskRunner>, CallFunctionCallback)>,
}

impl FunctionResponder {
    pub fn new(runner: Arc<dyn TaskRunner>, callback: CallFunctionCallback) -> Self {
        Self {
            pending: Some((runner, callback)),
        }
    }

    pub fn respond(mut self, result: CallFunctionResult) {
        self.complete(result);
    }

    fn complete(&mut self, result: CallFunctionResult) {
        if let Some((runner, callback)) = self.pending.take() {
            runner.post_task(Box::new(move || callback(result)));
        }
    }
}

impl Drop for FunctionResponder {
    fn drop(&mut self) {
        if self.pending.is_some() {
            log::debug!("call-function responder dropped without an answer");
            self.complete(Err(CallFunctionError::Dropped));
        }
    }
}

impl fmt::Debug for FunctionResponder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionResponder")
            .field("answered", &self.pending.is_none())
            .finish()
    }
}
