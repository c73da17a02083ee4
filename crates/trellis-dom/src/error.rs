use thiserror::Error;

use crate::node::{NodeId, RootId};

/// Failures reported by the document core.
///
/// Structural variants are recorded in a [`CommitReport`](crate::CommitReport)
/// and never abort a batch. [`DomError::Destroyed`] is returned by every
/// [`DomManager`](crate::DomManager) call made after the document was torn
/// down.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    #[error("node {id} already exists")]
    DuplicateNode { id: NodeId },
    #[error("node {id} missing")]
    NodeNotFound { id: NodeId },
    #[error("parent {pid} of node {id} missing")]
    ParentNotFound { id: NodeId, pid: NodeId },
    #[error("root node {id} cannot be deleted")]
    RootNode { id: NodeId },
    #[error("document {root_id} was destroyed")]
    Destroyed { root_id: RootId },
    #[error("no task runner for document {root_id}: {reason}")]
    RunnerUnavailable { root_id: RootId, reason: String },
}

/// Outcome of a failed [`DomManager::call_function`](crate::DomManager::call_function).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallFunctionError {
    #[error("node {id} missing")]
    NodeNotFound { id: NodeId },
    #[error("document {root_id} was destroyed before the call ran")]
    DocumentDestroyed { root_id: RootId },
    #[error("backend failure: {0}")]
    Backend(String),
    #[error("backend dropped the call without answering")]
    Dropped,
}

/// Failure reported by a [`RenderManager`](crate::RenderManager) while applying a batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("render manager failed: {message}")]
pub struct RenderError {
    pub message: String,
}

impl RenderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
