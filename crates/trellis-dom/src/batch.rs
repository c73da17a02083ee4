//! Queued node operations and the commit pass that applies them.
//!
//! Operations are recorded in call order and applied strictly FIFO: a later
//! operation may depend on the structural effect of an earlier one in the
//! same batch, so nothing is reordered or coalesced. An operation that cannot
//! be applied (unknown id, duplicate id, missing parent) is skipped and
//! recorded in the [`CommitReport`]; the rest of the batch still applies.

use std::fmt;

use crate::error::DomError;
use crate::node::{DomNode, NodeDescriptor, NodeId};
use crate::registry::DomNodeRegistry;

#[derive(Debug, Clone, PartialEq)]
pub enum BatchOperation {
    Create(NodeDescriptor),
    Update(NodeDescriptor),
    Delete(NodeId),
}

impl BatchOperation {
    pub fn kind(&self) -> OperationKind {
        match self {
            BatchOperation::Create(_) => OperationKind::Create,
            BatchOperation::Update(_) => OperationKind::Update,
            BatchOperation::Delete(_) => OperationKind::Delete,
        }
    }

    pub fn node_id(&self) -> NodeId {
        match self {
            BatchOperation::Create(descriptor) | BatchOperation::Update(descriptor) => {
                descriptor.id
            }
            BatchOperation::Delete(id) => *id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Create,
    Update,
    Delete,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationKind::Create => "create",
            OperationKind::Update => "update",
            OperationKind::Delete => "delete",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

/// One applied operation as seen by the render manager and tree listeners.
///
/// `node` is the committed state of the node, or its last state for
/// deletions. A change followed by a deletion of the same id later in the
/// batch keeps the state the node had when that change was applied.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeChange {
    pub kind: ChangeKind,
    pub node: DomNode,
}

impl NodeChange {
    pub fn id(&self) -> NodeId {
        self.node.id()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedOperation {
    /// Position of the operation in its batch.
    pub position: usize,
    pub kind: OperationKind,
    pub reason: DomError,
}

/// Summary of one committed batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReport {
    /// Sequence number of the batch within its document, starting at 1.
    pub batch: u64,
    pub applied: usize,
    pub skipped: Vec<SkippedOperation>,
}

impl CommitReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Applies `operations` to `registry` in order.
///
/// Nodes created without a parent id are attached under `root_id`. Returns
/// the changes in application order together with the report of skipped
/// operations; `report.batch` is left for the caller to fill in.
pub fn apply_batch(
    registry: &mut DomNodeRegistry,
    root_id: NodeId,
    operations: Vec<BatchOperation>,
) -> (Vec<NodeChange>, CommitReport) {
    let mut changes = Vec::with_capacity(operations.len());
    let mut report = CommitReport::default();
    for (position, operation) in operations.into_iter().enumerate() {
        let kind = operation.kind();
        let result = match operation {
            BatchOperation::Create(descriptor) => apply_create(registry, root_id, descriptor),
            BatchOperation::Update(descriptor) => apply_update(registry, descriptor),
            BatchOperation::Delete(id) => apply_delete(registry, root_id, id),
        };
        match result {
            Ok(change) => {
                report.applied += 1;
                changes.push(change);
            }
            Err(reason) => {
                log::warn!("skipping {kind} at position {position}: {reason}");
                report.skipped.push(SkippedOperation {
                    position,
                    kind,
                    reason,
                });
            }
        }
    }
    (changes, report)
}

fn apply_create(
    registry: &mut DomNodeRegistry,
    root_id: NodeId,
    descriptor: NodeDescriptor,
) -> Result<NodeChange, DomError> {
    let id = descriptor.id;
    let pid = descriptor.pid.unwrap_or(root_id);
    if registry.contains(id) {
        return Err(DomError::DuplicateNode { id });
    }
    if !registry.contains(pid) {
        return Err(DomError::ParentNotFound { id, pid });
    }
    let index = descriptor.index;
    registry.add_node(DomNode::from_descriptor(descriptor, pid))?;
    let parent = registry
        .get_node_mut(pid)
        .ok_or(DomError::ParentNotFound { id, pid })?;
    let position = parent.insert_child(id, index);
    if let Some(requested) = index.filter(|&requested| requested != position) {
        log::debug!("index {requested} for node {id} out of range; appended at {position}");
    }
    let node = registry
        .get_node(id)
        .cloned()
        .ok_or(DomError::NodeNotFound { id })?;
    Ok(NodeChange {
        kind: ChangeKind::Created,
        node,
    })
}

fn apply_update(
    registry: &mut DomNodeRegistry,
    descriptor: NodeDescriptor,
) -> Result<NodeChange, DomError> {
    let id = descriptor.id;
    let node = registry
        .get_node_mut(id)
        .ok_or(DomError::NodeNotFound { id })?;
    node.merge_props(descriptor.props);
    Ok(NodeChange {
        kind: ChangeKind::Updated,
        node: node.clone(),
    })
}

fn apply_delete(
    registry: &mut DomNodeRegistry,
    root_id: NodeId,
    id: NodeId,
) -> Result<NodeChange, DomError> {
    if id == root_id {
        return Err(DomError::RootNode { id });
    }
    let pid = registry
        .get_node(id)
        .ok_or(DomError::NodeNotFound { id })?
        .parent();
    if let Some(parent) = pid.and_then(|pid| registry.get_node_mut(pid)) {
        parent.remove_child(id);
    }
    let node = registry
        .remove_node(id)
        .ok_or(DomError::NodeNotFound { id })?;
    // Orphans must not keep a link that a later node with the same id would
    // resolve.
    for &child in node.children() {
        if let Some(orphan) = registry.get_node_mut(child) {
            orphan.detach_parent();
        }
    }
    Ok(NodeChange {
        kind: ChangeKind::Deleted,
        node,
    })
}

#[cfg(test)]
#[path = "tests/batch_tests.rs"]
mod tests;
