use std::fmt::Write as _;

use crate::collections::map::HashMap;
use crate::error::DomError;
use crate::node::{DomNode, NodeId};

/// Sole owner of the nodes of one document.
#[derive(Debug, Default)]
pub struct DomNodeRegistry {
    nodes: HashMap<NodeId, DomNode>,
}

impl DomNodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `node`. A node whose id is already registered is rejected and
    /// the existing entry is kept.
    pub fn add_node(&mut self, node: DomNode) -> Result<(), DomError> {
        let id = node.id();
        if self.nodes.contains_key(&id) {
            return Err(DomError::DuplicateNode { id });
        }
        self.nodes.insert(id, node);
        Ok(())
    }

    pub fn get_node(&self, id: NodeId) -> Option<&DomNode> {
        self.nodes.get(&id)
    }

    pub fn get_node_mut(&mut self, id: NodeId) -> Option<&mut DomNode> {
        self.nodes.get_mut(&id)
    }

    /// Drops the entry for `id` without touching descendants. The caller must
    /// detach the node from its parent first.
    pub fn remove_node(&mut self, id: NodeId) -> Option<DomNode> {
        let node = self.nodes.remove(&id)?;
        let live_children = node
            .children()
            .iter()
            .filter(|child| self.nodes.contains_key(*child))
            .count();
        if live_children > 0 {
            log::warn!(
                "removing node {id} with {live_children} live children; they are now orphaned"
            );
        }
        Some(node)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DomNode> {
        self.nodes.values()
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
    }

    pub fn dump_tree(&self, root: Option<NodeId>) -> String {
        let mut output = String::new();
        if let Some(root_id) = root {
            self.dump_node(&mut output, root_id, 0);
        } else {
            output.push_str("(no root)\n");
        }
        output
    }

    fn dump_node(&self, output: &mut String, id: NodeId, depth: usize) {
        let indent = "  ".repeat(depth);
        if let Some(node) = self.nodes.get(&id) {
            let _ = writeln!(output, "{indent}[{id}] {}", node.tag_name());
            for &child_id in node.children() {
                self.dump_node(output, child_id, depth + 1);
            }
        } else {
            let _ = writeln!(output, "{indent}[{id}] (missing)");
        }
    }
}

#[cfg(test)]
#[path = "tests/registry_tests.rs"]
mod tests;
