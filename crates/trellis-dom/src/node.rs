//! Document nodes and the descriptors callers use to describe them.
//!
//! Nodes never hold references to each other. Parent and child links are
//! plain [`NodeId`]s resolved through the owning
//! [`DomNodeRegistry`](crate::DomNodeRegistry), so a removed node cannot be
//! reached through a stale link.

use crate::value::{DomValue, PropertyMap};

pub type NodeId = u32;

/// Caller supplied identifier of a document. The document's root node uses
/// the same value as its [`NodeId`].
pub type RootId = u32;

/// Position and size computed by a [`LayoutService`](crate::LayoutService).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayoutResult {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl LayoutResult {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

/// What the scripting bridge sends for each node in a create, update or
/// delete call.
///
/// For updates only `id` and `props` matter: `props` is a delta merged into
/// the existing bag. For deletes only `id` matters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeDescriptor {
    pub id: NodeId,
    /// `None` attaches the node under the document root.
    pub pid: Option<NodeId>,
    /// `None`, or an index past the end, appends.
    pub index: Option<usize>,
    pub tag_name: String,
    pub view_name: String,
    pub props: PropertyMap,
}

impl NodeDescriptor {
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    pub fn parent(mut self, pid: NodeId) -> Self {
        self.pid = Some(pid);
        self
    }

    pub fn index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub fn tag(mut self, tag_name: impl Into<String>) -> Self {
        self.tag_name = tag_name.into();
        self
    }

    pub fn view(mut self, view_name: impl Into<String>) -> Self {
        self.view_name = view_name.into();
        self
    }

    pub fn prop(mut self, key: impl Into<String>, value: impl Into<DomValue>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }

    pub fn props(mut self, props: PropertyMap) -> Self {
        self.props.extend(props);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DomNode {
    id: NodeId,
    pid: Option<NodeId>,
    tag_name: String,
    view_name: String,
    props: PropertyMap,
    children: Vec<NodeId>,
    layout: Option<LayoutResult>,
}

impl DomNode {
    pub fn new(id: NodeId, tag_name: impl Into<String>, view_name: impl Into<String>) -> Self {
        Self {
            id,
            pid: None,
            tag_name: tag_name.into(),
            view_name: view_name.into(),
            props: PropertyMap::default(),
            children: Vec::new(),
            layout: None,
        }
    }

    pub(crate) fn from_descriptor(descriptor: NodeDescriptor, pid: NodeId) -> Self {
        Self {
            id: descriptor.id,
            pid: Some(pid),
            tag_name: descriptor.tag_name,
            view_name: descriptor.view_name,
            props: descriptor.props,
            children: Vec::new(),
            layout: None,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Parent id; `None` for a document root and for a node whose parent was
    /// deleted.
    pub fn parent(&self) -> Option<NodeId> {
        self.pid
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    pub fn view_name(&self) -> &str {
        &self.view_name
    }

    pub fn props(&self) -> &PropertyMap {
        &self.props
    }

    pub fn prop(&self, key: &str) -> Option<&DomValue> {
        self.props.get(key)
    }

    pub fn layout(&self) -> Option<LayoutResult> {
        self.layout
    }

    pub fn index_of(&self, child: NodeId) -> Option<usize> {
        self.children.iter().position(|&id| id == child)
    }

    /// Splices `child` in at `index`, appending when the index is absent or
    /// past the end. Returns the position the child ended up at.
    pub(crate) fn insert_child(&mut self, child: NodeId, index: Option<usize>) -> usize {
        let len = self.children.len();
        let position = match index {
            Some(index) if index <= len => index,
            _ => len,
        };
        self.children.insert(position, child);
        position
    }

    pub(crate) fn detach_parent(&mut self) {
        self.pid = None;
    }

    pub(crate) fn remove_child(&mut self, child: NodeId) -> Option<usize> {
        let position = self.index_of(child)?;
        self.children.remove(position);
        Some(position)
    }

    /// Keys in `delta` overwrite, keys absent from it are left alone.
    pub(crate) fn merge_props(&mut self, delta: PropertyMap) {
        self.props.extend(delta);
    }

    pub(crate) fn set_layout(&mut self, layout: LayoutResult) {
        self.layout = Some(layout);
    }
}

#[cfg(test)]
#[path = "tests/node_tests.rs"]
mod tests;
