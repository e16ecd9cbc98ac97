//! In-memory resource-node trees.
//!
//! A resource tree is a hierarchy of named nodes, each holding an opaque
//! binary payload and an ordered list of children. Sibling names are not
//! required to be unique.

mod archive;

pub use archive::{ArchiveFormat, ResourceFormat};

use bincode::{Decode, Encode};

use crate::diff::Segment;

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct ResourceNode {
    name: String,
    payload: Vec<u8>,
    children: Vec<ResourceNode>,
}

impl ResourceNode {
    pub fn new(name: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            payload: payload.into(),
            children: Vec::new(),
        }
    }

    /// Builder-style append, mostly for constructing trees in code.
    pub fn with_child(mut self, child: ResourceNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn children(&self) -> &[ResourceNode] {
        &self.children
    }

    pub fn set_payload(&mut self, payload: impl Into<Vec<u8>>) {
        self.payload = payload.into();
    }

    /// Inserts `node` at `index`, or appends it when `index` is past the end.
    pub fn insert_child(&mut self, node: ResourceNode, index: usize) {
        let index = index.min(self.children.len());
        self.children.insert(index, node);
    }

    /// Removes the first child called `name`.
    pub fn remove_child(&mut self, name: &str) -> Option<ResourceNode> {
        let idx = self.children.iter().position(|c| c.name == name)?;
        Some(self.children.remove(idx))
    }

    pub fn child(&self, name: &str) -> Option<&ResourceNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Index of the child addressed by `segment`: the `ordinal`-th child
    /// carrying the segment's name.
    pub fn find_child(&self, segment: &Segment) -> Option<usize> {
        self.children
            .iter()
            .enumerate()
            .filter(|(_, c)| c.name == segment.name())
            .nth(segment.ordinal() as usize)
            .map(|(i, _)| i)
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<ResourceNode> {
        &mut self.children
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(|c| c.node_count()).sum::<usize>()
    }
}
