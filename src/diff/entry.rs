use bincode::{Decode, Encode};
use similar::{Algorithm, DiffOp, capture_diff_slices};

use super::path::{NodePath, Segment};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Encode, Decode)]
pub enum DiffKind {
    /// Only in the new (right) tree.
    Added,
    /// Only in the old (left) tree.
    Removed,
    /// In both trees, payload differs.
    Modified,
    /// In both trees with identical payload; kept for structure only.
    Unchanged,
}

impl DiffKind {
    pub fn is_change(&self) -> bool {
        !matches!(self, DiffKind::Unchanged)
    }

    pub(crate) fn inverse(&self) -> Self {
        match self {
            DiffKind::Added => DiffKind::Removed,
            DiffKind::Removed => DiffKind::Added,
            DiffKind::Modified => DiffKind::Modified,
            DiffKind::Unchanged => DiffKind::Unchanged,
        }
    }
}

/// A changed byte range inside a modified payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadChange {
    pub old_idx: usize,
    pub old_len: usize,
    pub new_idx: usize,
    pub new_len: usize,
}

/// One node of a patch tree.
///
/// Payloads are owned copies, so a patch outlives the trees it was built
/// from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffEntry {
    pub(crate) path: NodePath,
    pub(crate) kind: DiffKind,
    pub(crate) enabled: bool,
    pub(crate) left: Option<Vec<u8>>,
    pub(crate) right: Option<Vec<u8>>,
    /// Added/removed entries only: the paired sibling this node follows on
    /// its own side, `None` when it comes first.
    pub(crate) anchor: Option<Segment>,
    pub(crate) children: Vec<DiffEntry>,
}

impl DiffEntry {
    pub fn path(&self) -> &NodePath {
        &self.path
    }

    pub fn kind(&self) -> DiffKind {
        self.kind
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Payload of the old-tree node, if this entry has one.
    pub fn left_payload(&self) -> Option<&[u8]> {
        self.left.as_deref()
    }

    /// Payload of the new-tree node, if this entry has one.
    pub fn right_payload(&self) -> Option<&[u8]> {
        self.right.as_deref()
    }

    pub fn children(&self) -> &[DiffEntry] {
        &self.children
    }

    /// Sibling an added or removed node sits after, on its own side.
    pub fn anchor(&self) -> Option<&Segment> {
        self.anchor.as_ref()
    }

    pub fn name(&self) -> &str {
        self.segment().name()
    }

    pub(crate) fn segment(&self) -> &Segment {
        self.path
            .last()
            .expect("entry paths always hold at least the root segment")
    }

    pub(crate) fn child(&self, segment: &Segment) -> Option<&DiffEntry> {
        self.children.iter().find(|c| c.segment() == segment)
    }

    pub(crate) fn child_mut(&mut self, segment: &Segment) -> Option<&mut DiffEntry> {
        self.children.iter_mut().find(|c| c.segment() == segment)
    }

    /// Pre-order walk over this entry and its descendants.
    pub fn iter(&self) -> Iter<'_> {
        Iter { stack: vec![self] }
    }

    /// Whether any entry in this subtree, `self` included, is a change.
    pub fn has_changes(&self) -> bool {
        self.kind.is_change() || self.children.iter().any(|c| c.has_changes())
    }

    /// Whether this entry and every descendant are enabled.
    pub fn is_fully_enabled(&self) -> bool {
        self.enabled && self.children.iter().all(|c| c.is_fully_enabled())
    }

    /// Whether applying this subtree would mutate anything.
    pub fn has_enabled_changes(&self) -> bool {
        self.enabled
            && (self.kind.is_change() || self.children.iter().any(|c| c.has_enabled_changes()))
    }

    /// Byte ranges that differ between the two payloads of a modified entry.
    pub fn payload_delta(&self) -> Vec<PayloadChange> {
        let (Some(old), Some(new)) = (&self.left, &self.right) else {
            return Vec::new();
        };
        capture_diff_slices(Algorithm::Myers, old, new)
            .iter()
            .filter_map(|op| match *op {
                DiffOp::Equal { .. } => None,
                DiffOp::Insert {
                    old_index,
                    new_index,
                    new_len,
                } => Some(PayloadChange {
                    old_idx: old_index,
                    old_len: 0,
                    new_idx: new_index,
                    new_len,
                }),
                DiffOp::Delete {
                    old_index,
                    old_len,
                    new_index,
                } => Some(PayloadChange {
                    old_idx: old_index,
                    old_len,
                    new_idx: new_index,
                    new_len: 0,
                }),
                DiffOp::Replace {
                    old_index,
                    old_len,
                    new_index,
                    new_len,
                } => Some(PayloadChange {
                    old_idx: old_index,
                    old_len,
                    new_idx: new_index,
                    new_len,
                }),
            })
            .collect()
    }

    fn invert(&self) -> Self {
        Self {
            path: self.path.clone(),
            kind: self.kind.inverse(),
            enabled: self.enabled,
            left: self.right.clone(),
            right: self.left.clone(),
            anchor: self.anchor.clone(),
            children: self.children.iter().map(|c| c.invert()).collect(),
        }
    }
}

/// Entry counts of a patch, by kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchStats {
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
    pub unchanged: usize,
    pub enabled_changes: usize,
}

/// A full set of differences between two resource trees.
///
/// Entries are owned parent-to-child only and are addressed by
/// [`NodePath`] from the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchTree {
    pub(crate) root: DiffEntry,
}

impl PatchTree {
    pub fn root(&self) -> &DiffEntry {
        &self.root
    }

    pub fn entry(&self, path: &NodePath) -> Option<&DiffEntry> {
        let (first, rest) = path.segments().split_first()?;
        if first != self.root.segment() {
            return None;
        }
        rest.iter()
            .try_fold(&self.root, |entry, segment| entry.child(segment))
    }

    pub(crate) fn entry_mut(&mut self, path: &NodePath) -> Option<&mut DiffEntry> {
        let (first, rest) = path.segments().split_first()?;
        if first != self.root.segment() {
            return None;
        }
        let mut entry = &mut self.root;
        for segment in rest {
            entry = entry.child_mut(segment)?;
        }
        Some(entry)
    }

    /// Pre-order walk over every entry.
    pub fn iter(&self) -> Iter<'_> {
        self.root.iter()
    }

    pub fn stats(&self) -> PatchStats {
        let mut stats = PatchStats::default();
        for entry in self.iter() {
            match entry.kind {
                DiffKind::Added => stats.added += 1,
                DiffKind::Removed => stats.removed += 1,
                DiffKind::Modified => stats.modified += 1,
                DiffKind::Unchanged => stats.unchanged += 1,
            }
            if entry.kind.is_change() && entry.enabled {
                stats.enabled_changes += 1;
            }
        }
        stats
    }

    /// The patch that undoes this one: added and removed swap, and modified
    /// entries swap their payloads. Enable flags carry over.
    pub fn invert(&self) -> Self {
        Self {
            root: self.root.invert(),
        }
    }
}

pub struct Iter<'a> {
    stack: Vec<&'a DiffEntry>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a DiffEntry;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.stack.pop()?;
        self.stack.extend(entry.children.iter().rev());
        Some(entry)
    }
}
