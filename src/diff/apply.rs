use std::collections::BTreeMap;

use super::entry::{DiffEntry, DiffKind, PatchTree};
use crate::{
    err::{Error, Result},
    node::ResourceNode,
};

/// Node counts touched by one application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplySummary {
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
}

impl PatchTree {
    /// Applies every enabled change to `target`.
    ///
    /// Either the whole patch applies or `target` is left untouched. Applying
    /// the same patch twice is not idempotent: added nodes get inserted again.
    pub fn patch(&self, target: &mut ResourceNode) -> Result<ApplySummary> {
        log::debug!("patch()...");
        let mut staged = target.clone();
        let mut summary = ApplySummary::default();
        apply_entry(&self.root, &mut staged, &mut summary)?;
        *target = staged;
        log::debug!("patch()...done: {:?}", summary);
        Ok(summary)
    }

    /// Undoes this patch on a tree it was applied to.
    pub fn revert(&self, target: &mut ResourceNode) -> Result<ApplySummary> {
        self.invert().patch(target)
    }
}

/// Applies `entry`, which has already been resolved to `node`.
fn apply_entry(
    entry: &DiffEntry,
    node: &mut ResourceNode,
    summary: &mut ApplySummary,
) -> Result<()> {
    if !entry.enabled {
        return Ok(());
    }
    if entry.kind == DiffKind::Modified {
        let payload = entry
            .right
            .as_ref()
            .ok_or_else(|| Error::corrupt(format!("{} has no new payload", entry.path)))?;
        log::trace!("modify {}", entry.path);
        node.set_payload(payload.clone());
        summary.modified += 1;
    }
    apply_children(entry, node, summary)
}

/// Applies the children of `entry` to the children of `node`.
///
/// Existing children are located before anything moves, so removals and
/// insertions at this level cannot shift the nodes other entries refer to.
fn apply_children(
    entry: &DiffEntry,
    node: &mut ResourceNode,
    summary: &mut ApplySummary,
) -> Result<()> {
    let mut removals = vec![false; node.children().len()];
    // keyed by the index of the existing child they follow, `None` = front
    let mut insertions: BTreeMap<Option<usize>, Vec<ResourceNode>> = BTreeMap::new();
    // last existing child seen in patch order
    let mut preceding: Option<usize> = None;

    for child in &entry.children {
        let found = match child.kind {
            DiffKind::Added => None,
            _ => node.find_child(child.segment()),
        };
        if found.is_some() {
            preceding = found;
        }
        if !child.enabled {
            continue;
        }
        match child.kind {
            DiffKind::Added => {
                let at = match &child.anchor {
                    Some(segment) => node.find_child(segment).or(preceding),
                    None => None,
                };
                let inserted = materialize(child)?;
                log::trace!("insert {}", child.path);
                summary.added += inserted.node_count();
                insertions.entry(at).or_default().push(inserted);
            }
            DiffKind::Removed => {
                let Some(idx) = found else {
                    log::trace!("{} already absent", child.path);
                    continue;
                };
                if child.is_fully_enabled() {
                    log::trace!("remove {}", child.path);
                    summary.removed += node.children()[idx].node_count();
                    removals[idx] = true;
                } else {
                    // keep the node, drop only what is still selected below it
                    apply_children(child, &mut node.children_mut()[idx], summary)?;
                }
            }
            DiffKind::Modified => {
                let idx = found.ok_or_else(|| Error::TargetPathMissing(child.path.clone()))?;
                apply_entry(child, &mut node.children_mut()[idx], summary)?;
            }
            DiffKind::Unchanged => match found {
                Some(idx) => apply_entry(child, &mut node.children_mut()[idx], summary)?,
                None if child.has_enabled_changes() => {
                    return Err(Error::TargetPathMissing(child.path.clone()));
                }
                None => {}
            },
        }
    }

    if removals.iter().any(|r| *r) || !insertions.is_empty() {
        let old = std::mem::take(node.children_mut());
        let mut rebuilt = Vec::with_capacity(old.len());
        rebuilt.extend(insertions.remove(&None).unwrap_or_default());
        for (i, (child, removed)) in old.into_iter().zip(removals).enumerate() {
            if !removed {
                rebuilt.push(child);
            }
            rebuilt.extend(insertions.remove(&Some(i)).unwrap_or_default());
        }
        *node.children_mut() = rebuilt;
    }
    Ok(())
}

/// Builds the node an added entry stands for, keeping only the enabled
/// added entries beneath it.
fn materialize(entry: &DiffEntry) -> Result<ResourceNode> {
    let payload = entry
        .right
        .as_ref()
        .ok_or_else(|| Error::corrupt(format!("{} has no new payload", entry.path)))?;
    let mut node = ResourceNode::new(entry.name(), payload.clone());
    for child in &entry.children {
        if child.enabled && child.kind == DiffKind::Added {
            node.children_mut().push(materialize(child)?);
        }
    }
    Ok(node)
}
