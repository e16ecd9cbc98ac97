use std::collections::HashMap;

use super::{
    entry::{DiffEntry, DiffKind, PatchTree},
    matcher::match_children,
    path::{NodePath, Segment},
};
use crate::node::ResourceNode;

impl PatchTree {
    /// Compares two trees and records every difference, enabled.
    ///
    /// The roots are always paired with each other; the root entry takes the
    /// old root's name. Payloads are compared byte for byte.
    pub fn from_compare(left: &ResourceNode, right: &ResourceNode) -> Self {
        log::debug!("from_compare()...");
        let root = compare_pair(NodePath::root(left.name()), left, right);
        log::debug!("from_compare()...done");
        Self { root }
    }
}

fn compare_pair(path: NodePath, left: &ResourceNode, right: &ResourceNode) -> DiffEntry {
    let kind = if left.payload() == right.payload() {
        DiffKind::Unchanged
    } else {
        DiffKind::Modified
    };
    log::trace!("{:?} {}", kind, path);

    let removed_anchors = unpaired_anchors(left.children(), right.children());
    let added_anchors = unpaired_anchors(right.children(), left.children());
    let mut ordinals: HashMap<&str, u32> = HashMap::new();
    let mut next_segment = |name| {
        let ordinal = ordinals.entry(name).or_insert(0);
        let segment = Segment::new(name, *ordinal);
        *ordinal += 1;
        segment
    };
    let children: Vec<DiffEntry> = match_children(left.children(), right.children())
        .into_iter()
        .map(|pair| match pair {
            (Some(l), Some(r)) => compare_pair(path.child(next_segment(l.name())), l, r),
            (Some(l), None) => {
                let segment = next_segment(l.name());
                let anchor = removed_anchors.get(&segment).cloned().flatten();
                one_sided(path.child(segment), l, DiffKind::Removed, anchor)
            }
            (None, Some(r)) => {
                let segment = next_segment(r.name());
                let anchor = added_anchors.get(&segment).cloned().flatten();
                one_sided(path.child(segment), r, DiffKind::Added, anchor)
            }
            (None, None) => unreachable!("matcher never yields an empty pair"),
        })
        .collect();

    let enabled = match kind {
        DiffKind::Unchanged => children.iter().any(|c| c.has_changes()),
        _ => true,
    };
    DiffEntry {
        path,
        kind,
        enabled,
        left: Some(left.payload().to_vec()),
        right: Some(right.payload().to_vec()),
        anchor: None,
        children,
    }
}

/// For every child of `side` left without a partner in `other`, the segment
/// of the nearest paired sibling before it on `side` (`None` when it comes
/// first).
///
/// Pairing is positional per name, so the n-th `a` on one side is paired iff
/// the other side has more than n of them, and its segment ordinal is n.
fn unpaired_anchors(
    side: &[ResourceNode],
    other: &[ResourceNode],
) -> HashMap<Segment, Option<Segment>> {
    let mut other_counts: HashMap<&str, u32> = HashMap::new();
    for node in other {
        *other_counts.entry(node.name()).or_insert(0) += 1;
    }
    let mut seen: HashMap<&str, u32> = HashMap::new();
    let mut last_paired: Option<Segment> = None;
    let mut anchors = HashMap::new();
    for node in side {
        let ordinal = seen.entry(node.name()).or_insert(0);
        let segment = Segment::new(node.name(), *ordinal);
        *ordinal += 1;
        if segment.ordinal() < other_counts.get(node.name()).copied().unwrap_or(0) {
            last_paired = Some(segment);
        } else {
            anchors.insert(segment, last_paired.clone());
        }
    }
    anchors
}

/// Records `node` and its whole subtree as present on one side only.
fn one_sided(
    path: NodePath,
    node: &ResourceNode,
    kind: DiffKind,
    anchor: Option<Segment>,
) -> DiffEntry {
    log::trace!("{:?} {}", kind, path);
    let mut ordinals: HashMap<&str, u32> = HashMap::new();
    let mut previous: Option<Segment> = None;
    let children = node
        .children()
        .iter()
        .map(|child| {
            let ordinal = ordinals.entry(child.name()).or_insert(0);
            let segment = Segment::new(child.name(), *ordinal);
            *ordinal += 1;
            let anchor = previous.replace(segment.clone());
            one_sided(path.child(segment), child, kind, anchor)
        })
        .collect();
    let payload = Some(node.payload().to_vec());
    let (left, right) = match kind {
        DiffKind::Removed => (payload, None),
        _ => (None, payload),
    };
    DiffEntry {
        path,
        kind,
        enabled: true,
        left,
        right,
        anchor,
        children,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::test::{create_test_tree, mutate_tree};
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn test_icon_scenario() {
        let left = ResourceNode::new("root", []).with_child(ResourceNode::new("icon", [0x01]));
        let right = ResourceNode::new("root", [])
            .with_child(ResourceNode::new("icon", [0x02]))
            .with_child(ResourceNode::new("icon2", [0x03]));
        let patch = PatchTree::from_compare(&left, &right);
        let root = patch.root();
        assert_eq!(root.kind(), DiffKind::Unchanged);
        assert!(root.is_enabled());
        assert_eq!(root.children().len(), 2);

        let icon = &root.children()[0];
        assert_eq!(icon.path().to_string(), "root/icon");
        assert_eq!(icon.kind(), DiffKind::Modified);
        assert!(icon.is_enabled());
        assert_eq!(icon.left_payload(), Some(&[0x01u8][..]));
        assert_eq!(icon.right_payload(), Some(&[0x02u8][..]));

        let icon2 = &root.children()[1];
        assert_eq!(icon2.path().to_string(), "root/icon2");
        assert_eq!(icon2.kind(), DiffKind::Added);
        assert!(icon2.left_payload().is_none());
        assert_eq!(icon2.right_payload(), Some(&[0x03u8][..]));
    }

    #[test]
    fn test_self_compare_is_unchanged() {
        for seed in [114514, 1919810, 19260817] {
            let tree = create_test_tree(seed);
            let patch = PatchTree::from_compare(&tree, &tree);
            assert_eq!(patch.iter().count(), tree.node_count());
            for entry in patch.iter() {
                assert_eq!(entry.kind(), DiffKind::Unchanged, "{}", entry.path());
                assert!(!entry.is_enabled());
            }
        }
    }

    #[test]
    fn test_one_sided_subtrees() {
        let left = ResourceNode::new("root", []).with_child(
            ResourceNode::new("old", [1])
                .with_child(ResourceNode::new("leaf", [2]))
                .with_child(ResourceNode::new("leaf", [3])),
        );
        let right = ResourceNode::new("root", [])
            .with_child(ResourceNode::new("new", [4]).with_child(ResourceNode::new("leaf", [5])));
        let patch = PatchTree::from_compare(&left, &right);
        let kinds: Vec<_> = patch
            .iter()
            .map(|e| (e.path().to_string(), e.kind()))
            .collect();
        assert_eq!(
            kinds,
            [
                ("root".to_string(), DiffKind::Unchanged),
                ("root/old".to_string(), DiffKind::Removed),
                ("root/old/leaf".to_string(), DiffKind::Removed),
                ("root/old/leaf[1]".to_string(), DiffKind::Removed),
                ("root/new".to_string(), DiffKind::Added),
                ("root/new/leaf".to_string(), DiffKind::Added),
            ]
        );
        let removed = patch.entry(&"root/old/leaf[1]".parse().unwrap()).unwrap();
        assert_eq!(removed.left_payload(), Some(&[3u8][..]));
        assert!(removed.right_payload().is_none());
    }

    #[test]
    fn test_changed_descendant_under_unchanged_container() {
        let left = ResourceNode::new("root", [])
            .with_child(ResourceNode::new("box", [7]).with_child(ResourceNode::new("x", [1])));
        let right = ResourceNode::new("root", [])
            .with_child(ResourceNode::new("box", [7]).with_child(ResourceNode::new("x", [2])));
        let patch = PatchTree::from_compare(&left, &right);
        let container = patch.entry(&"root/box".parse().unwrap()).unwrap();
        assert_eq!(container.kind(), DiffKind::Unchanged);
        assert!(container.is_enabled());
        let x = patch.entry(&"root/box/x".parse().unwrap()).unwrap();
        assert_eq!(x.kind(), DiffKind::Modified);
    }

    #[test]
    fn test_duplicate_sibling_paths() {
        let left = ResourceNode::new("root", [])
            .with_child(ResourceNode::new("a", [1]))
            .with_child(ResourceNode::new("a", [2]));
        let right = ResourceNode::new("root", [])
            .with_child(ResourceNode::new("a", [1]))
            .with_child(ResourceNode::new("a", [3]))
            .with_child(ResourceNode::new("a", [4]));
        let patch = PatchTree::from_compare(&left, &right);
        let kinds: Vec<_> = patch
            .root()
            .children()
            .iter()
            .map(|e| (e.path().to_string(), e.kind()))
            .collect();
        assert_eq!(
            kinds,
            [
                ("root/a".to_string(), DiffKind::Unchanged),
                ("root/a[1]".to_string(), DiffKind::Modified),
                ("root/a[2]".to_string(), DiffKind::Added),
            ]
        );
    }

    #[test]
    fn test_one_sided_anchors() {
        let left = ResourceNode::new("root", [])
            .with_child(ResourceNode::new("gone", [0]))
            .with_child(ResourceNode::new("a", [1]))
            .with_child(ResourceNode::new("a", [2]))
            .with_child(ResourceNode::new("b", [3]));
        let right = ResourceNode::new("root", [])
            .with_child(ResourceNode::new("a", [1]))
            .with_child(ResourceNode::new("new", [4]).with_child(ResourceNode::new("x", [5])))
            .with_child(ResourceNode::new("a", [9]))
            .with_child(ResourceNode::new("a", [6]))
            .with_child(ResourceNode::new("b", [3]));
        let patch = PatchTree::from_compare(&left, &right);
        let anchor = |path: &str| {
            patch
                .entry(&path.parse().unwrap())
                .unwrap()
                .anchor()
                .map(|s| s.to_string())
        };
        assert_eq!(anchor("root/gone"), None);
        assert_eq!(anchor("root/new"), Some("a".to_string()));
        assert_eq!(anchor("root/new/x"), None);
        assert_eq!(anchor("root/a[2]"), Some("a[1]".to_string()));
        assert_eq!(anchor("root/a"), None);
    }

    #[test]
    fn test_paths_unique() {
        let mut rng = StdRng::seed_from_u64(114514);
        for seed in 0..20 {
            let left = create_test_tree(seed);
            let right = mutate_tree(&left, &mut rng);
            let patch = PatchTree::from_compare(&left, &right);
            let mut paths: Vec<_> = patch.iter().map(|e| e.path().clone()).collect();
            let total = paths.len();
            paths.sort();
            paths.dedup();
            assert_eq!(paths.len(), total);
        }
    }
}
