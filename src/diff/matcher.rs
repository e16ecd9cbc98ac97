use std::collections::{HashMap, VecDeque};

use crate::node::ResourceNode;

/// A left/right child pairing. At least one side is always present.
pub type MatchedPair<'a> = (Option<&'a ResourceNode>, Option<&'a ResourceNode>);

/// Aligns two sibling lists by name.
///
/// Same-named children are paired in order of appearance, so the n-th `a`
/// on the left meets the n-th `a` on the right. Left children come first in
/// left order (unmatched ones paired with `None`), followed by the unmatched
/// right children in right order.
pub fn match_children<'a>(
    left: &'a [ResourceNode],
    right: &'a [ResourceNode],
) -> Vec<MatchedPair<'a>> {
    let mut candidates: HashMap<&str, VecDeque<usize>> = HashMap::new();
    for (i, node) in right.iter().enumerate() {
        candidates.entry(node.name()).or_default().push_back(i);
    }

    let mut taken = vec![false; right.len()];
    let mut pairs = Vec::with_capacity(left.len().max(right.len()));
    for node in left {
        let hit = candidates
            .get_mut(node.name())
            .and_then(|queue| queue.pop_front());
        match hit {
            Some(i) => {
                taken[i] = true;
                pairs.push((Some(node), Some(&right[i])));
            }
            None => pairs.push((Some(node), None)),
        }
    }
    pairs.extend(
        right
            .iter()
            .zip(taken)
            .filter(|(_, taken)| !taken)
            .map(|(node, _)| (None, Some(node))),
    );
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nodes(names: &[&str]) -> Vec<ResourceNode> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| ResourceNode::new(*name, [i as u8]))
            .collect()
    }

    fn names(pairs: &[MatchedPair]) -> Vec<(Option<String>, Option<String>)> {
        pairs
            .iter()
            .map(|(l, r)| {
                (
                    l.map(|n| n.name().to_string()),
                    r.map(|n| n.name().to_string()),
                )
            })
            .collect()
    }

    fn s(name: &str) -> Option<String> {
        Some(name.to_string())
    }

    #[test]
    fn test_removed_matched_added() {
        let left = nodes(&["a", "b", "c"]);
        let right = nodes(&["b", "c", "d"]);
        let pairs = match_children(&left, &right);
        assert_eq!(
            names(&pairs),
            vec![
                (s("a"), None),
                (s("b"), s("b")),
                (s("c"), s("c")),
                (None, s("d")),
            ]
        );
    }

    #[test]
    fn test_reordered() {
        let left = nodes(&["a", "b", "c"]);
        let right = nodes(&["c", "a", "b"]);
        let pairs = match_children(&left, &right);
        assert_eq!(
            names(&pairs),
            vec![(s("a"), s("a")), (s("b"), s("b")), (s("c"), s("c"))]
        );
        // paired by name, not position
        assert_eq!(pairs[0].1.unwrap().payload(), [1]);
        assert_eq!(pairs[2].1.unwrap().payload(), [0]);
    }

    #[test]
    fn test_duplicates() {
        let left = nodes(&["x", "y", "x", "x"]);
        let right = nodes(&["x", "x", "z", "y", "y"]);
        let pairs = match_children(&left, &right);
        assert_eq!(
            names(&pairs),
            vec![
                (s("x"), s("x")),
                (s("y"), s("y")),
                (s("x"), s("x")),
                (s("x"), None),
                (None, s("z")),
                (None, s("y")),
            ]
        );
        // first left x meets first right x
        assert_eq!(pairs[0].0.unwrap().payload(), [0]);
        assert_eq!(pairs[0].1.unwrap().payload(), [0]);
        assert_eq!(pairs[2].0.unwrap().payload(), [2]);
        assert_eq!(pairs[2].1.unwrap().payload(), [1]);
        assert_eq!(pairs[5].1.unwrap().payload(), [4]);
    }

    #[test]
    fn test_empty_sides() {
        let some = nodes(&["a", "b"]);
        assert_eq!(
            names(&match_children(&some, &[])),
            vec![(s("a"), None), (s("b"), None)]
        );
        assert_eq!(
            names(&match_children(&[], &some)),
            vec![(None, s("a")), (None, s("b"))]
        );
        assert!(match_children(&[], &[]).is_empty());
    }
}
