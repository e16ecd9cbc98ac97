use super::{
    entry::{DiffEntry, PatchTree},
    path::NodePath,
};
use crate::err::{Error, Result};

impl PatchTree {
    /// Toggles the entry at `path`.
    ///
    /// Disabling cascades down: every descendant is disabled too. Enabling
    /// cascades up: every ancestor is enabled, descendants are left as they
    /// are. Nothing is touched when `path` does not name an entry.
    pub fn set_enabled(&mut self, path: &NodePath, enabled: bool) -> Result<()> {
        if self.entry(path).is_none() {
            return Err(Error::EntryNotFound(path.clone()));
        }
        log::debug!("set_enabled({}, {})", path, enabled);
        if enabled {
            self.enable_path(path);
        } else if let Some(entry) = self.entry_mut(path) {
            disable_subtree(entry);
        }
        Ok(())
    }

    fn enable_path(&mut self, path: &NodePath) {
        let mut entry = &mut self.root;
        entry.enabled = true;
        for segment in &path.segments()[1..] {
            match entry.child_mut(segment) {
                Some(child) => {
                    child.enabled = true;
                    entry = child;
                }
                None => return,
            }
        }
    }

    /// Sets every entry in the patch at once.
    pub fn set_all_enabled(&mut self, enabled: bool) {
        if enabled {
            enable_subtree(&mut self.root);
        } else {
            disable_subtree(&mut self.root);
        }
    }
}

fn disable_subtree(entry: &mut DiffEntry) {
    entry.enabled = false;
    entry.children.iter_mut().for_each(disable_subtree);
}

fn enable_subtree(entry: &mut DiffEntry) {
    entry.enabled = true;
    entry.children.iter_mut().for_each(enable_subtree);
}

#[cfg(test)]
mod tests {
    use rand::{Rng, SeedableRng, rngs::StdRng, seq::IndexedRandom};

    use super::*;
    use crate::{
        node::ResourceNode,
        util::test::{create_test_tree, mutate_tree},
    };

    fn sample() -> PatchTree {
        let left = ResourceNode::new("root", []).with_child(
            ResourceNode::new("a", [1])
                .with_child(ResourceNode::new("b", [2]).with_child(ResourceNode::new("c", [3])))
                .with_child(ResourceNode::new("d", [4])),
        );
        let right = ResourceNode::new("root", []).with_child(
            ResourceNode::new("a", [9])
                .with_child(ResourceNode::new("b", [8]).with_child(ResourceNode::new("c", [7])))
                .with_child(ResourceNode::new("d", [6])),
        );
        PatchTree::from_compare(&left, &right)
    }

    fn enabled(patch: &PatchTree, path: &str) -> bool {
        patch.entry(&path.parse().unwrap()).unwrap().is_enabled()
    }

    fn assert_ancestor_invariant(entry: &DiffEntry) {
        for child in entry.children() {
            if child.is_enabled() {
                assert!(
                    entry.is_enabled(),
                    "{} enabled under disabled {}",
                    child.path(),
                    entry.path()
                );
            }
            assert_ancestor_invariant(child);
        }
    }

    #[test]
    fn test_disable_cascades_down() {
        let mut patch = sample();
        patch.set_enabled(&"root/a/b".parse().unwrap(), false).unwrap();
        assert!(!enabled(&patch, "root/a/b"));
        assert!(!enabled(&patch, "root/a/b/c"));
        assert!(enabled(&patch, "root/a"));
        assert!(enabled(&patch, "root/a/d"));
        assert!(enabled(&patch, "root"));
    }

    #[test]
    fn test_enable_cascades_up_only() {
        let mut patch = sample();
        patch.set_enabled(&"root/a".parse().unwrap(), false).unwrap();
        assert!(!enabled(&patch, "root/a/d"));

        patch.set_enabled(&"root/a/b/c".parse().unwrap(), true).unwrap();
        assert!(enabled(&patch, "root/a/b/c"));
        assert!(enabled(&patch, "root/a/b"));
        assert!(enabled(&patch, "root/a"));
        assert!(enabled(&patch, "root"));
        // siblings of the enabled path stay disabled
        assert!(!enabled(&patch, "root/a/d"));

        patch.set_enabled(&"root/a".parse().unwrap(), true).unwrap();
        assert!(!enabled(&patch, "root/a/d"));
    }

    #[test]
    fn test_unknown_path() {
        let mut patch = sample();
        let before = patch.clone();
        let path: NodePath = "root/a/zzz".parse().unwrap();
        match patch.set_enabled(&path, true) {
            Err(Error::EntryNotFound(p)) => assert_eq!(p, path),
            other => panic!("expected EntryNotFound, got {:?}", other),
        }
        assert_eq!(patch, before);
    }

    #[test]
    fn test_set_all() {
        let mut patch = sample();
        patch.set_all_enabled(false);
        assert!(patch.iter().all(|e| !e.is_enabled()));
        patch.set_all_enabled(true);
        assert!(patch.iter().all(|e| e.is_enabled()));
    }

    #[test]
    fn test_random_toggles_keep_invariant() {
        let mut rng = StdRng::seed_from_u64(1919810);
        for seed in 0..20 {
            let left = create_test_tree(seed);
            let right = mutate_tree(&left, &mut rng);
            let mut patch = PatchTree::from_compare(&left, &right);
            assert_ancestor_invariant(patch.root());
            let paths: Vec<_> = patch.iter().map(|e| e.path().clone()).collect();
            for _ in 0..50 {
                let path = paths.choose(&mut rng).unwrap();
                let value = rng.random_bool(0.5);
                patch.set_enabled(path, value).unwrap();
                let entry = patch.entry(path).unwrap();
                assert_eq!(entry.is_enabled(), value);
                if !value {
                    assert!(patch.entry(path).unwrap().iter().all(|e| !e.is_enabled()));
                }
                assert_ancestor_invariant(patch.root());
            }
        }
    }
}
