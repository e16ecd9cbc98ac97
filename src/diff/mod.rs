//! Structural diff of resource trees and selective patching.
//!
//! [`PatchTree::from_compare`] aligns two trees by name and records every
//! difference as a [`DiffEntry`]. Entries can be switched on and off with
//! [`PatchTree::set_enabled`] before [`PatchTree::patch`] applies the enabled
//! subset to a target tree.

mod apply;
mod builder;
mod cascade;
mod entry;
mod matcher;
mod path;

pub use apply::ApplySummary;
pub use entry::{DiffEntry, DiffKind, Iter, PatchStats, PatchTree, PayloadChange};
pub use matcher::{MatchedPair, match_children};
pub use path::{NodePath, Segment};
