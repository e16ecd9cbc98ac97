use std::{io, path::PathBuf};

use crate::diff::NodePath;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Reported by a resource format when the file is not one it can read.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The patch file cannot be used at all; discard it.
    #[error("corrupt patch: {0}")]
    CorruptPatch(String),

    /// Apply-time mismatch between the patch and the target tree.
    #[error("target path missing: {0}")]
    TargetPathMissing(NodePath),

    #[error("no patch entry at {0}")]
    EntryNotFound(NodePath),

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    pub fn corrupt<E: ToString>(err: E) -> Self {
        Self::CorruptPatch(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
