//! Patch file encoding.
//!
//! Layout: `MAGIC`, a format version byte, a compression magic byte, then the
//! compressed bincode body. The body lists every entry in pre-order; the
//! hierarchy is rebuilt from the paths on load.

use std::{collections::HashSet, fs, io, path::Path};

use bincode::{Decode, Encode, decode_from_slice, encode_to_vec};

use crate::{
    compress::CompressionType,
    diff::{DiffEntry, DiffKind, NodePath, PatchTree, Segment},
    err::{Error, Result},
    util::{create_bincode_config, create_decode_config},
};

pub const MAGIC: &[u8; 6] = b"RPATCH";
pub const FORMAT_VERSION: u8 = 1;

#[derive(Debug, Encode, Decode)]
struct EntryRecord {
    path: NodePath,
    kind: DiffKind,
    enabled: bool,
    left: Option<Vec<u8>>,
    right: Option<Vec<u8>>,
    anchor: Option<Segment>,
}

impl EntryRecord {
    fn from_entry(entry: &DiffEntry) -> Self {
        // unchanged entries never mutate anything, so their bytes stay behind
        let (left, right) = match entry.kind() {
            DiffKind::Added => (None, entry.right.clone()),
            DiffKind::Removed => (entry.left.clone(), None),
            DiffKind::Modified => (entry.left.clone(), entry.right.clone()),
            DiffKind::Unchanged => (None, None),
        };
        let anchor = match entry.kind() {
            DiffKind::Added | DiffKind::Removed => entry.anchor.clone(),
            _ => None,
        };
        Self {
            path: entry.path().clone(),
            kind: entry.kind(),
            enabled: entry.is_enabled(),
            left,
            right,
            anchor,
        }
    }

    fn into_entry(self) -> Result<DiffEntry> {
        let complete = match self.kind {
            DiffKind::Added => self.right.is_some(),
            DiffKind::Removed => self.left.is_some(),
            DiffKind::Modified => self.left.is_some() && self.right.is_some(),
            DiffKind::Unchanged => true,
        };
        if !complete {
            return Err(Error::CorruptPatch(format!(
                "{:?} entry {} is missing its payload",
                self.kind, self.path
            )));
        }
        Ok(DiffEntry {
            path: self.path,
            kind: self.kind,
            enabled: self.enabled,
            left: self.left,
            right: self.right,
            anchor: self.anchor,
            children: Vec::new(),
        })
    }
}

pub fn serialize(patch: &PatchTree, compression: CompressionType) -> Result<Vec<u8>> {
    let records: Vec<EntryRecord> = patch.iter().map(EntryRecord::from_entry).collect();
    log::debug!("serializing {} entries with {}", records.len(), compression);
    let body = encode_to_vec(&records, create_bincode_config())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
    let body = compression.compress_all(body)?;

    let mut bytes = Vec::with_capacity(MAGIC.len() + 2 + body.len());
    bytes.extend_from_slice(MAGIC);
    bytes.push(FORMAT_VERSION);
    bytes.push(compression.to_magic());
    bytes.extend_from_slice(&body);
    Ok(bytes)
}

pub fn deserialize(bytes: &[u8]) -> Result<PatchTree> {
    let rest = bytes
        .strip_prefix(MAGIC.as_slice())
        .ok_or_else(|| Error::corrupt("missing patch magic"))?;
    let [version, compression, body @ ..] = rest else {
        return Err(Error::corrupt("truncated patch header"));
    };
    if *version != FORMAT_VERSION {
        return Err(Error::CorruptPatch(format!(
            "unsupported patch version {}",
            version
        )));
    }
    let compression = CompressionType::from_magic(*compression).ok_or_else(|| {
        Error::CorruptPatch(format!("unknown compression magic {}", compression))
    })?;
    let body = compression.decompress_all(body).map_err(Error::corrupt)?;
    let (records, read): (Vec<EntryRecord>, usize) =
        decode_from_slice(&body, create_decode_config()).map_err(Error::corrupt)?;
    if read != body.len() {
        return Err(Error::CorruptPatch(format!(
            "{} trailing bytes after patch body",
            body.len() - read
        )));
    }
    log::debug!("deserialized {} entries ({})", records.len(), compression);
    rebuild(records)
}

/// Reassembles the entry hierarchy from pre-order records.
fn rebuild(records: Vec<EntryRecord>) -> Result<PatchTree> {
    let mut seen: HashSet<NodePath> = HashSet::with_capacity(records.len());
    // open ancestors of the record being placed, root first
    let mut stack: Vec<DiffEntry> = Vec::new();

    for record in records {
        let depth = record.path.depth();
        if depth == 0 {
            return Err(Error::corrupt("entry with an empty path"));
        }
        if stack.is_empty() && depth != 1 {
            return Err(Error::CorruptPatch(format!(
                "first entry {} is not a root",
                record.path
            )));
        }
        if !seen.insert(record.path.clone()) {
            return Err(Error::CorruptPatch(format!(
                "duplicate entry {}",
                record.path
            )));
        }
        while stack.len() >= depth {
            close_top(&mut stack).ok_or_else(|| {
                Error::CorruptPatch(format!("second root entry {}", record.path))
            })?;
        }
        if let Some(parent) = stack.last() {
            if Some(&parent.path) != record.path.parent().as_ref() {
                return Err(Error::CorruptPatch(format!(
                    "entry {} does not follow its parent",
                    record.path
                )));
            }
            if record.enabled && !parent.enabled {
                return Err(Error::CorruptPatch(format!(
                    "enabled entry {} under disabled parent",
                    record.path
                )));
            }
        }
        stack.push(record.into_entry()?);
    }

    while close_top(&mut stack).is_some() {}
    let root = stack.pop().ok_or_else(|| Error::corrupt("empty patch"))?;
    Ok(PatchTree { root })
}

/// Moves the top of the stack into its parent's children. `None` when the
/// top is the root, which is left in place.
fn close_top(stack: &mut Vec<DiffEntry>) -> Option<()> {
    if stack.len() < 2 {
        return None;
    }
    let entry = stack.pop()?;
    stack.last_mut()?.children.push(entry);
    Some(())
}

pub fn export_patch(patch: &PatchTree, path: &Path, compression: CompressionType) -> Result<()> {
    log::info!("writing patch file {:?}...", path);
    let bytes = serialize(patch, compression)?;
    fs::write(path, bytes)?;
    Ok(())
}

pub fn import_patch(path: &Path) -> Result<PatchTree> {
    log::info!("reading patch file {:?}...", path);
    let bytes = fs::read(path)?;
    deserialize(&bytes)
}
