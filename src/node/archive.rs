use std::{fs, io, path::Path};

use bincode::{decode_from_slice, encode_to_vec};

use super::ResourceNode;
use crate::{
    err::{Error, Result},
    util::{create_bincode_config, create_decode_config},
};

/// Reader/writer for one on-disk resource container format.
pub trait ResourceFormat {
    fn open(&self, path: &Path) -> Result<ResourceNode>;

    fn save(&self, root: &ResourceNode, path: &Path) -> Result<()>;

    /// Releases a tree returned by [`ResourceFormat::open`].
    fn close(&self, root: ResourceNode) {
        drop(root);
    }
}

/// Generic container: a magic header followed by the bincode-encoded tree.
#[derive(Debug, Default, Clone, Copy)]
pub struct ArchiveFormat;

impl ArchiveFormat {
    pub const MAGIC: &'static [u8; 5] = b"RTREE";
    pub const VERSION: u8 = 1;

    pub fn to_bytes(&self, root: &ResourceNode) -> Result<Vec<u8>> {
        let body = encode_to_vec(root, create_bincode_config())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
        let mut bytes = Vec::with_capacity(Self::MAGIC.len() + 1 + body.len());
        bytes.extend_from_slice(Self::MAGIC);
        bytes.push(Self::VERSION);
        bytes.extend_from_slice(&body);
        Ok(bytes)
    }

    pub fn from_bytes(&self, bytes: &[u8]) -> Result<ResourceNode> {
        let body = bytes
            .strip_prefix(Self::MAGIC.as_slice())
            .ok_or_else(|| Error::UnsupportedFormat("missing archive magic".to_string()))?;
        let (version, body) = body
            .split_first()
            .ok_or_else(|| Error::UnsupportedFormat("truncated archive header".to_string()))?;
        if *version != Self::VERSION {
            return Err(Error::UnsupportedFormat(format!(
                "archive version {} (expected {})",
                version,
                Self::VERSION
            )));
        }
        let (root, read): (ResourceNode, usize) =
            decode_from_slice(body, create_decode_config())
                .map_err(|e| Error::UnsupportedFormat(e.to_string()))?;
        if read != body.len() {
            return Err(Error::UnsupportedFormat(format!(
                "{} trailing bytes after archive body",
                body.len() - read
            )));
        }
        Ok(root)
    }
}

impl ResourceFormat for ArchiveFormat {
    fn open(&self, path: &Path) -> Result<ResourceNode> {
        log::debug!("opening resource archive {:?}", path);
        let bytes = fs::read(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::FileNotFound(path.to_path_buf()),
            _ => Error::Io(e),
        })?;
        self.from_bytes(&bytes)
    }

    fn save(&self, root: &ResourceNode, path: &Path) -> Result<()> {
        log::debug!("saving resource archive {:?}", path);
        fs::write(path, self.to_bytes(root)?)?;
        Ok(())
    }
}
