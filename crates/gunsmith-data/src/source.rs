//! Resource stores that gun definitions are read from.

use std::collections::HashMap;
use std::io;
use std::path::{Component, Path, PathBuf};

/// A pull-based key-value store of resources addressed by relative paths
/// such as `cgm/guns/pistol.json`.
pub trait ResourceSource: Sync {
    /// Read the resource at `path`. `Ok(None)` means it does not exist.
    fn fetch(&self, path: &str) -> io::Result<Option<Vec<u8>>>;
}

/// Resources stored as files under a root directory.
///
/// Only plain relative paths are served; `..`, `.`, and absolute paths are
/// rejected with [`io::ErrorKind::InvalidInput`] so nothing outside the root
/// is read.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ResourceSource for DirectorySource {
    fn fetch(&self, path: &str) -> io::Result<Option<Vec<u8>>> {
        let relative = Path::new(path);
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("resource path {path} escapes the resource root"),
            ));
        }
        match std::fs::read(self.root.join(relative)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Resources held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, contents: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), contents.into());
    }

    /// Builder form of [`MemorySource::insert`].
    pub fn with(mut self, path: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        self.insert(path, contents);
        self
    }
}

impl ResourceSource for MemorySource {
    fn fetch(&self, path: &str) -> io::Result<Option<Vec<u8>>> {
        Ok(self.files.get(path).cloned())
    }
}
