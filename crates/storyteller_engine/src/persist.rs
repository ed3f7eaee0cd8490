use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error("cannot create files in {}: {source}", .path.display())]
    Unwritable { path: PathBuf, source: io::Error },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("manifest encoding failed: {0}")]
    Manifest(#[from] serde_json::Error),
}

/// Directory receiving exported artifacts.
///
/// Every write goes through a temp file in the same directory followed by a
/// rename, so an existing export is either kept or fully replaced.
#[derive(Debug)]
pub struct ArtifactDir {
    root: PathBuf,
}

impl ArtifactDir {
    /// Create `root` if needed and check that files can be created in it.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, PersistError> {
        let root = root.into();
        if root.exists() && !root.is_dir() {
            return Err(PersistError::NotADirectory(root));
        }
        let probe = fs::create_dir_all(&root).and_then(|()| NamedTempFile::new_in(&root));
        if let Err(source) = probe {
            return Err(PersistError::Unwritable { path: root, source });
        }
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn write_bytes(&self, name: &str, bytes: &[u8]) -> Result<PathBuf, PersistError> {
        let target = self.root.join(name);
        let mut staged = NamedTempFile::new_in(&self.root)?;
        staged.write_all(bytes)?;
        staged.as_file().sync_all()?;
        staged.persist(&target).map_err(|err| PersistError::Io(err.error))?;
        Ok(target)
    }

    pub fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<PathBuf, PersistError> {
        let encoded = serde_json::to_vec_pretty(value)?;
        self.write_bytes(name, &encoded)
    }
}
