//! Resources stored as a single file on disk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use coffer_types::{ResourceCoder, ResourceDecoder, ResourceEncoder, ResourceError};
use coffer_utils::{AtomicWriteOptions, atomic_write_with_options};

/// A typed value persisted at a file path.
///
/// Implementors provide [`path`](Self::path); reading, writing and removal
/// come for free.
pub trait FileResource {
    type Content;
    type Coder: ResourceCoder<Self::Content> + Default;

    fn coder(&self) -> Self::Coder {
        Self::Coder::default()
    }

    fn path(&self) -> Result<PathBuf, ResourceError>;

    fn read(&self) -> Result<Self::Content, ResourceError> {
        let path = self.path()?;
        let bytes = read_bytes(&path)?;
        self.coder().decode(&bytes)
    }

    /// Encode and persist atomically, creating parent directories.
    ///
    /// A coder that produces no body writes an empty file.
    fn write(&self, content: &Self::Content) -> Result<(), ResourceError> {
        let path = self.path()?;
        let bytes = self.coder().encode(content)?.unwrap_or_default();
        write_bytes(&path, &bytes)
    }

    /// Delete the file. Removing a file that does not exist succeeds.
    fn remove(&self) -> Result<(), ResourceError> {
        let path = self.path()?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(ResourceError::CannotWriteFile { path, source }),
        }
    }

    fn exists(&self) -> Result<bool, ResourceError> {
        Ok(self.path()?.is_file())
    }
}

pub(crate) fn read_bytes(path: &Path) -> Result<Vec<u8>, ResourceError> {
    fs::read(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            ResourceError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            ResourceError::CannotReadFile {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}

pub(crate) fn write_bytes(path: &Path, bytes: &[u8]) -> Result<(), ResourceError> {
    atomic_write_with_options(path, bytes, AtomicWriteOptions::default()).map_err(|source| {
        tracing::warn!(path = %path.display(), "Failed to write resource: {source}");
        ResourceError::CannotWriteFile {
            path: path.to_path_buf(),
            source,
        }
    })
}
