//! Key-value stores backing [`KeyValueResource`](crate::KeyValueResource).

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock, PoisonError};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use coffer_config::{ResolvedConfig, ResolvedStorage, StorageBackend};
use coffer_types::ResourceError;
use coffer_utils::{
    AtomicWriteOptions, PersistMode, atomic_write_with_options, ensure_private_dir,
    recover_bak_file,
};

use crate::file::read_bytes;

static DEFAULT_STORE: OnceLock<Box<dyn KeyValueStore>> = OnceLock::new();

/// Byte values addressed by string keys.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, ResourceError>;

    fn set(&self, key: &str, value: Vec<u8>) -> Result<(), ResourceError>;

    /// Removing an absent key succeeds.
    fn remove(&self, key: &str) -> Result<(), ResourceError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, ResourceError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: Vec<u8>) -> Result<(), ResourceError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), ResourceError> {
        (**self).remove(key)
    }
}

/// Process-wide store used by resources that don't pick their own.
///
/// Built from default configuration unless [`install_default_store`] ran
/// first.
pub fn default_store() -> &'static dyn KeyValueStore {
    DEFAULT_STORE
        .get_or_init(|| store_from_config(&ResolvedConfig::default().storage))
        .as_ref()
}

/// Fails (returning the argument) once [`default_store`] has been initialized.
pub fn install_default_store(
    store: Box<dyn KeyValueStore>,
) -> Result<(), Box<dyn KeyValueStore>> {
    DEFAULT_STORE.set(store)
}

/// Whether [`default_store`] is already fixed for this process.
pub fn default_store_installed() -> bool {
    DEFAULT_STORE.get().is_some()
}

/// A [`FileStore`] at the configured path, or a [`MemoryStore`] when the
/// backend is `memory`, no path is known, or the file cannot be opened.
#[must_use]
pub fn store_from_config(storage: &ResolvedStorage) -> Box<dyn KeyValueStore> {
    match (storage.backend, storage.defaults_path.as_deref()) {
        (StorageBackend::File, Some(path)) => match FileStore::open(path) {
            Ok(store) => Box::new(store),
            Err(e) => {
                tracing::warn!(path = %path.display(), "Falling back to in-memory store: {e}");
                Box::new(MemoryStore::new())
            }
        },
        (StorageBackend::File, None) => {
            tracing::warn!("No data directory for the defaults file, using in-memory store");
            Box::new(MemoryStore::new())
        }
        (StorageBackend::Memory, _) => Box::new(MemoryStore::new()),
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, ResourceError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: Vec<u8>) -> Result<(), ResourceError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ResourceError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// A JSON object of base64 values on disk, rewritten atomically after every
/// mutation.
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Load the document at `path`, or start empty when it does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ResourceError> {
        let path = path.into();
        recover_bak_file(&path);

        let entries = match read_bytes(&path) {
            Ok(bytes) if bytes.is_empty() => BTreeMap::new(),
            Ok(bytes) => {
                serde_json::from_slice(&bytes).map_err(ResourceError::JsonDecodingFailed)?
            }
            Err(ResourceError::FileNotFound { .. }) => BTreeMap::new(),
            Err(e) => return Err(e),
        };
        tracing::debug!(path = %path.display(), keys = entries.len(), "Opened file store");

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, key: &str, entries: &BTreeMap<String, String>) -> Result<(), ResourceError> {
        let failed = |source: Box<dyn std::error::Error + Send + Sync>| {
            tracing::warn!(path = %self.path.display(), key, "Failed to persist file store: {source}");
            ResourceError::StoreFailed {
                key: key.to_string(),
                source,
            }
        };

        let json = serde_json::to_vec_pretty(entries).map_err(|e| failed(Box::new(e)))?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            ensure_private_dir(parent).map_err(|e| failed(Box::new(e)))?;
        }
        let options = AtomicWriteOptions {
            mode: PersistMode::OwnerOnly,
            ..AtomicWriteOptions::default()
        };
        atomic_write_with_options(&self.path, &json, options).map_err(|e| failed(Box::new(e)))
    }
}

impl fmt::Debug for FileStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Values may be secrets; show only the key count.
        let len = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        f.debug_struct("FileStore")
            .field("path", &self.path)
            .field("keys", &len)
            .finish()
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, ResourceError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(key)
            .map(|encoded| {
                STANDARD.decode(encoded).map_err(|e| ResourceError::StoreFailed {
                    key: key.to_string(),
                    source: Box::new(e),
                })
            })
            .transpose()
    }

    fn set(&self, key: &str, value: Vec<u8>) -> Result<(), ResourceError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = entries.insert(key.to_string(), STANDARD.encode(value));
        if let Err(e) = self.persist(key, &entries) {
            match previous {
                Some(old) => entries.insert(key.to_string(), old),
                None => entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ResourceError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(previous) = entries.remove(key) else {
            return Ok(());
        };
        if let Err(e) = self.persist(key, &entries) {
            entries.insert(key.to_string(), previous);
            return Err(e);
        }
        Ok(())
    }
}
