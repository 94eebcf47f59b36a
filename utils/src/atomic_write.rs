//! Atomic file write helpers.
//!
//! Bytes go to a temp file in the destination directory which is then renamed
//! over the target, so readers see either the old or the new content. Where
//! rename-over-existing fails (Windows), the old file is parked as `.bak` and
//! restored if the second attempt fails too.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PersistMode {
    /// Inherit the process umask.
    #[default]
    Default,
    /// Owner read/write only (0o600 on Unix, ignored elsewhere).
    OwnerOnly,
}

impl PersistMode {
    #[cfg(unix)]
    fn mode(self) -> Option<u32> {
        match self {
            Self::Default => None,
            Self::OwnerOnly => Some(0o600),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPolicy {
    /// `fsync` the file before the rename and the directory after it.
    Durable,
    /// Rely on the OS to flush eventually.
    Skip,
}

#[derive(Debug, Clone, Copy)]
pub struct AtomicWriteOptions {
    pub sync: SyncPolicy,
    pub mode: PersistMode,
    /// Create missing parent directories before writing.
    pub create_parents: bool,
}

impl Default for AtomicWriteOptions {
    fn default() -> Self {
        Self {
            sync: SyncPolicy::Durable,
            mode: PersistMode::Default,
            create_parents: true,
        }
    }
}

/// Restore `path` from `path.bak` left behind by an interrupted Windows
/// fallback write.
///
/// Returns `true` when a backup was moved back into place.
pub fn recover_bak_file(path: &Path) -> bool {
    let backup = backup_path(path);
    if path.exists() || !backup.exists() {
        return false;
    }
    match fs::rename(&backup, path) {
        Ok(()) => {
            tracing::warn!(
                path = %path.display(),
                "Recovered .bak file from interrupted atomic write"
            );
            true
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), "Failed to recover .bak file: {e}");
            false
        }
    }
}

pub fn atomic_write(path: impl AsRef<Path>, bytes: &[u8]) -> io::Result<()> {
    atomic_write_with_options(path, bytes, AtomicWriteOptions::default())
}

pub fn atomic_write_with_options(
    path: impl AsRef<Path>,
    bytes: &[u8],
    options: AtomicWriteOptions,
) -> io::Result<()> {
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if options.create_parents {
        fs::create_dir_all(parent)?;
    }

    let mut tmp = NamedTempFile::new_in(parent)?;
    #[cfg(unix)]
    if let Some(mode) = options.mode.mode() {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(tmp.path(), fs::Permissions::from_mode(mode))?;
    }

    tmp.write_all(bytes)?;
    if options.sync == SyncPolicy::Durable {
        tmp.as_file().sync_all()?;
    }

    if let Err(err) = tmp.persist(path) {
        if !path.exists() {
            return Err(err.error);
        }
        let backup = backup_path(path);
        let _ = fs::remove_file(&backup);
        fs::rename(path, &backup)?;

        if let Err(rename_err) = err.file.persist(path) {
            let _ = fs::rename(&backup, path);
            return Err(rename_err.error);
        }
        if let Err(e) = fs::remove_file(&backup) {
            tracing::warn!(
                path = %backup.display(),
                "Failed to remove .bak after atomic write: {e}"
            );
        }
    }

    if options.sync == SyncPolicy::Durable {
        best_effort_sync_dir(parent);
    }
    Ok(())
}

fn backup_path(path: &Path) -> std::path::PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".bak");
    path.with_file_name(name)
}

#[cfg(unix)]
fn best_effort_sync_dir(dir: &Path) {
    if let Err(e) = fs::File::open(dir).and_then(|d| d.sync_all()) {
        debug!(path = %dir.display(), "Directory sync_all failed (best-effort): {e}");
    }
}

#[cfg(not(unix))]
fn best_effort_sync_dir(dir: &Path) {
    debug!(path = %dir.display(), "Directory sync skipped on this platform");
}
