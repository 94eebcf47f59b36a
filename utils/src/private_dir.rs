//! Owner-only directories for data that should not be world-readable.

use std::fs;
use std::io;
use std::path::Path;

/// Create `dir` (and its parents) and, on Unix, drop group/other access if the
/// current user owns it.
///
/// Directories owned by someone else are left untouched.
pub fn ensure_private_dir(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::{MetadataExt, PermissionsExt};
        let metadata = fs::metadata(dir)?;
        // SAFETY: getuid has no preconditions and cannot fail.
        let our_uid = unsafe { libc::getuid() };
        if metadata.uid() == our_uid {
            let mode = metadata.permissions().mode() & 0o777;
            if mode & 0o077 != 0 {
                fs::set_permissions(dir, fs::Permissions::from_mode(0o700))?;
                tracing::debug!(path = %dir.display(), "Restricted directory to owner");
            }
        }
    }
    Ok(())
}
