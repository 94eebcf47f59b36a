//! Read-only assets shipped next to the executable.

use std::env;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use coffer_types::{ResourceDecoder, ResourceError};

use crate::file::read_bytes;
use crate::sandbox::validate_relative;

/// A directory of read-only assets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    root: PathBuf,
}

impl Bundle {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory containing the running executable, or the working
    /// directory when that cannot be determined.
    pub fn main() -> &'static Bundle {
        static MAIN: OnceLock<Bundle> = OnceLock::new();
        MAIN.get_or_init(|| {
            let root = env::current_exe()
                .ok()
                .and_then(|exe| exe.parent().map(Path::to_path_buf))
                .unwrap_or_else(|| {
                    tracing::warn!("Executable directory unknown, main bundle uses working directory");
                    PathBuf::from(".")
                });
            Bundle::new(root)
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, file_name: &str) -> Result<PathBuf, ResourceError> {
        let relative = Path::new(file_name);
        validate_relative(relative)?;
        Ok(self.root.join(relative))
    }
}

/// A typed, read-only file inside a [`Bundle`].
pub trait BundleResource {
    type Decoder: ResourceDecoder + Default;

    fn decoder(&self) -> Self::Decoder {
        Self::Decoder::default()
    }

    fn bundle(&self) -> &Bundle {
        Bundle::main()
    }

    /// File name, optionally with subdirectories, relative to the bundle root.
    fn file_name(&self) -> &str;

    fn read(&self) -> Result<<Self::Decoder as ResourceDecoder>::Content, ResourceError> {
        let path = self.bundle().path_for(self.file_name())?;
        let bytes = read_bytes(&path)?;
        self.decoder().decode(&bytes)
    }
}
