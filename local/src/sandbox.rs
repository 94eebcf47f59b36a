//! Per-application storage roots and resources addressed relative to them.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

use coffer_config::{ResolvedConfig, ResolvedSandbox};
use coffer_types::{ResourceCoder, ResourceError};

use crate::file::FileResource;

static GLOBAL: OnceLock<Sandbox> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SandboxLocation {
    /// Data that can be regenerated and may be purged by the OS.
    Caches,
    /// User-visible documents.
    Documents,
}

impl SandboxLocation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Caches => "caches",
            Self::Documents => "documents",
        }
    }
}

impl fmt::Display for SandboxLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved roots for every [`SandboxLocation`].
///
/// A root is `None` when the platform has no such directory and none was
/// configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sandbox {
    caches: Option<PathBuf>,
    documents: Option<PathBuf>,
}

impl Sandbox {
    /// Platform directories joined with `app_name`.
    #[must_use]
    pub fn new(app_name: &str) -> Self {
        Self {
            caches: dirs::cache_dir().map(|d| d.join(app_name)),
            documents: dirs::document_dir().map(|d| d.join(app_name)),
        }
    }

    /// Explicit roots, used as given.
    #[must_use]
    pub fn with_roots(caches: impl Into<PathBuf>, documents: impl Into<PathBuf>) -> Self {
        Self {
            caches: Some(caches.into()),
            documents: Some(documents.into()),
        }
    }

    /// Configured overrides win; anything unset falls back to [`Sandbox::new`].
    #[must_use]
    pub fn from_config(config: &ResolvedSandbox) -> Self {
        let platform = Self::new(&config.app_name);
        Self {
            caches: config.caches_dir.clone().or(platform.caches),
            documents: config.documents_dir.clone().or(platform.documents),
        }
    }

    /// Process-wide sandbox. Built from default configuration unless
    /// [`Sandbox::install`] ran first.
    pub fn global() -> &'static Sandbox {
        GLOBAL.get_or_init(|| Self::from_config(&ResolvedConfig::default().sandbox))
    }

    /// Set the process-wide sandbox. Fails (returning the argument) once
    /// [`Sandbox::global`] has been initialized.
    pub fn install(sandbox: Sandbox) -> Result<(), Sandbox> {
        GLOBAL.set(sandbox)
    }

    pub fn is_installed() -> bool {
        GLOBAL.get().is_some()
    }

    pub fn root(&self, location: SandboxLocation) -> Result<&Path, ResourceError> {
        let root = match location {
            SandboxLocation::Caches => self.caches.as_deref(),
            SandboxLocation::Documents => self.documents.as_deref(),
        };
        root.ok_or(ResourceError::SandboxLocationUnavailable {
            location: location.as_str(),
        })
    }

    /// `root(location) / relative`, refusing paths that could leave the root.
    pub fn resolve(
        &self,
        location: SandboxLocation,
        relative: &Path,
    ) -> Result<PathBuf, ResourceError> {
        validate_relative(relative)?;
        Ok(self.root(location)?.join(relative))
    }
}

pub(crate) fn validate_relative(relative: &Path) -> Result<(), ResourceError> {
    let invalid = |reason| ResourceError::InvalidPath {
        path: relative.to_path_buf(),
        reason,
    };
    if relative.as_os_str().is_empty() {
        return Err(invalid("path is empty"));
    }
    for component in relative.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => return Err(invalid("path contains `..`")),
            Component::RootDir | Component::Prefix(_) => {
                return Err(invalid("path must be relative"));
            }
        }
    }
    Ok(())
}

/// A file resource addressed by a [`SandboxLocation`] and a relative path.
///
/// Every implementor is also a [`FileResource`].
pub trait SandboxResource {
    type Content;
    type Coder: ResourceCoder<Self::Content> + Default;

    fn coder(&self) -> Self::Coder {
        Self::Coder::default()
    }

    fn location(&self) -> SandboxLocation;

    fn relative_path(&self) -> &Path;

    fn sandbox(&self) -> &Sandbox {
        Sandbox::global()
    }
}

impl<T: SandboxResource> FileResource for T {
    type Content = <T as SandboxResource>::Content;
    type Coder = <T as SandboxResource>::Coder;

    fn coder(&self) -> Self::Coder {
        SandboxResource::coder(self)
    }

    fn path(&self) -> Result<PathBuf, ResourceError> {
        self.sandbox()
            .resolve(self.location(), self.relative_path())
    }
}
