//! Configuration for Coffer.
//!
//! The file lives at `$COFFER_CONFIG` or `<config dir>/coffer/config.toml`:
//!
//! ```toml
//! [http]
//! user_agent = "my-app/1.0"
//! timeout_seconds = 30
//! headers = { "X-Client" = "my-app" }
//!
//! [[pinning]]
//! host_pattern = "(^|\\.)citadel\\.org$"
//! certificates = ["${HOME}/certs/citadel.der"]
//!
//! [sandbox]
//! app_name = "my-app"
//!
//! [storage]
//! backend = "file"
//! ```
//!
//! Every field is optional. [`ResolvedConfig::from_config`] fills in defaults.

#![allow(clippy::missing_errors_doc)]

mod resolve;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::{env, fs};

use serde::Deserialize;
use thiserror::Error;

pub use resolve::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_TIMEOUT_SECS, ResolvedConfig, ResolvedHttp,
    ResolvedPin, ResolvedSandbox, ResolvedStorage, StorageBackend,
};

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "COFFER_CONFIG";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CofferConfig {
    pub http: Option<HttpConfig>,
    pub pinning: Option<Vec<PinningConfig>>,
    pub sandbox: Option<SandboxConfig>,
    pub storage: Option<StorageConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpConfig {
    pub user_agent: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub connect_timeout_seconds: Option<u64>,
    /// Honor `HTTP_PROXY`/`HTTPS_PROXY`. Defaults to true.
    pub use_system_proxy: Option<bool>,
    /// Sent with every request unless the resource overrides them.
    pub headers: Option<BTreeMap<String, String>>,
}

/// One `[[pinning]]` table.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PinningConfig {
    /// Regular expression searched in the host name.
    pub host_pattern: String,
    /// DER certificate files. `${VAR}` is expanded.
    #[serde(default)]
    pub certificates: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SandboxConfig {
    pub app_name: Option<String>,
    pub caches_dir: Option<String>,
    pub documents_dir: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// `"file"` (default) or `"memory"`.
    pub backend: Option<String>,
    pub defaults_path: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

impl CofferConfig {
    /// Load from [`config_path`]. `Ok(None)` when there is no config file.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let Some(path) = config_path() else {
            return Ok(None);
        };
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file");
            return Ok(None);
        }
        Self::load_from(&path).map(Some)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| {
            tracing::warn!(path = %path.display(), "Failed to read config: {source}");
            ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }
        })?;
        Self::parse(&content, path)
    }

    /// Parse TOML text; `origin` is only used in errors.
    pub fn parse(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| {
            tracing::warn!(path = %origin.display(), "Failed to parse config: {source}");
            ConfigError::Parse {
                path: origin.to_path_buf(),
                source,
            }
        })
    }
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("coffer").join("config.toml"))
}

/// Replace every `${VAR}` with the variable's value (empty when unset).
///
/// An unclosed `${` is kept verbatim.
#[must_use]
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start + 2..].find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        let var = &rest[start + 2..start + 2 + len];
        if !var.is_empty() {
            out.push_str(&env::var(var).unwrap_or_default());
        }
        rest = &rest[start + 2 + len + 1..];
    }

    out.push_str(rest);
    out
}
