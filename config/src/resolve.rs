use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::{CofferConfig, HttpConfig, PinningConfig, SandboxConfig, StorageConfig, expand_env_vars};

pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_APP_NAME: &str = "coffer";
const DEFAULTS_FILE_NAME: &str = "defaults.json";

/// Config with every default applied.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub http: ResolvedHttp,
    pub pinning: Vec<ResolvedPin>,
    pub sandbox: ResolvedSandbox,
    pub storage: ResolvedStorage,
}

#[derive(Debug, Clone)]
pub struct ResolvedHttp {
    pub user_agent: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub use_system_proxy: bool,
    pub headers: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct ResolvedPin {
    pub host_pattern: String,
    pub certificates: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ResolvedSandbox {
    pub app_name: String,
    /// Explicit override; `None` means the platform cache directory.
    pub caches_dir: Option<PathBuf>,
    /// Explicit override; `None` means the platform documents directory.
    pub documents_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    #[default]
    File,
    Memory,
}

#[derive(Debug, Clone)]
pub struct ResolvedStorage {
    pub backend: StorageBackend,
    /// `None` when no data directory exists and none was configured.
    pub defaults_path: Option<PathBuf>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self::from_config(None)
    }
}

impl ResolvedConfig {
    #[must_use]
    pub fn from_config(config: Option<&CofferConfig>) -> Self {
        let sandbox = resolve_sandbox(config.and_then(|c| c.sandbox.as_ref()));
        let storage = resolve_storage(
            config.and_then(|c| c.storage.as_ref()),
            &sandbox.app_name,
        );
        Self {
            http: resolve_http(config.and_then(|c| c.http.as_ref())),
            pinning: config
                .and_then(|c| c.pinning.as_deref())
                .unwrap_or_default()
                .iter()
                .map(resolve_pin)
                .collect(),
            sandbox,
            storage,
        }
    }
}

fn resolve_http(http: Option<&HttpConfig>) -> ResolvedHttp {
    let user_agent = http
        .and_then(|h| h.user_agent.as_deref())
        .map(str::trim)
        .filter(|ua| !ua.is_empty())
        .map_or_else(
            || format!("coffer/{}", env!("CARGO_PKG_VERSION")),
            str::to_string,
        );
    let timeout = http
        .and_then(|h| h.timeout_seconds)
        .filter(|secs| *secs > 0)
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    let connect_timeout = http
        .and_then(|h| h.connect_timeout_seconds)
        .filter(|secs| *secs > 0)
        .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS);

    ResolvedHttp {
        user_agent,
        timeout: Duration::from_secs(timeout),
        connect_timeout: Duration::from_secs(connect_timeout),
        use_system_proxy: http.and_then(|h| h.use_system_proxy).unwrap_or(true),
        headers: http
            .and_then(|h| h.headers.as_ref())
            .map(|headers| {
                headers
                    .iter()
                    .map(|(k, v)| (k.clone(), expand_env_vars(v)))
                    .collect()
            })
            .unwrap_or_default(),
    }
}

fn resolve_pin(pin: &PinningConfig) -> ResolvedPin {
    ResolvedPin {
        host_pattern: pin.host_pattern.clone(),
        certificates: pin
            .certificates
            .iter()
            .map(|p| PathBuf::from(expand_env_vars(p)))
            .collect(),
    }
}

fn resolve_sandbox(sandbox: Option<&SandboxConfig>) -> ResolvedSandbox {
    let app_name = sandbox
        .and_then(|s| s.app_name.as_deref())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map_or_else(executable_name, str::to_string);

    ResolvedSandbox {
        app_name,
        caches_dir: sandbox.and_then(|s| expand_path(s.caches_dir.as_deref())),
        documents_dir: sandbox.and_then(|s| expand_path(s.documents_dir.as_deref())),
    }
}

fn resolve_storage(storage: Option<&StorageConfig>, app_name: &str) -> ResolvedStorage {
    let backend = match storage.and_then(|s| s.backend.as_deref()) {
        Some(b) if b.eq_ignore_ascii_case("memory") => StorageBackend::Memory,
        Some(b) if b.eq_ignore_ascii_case("file") => StorageBackend::File,
        Some(other) => {
            tracing::warn!(backend = other, "Unknown storage backend, using file");
            StorageBackend::File
        }
        None => StorageBackend::File,
    };
    let defaults_path = storage
        .and_then(|s| expand_path(s.defaults_path.as_deref()))
        .or_else(|| dirs::data_dir().map(|d| d.join(app_name).join(DEFAULTS_FILE_NAME)));

    ResolvedStorage {
        backend,
        defaults_path,
    }
}

fn expand_path(raw: Option<&str>) -> Option<PathBuf> {
    raw.map(expand_env_vars)
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from)
}

/// File stem of the running executable, falling back to `coffer`.
fn executable_name() -> String {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_APP_NAME.to_string())
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults_without_config() {
        let resolved = ResolvedConfig::from_config(None);

        assert_eq!(
            resolved.http.user_agent,
            format!("coffer/{}", env!("CARGO_PKG_VERSION"))
        );
        assert_eq!(resolved.http.timeout, Duration::from_secs(60));
        assert_eq!(resolved.http.connect_timeout, Duration::from_secs(30));
        assert!(resolved.http.use_system_proxy);
        assert!(resolved.http.headers.is_empty());
        assert!(resolved.pinning.is_empty());
        assert!(!resolved.sandbox.app_name.is_empty());
        assert_eq!(resolved.sandbox.caches_dir, None);
        assert_eq!(resolved.storage.backend, StorageBackend::File);
    }

    #[test]
    fn zero_timeouts_fall_back_to_defaults() {
        let config = CofferConfig {
            http: Some(HttpConfig {
                timeout_seconds: Some(0),
                connect_timeout_seconds: Some(3),
                user_agent: Some("   ".to_string()),
                ..HttpConfig::default()
            }),
            ..CofferConfig::default()
        };

        let http = ResolvedConfig::from_config(Some(&config)).http;
        assert_eq!(http.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(http.connect_timeout, Duration::from_secs(3));
        assert!(http.user_agent.starts_with("coffer/"));
    }

    #[test]
    fn expands_paths_and_uses_app_name_for_defaults() {
        unsafe {
            env::set_var("COFFER_TEST_RESOLVE_ROOT", "/srv/portal");
        }
        let config = CofferConfig::parse(
            r#"
                [[pinning]]
                host_pattern = "citadel"
                certificates = ["${COFFER_TEST_RESOLVE_ROOT}/citadel.der"]

                [sandbox]
                app_name = "portal"
                documents_dir = "${COFFER_TEST_RESOLVE_ROOT}/docs"

                [storage]
                backend = "MEMORY"
            "#,
            Path::new("inline.toml"),
        )
        .expect("parse");

        let resolved = ResolvedConfig::from_config(Some(&config));
        unsafe {
            env::remove_var("COFFER_TEST_RESOLVE_ROOT");
        }
        assert_eq!(
            resolved.pinning[0].certificates,
            vec![PathBuf::from("/srv/portal/citadel.der")]
        );
        assert_eq!(resolved.sandbox.app_name, "portal");
        assert_eq!(
            resolved.sandbox.documents_dir,
            Some(PathBuf::from("/srv/portal/docs"))
        );
        assert_eq!(resolved.storage.backend, StorageBackend::Memory);
        if let Some(path) = resolved.storage.defaults_path {
            assert!(path.ends_with("portal/defaults.json"));
        }
    }
}
