//! Installation against a process whose HTTP client is already set. Kept in
//! its own test binary so no other test touches the globals first.

use std::path::Path;

use coffer::local::{MemoryStore, default_store_installed, install_default_store};
use coffer::{CofferConfig, HttpClient, InitError, ResolvedConfig, Sandbox};

#[test]
fn refused_install_sets_no_global() {
    let dir = tempfile::tempdir().expect("tempdir");
    let defaults = dir.path().join("store").join("defaults.json");
    let toml = format!(
        "[sandbox]\napp_name = 'citadel'\ncaches_dir = '{}'\n\n[storage]\nbackend = 'file'\ndefaults_path = '{}'\n",
        dir.path().join("caches").display(),
        defaults.display()
    );
    let config = CofferConfig::parse(&toml, Path::new("partial-install.toml")).expect("parse");
    let resolved = ResolvedConfig::from_config(Some(&config));

    assert!(HttpClient::install(HttpClient::new().expect("client")).is_ok());

    let err = coffer::install(&resolved).expect_err("client already set");
    assert!(
        matches!(
            err,
            InitError::AlreadyInstalled {
                component: "HTTP client"
            }
        ),
        "got {err:?}"
    );

    assert!(!Sandbox::is_installed());
    assert!(!default_store_installed());
    assert!(!defaults.exists());
    assert!(!dir.path().join("store").exists());

    Sandbox::install(Sandbox::with_roots(dir.path().join("c"), dir.path().join("d")))
        .expect("sandbox still free");
    assert!(install_default_store(Box::new(MemoryStore::new())).is_ok());
}
