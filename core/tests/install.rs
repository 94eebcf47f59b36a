//! Process-wide installation. Kept in its own test binary, and in a single
//! test, because every global can be set only once per process.

use std::path::Path;

use coffer::local::default_store;
use coffer::{
    CertificatePinningRegistry, CofferConfig, HttpClient, InitError, ResolvedConfig, Sandbox,
    SandboxLocation,
};

fn resolved(toml: &str) -> ResolvedConfig {
    let config = CofferConfig::parse(toml, Path::new("install-test.toml")).expect("parse");
    ResolvedConfig::from_config(Some(&config))
}

#[test]
fn install_sets_globals_once() {
    let dir = tempfile::tempdir().expect("tempdir");
    let caches = dir.path().join("caches");
    let documents = dir.path().join("documents");
    let sandbox = format!(
        "[sandbox]\napp_name = 'citadel'\ncaches_dir = '{}'\ndocuments_dir = '{}'\n\n[storage]\nbackend = 'memory'\n",
        caches.display(),
        documents.display()
    );

    let broken = resolved(&format!("{sandbox}\n[[pinning]]\nhost_pattern = '(unclosed'\n"));
    let err = coffer::install(&broken).expect_err("invalid pattern");
    assert!(matches!(err, InitError::Pinning(_)), "got {err:?}");

    let config = resolved(&format!(
        "{sandbox}\n[[pinning]]\nhost_pattern = 'citadel\\.org$'\n"
    ));
    coffer::install(&config).expect("install");

    assert_eq!(
        Sandbox::global().root(SandboxLocation::Caches).expect("caches"),
        caches.as_path()
    );
    assert_eq!(
        Sandbox::global()
            .root(SandboxLocation::Documents)
            .expect("documents"),
        documents.as_path()
    );
    assert!(CertificatePinningRegistry::shared().is_pinned("www.citadel.org"));
    assert!(HttpClient::shared().registry().is_pinned("citadel.org"));
    assert!(!HttpClient::shared().registry().is_pinned("cromulon.net"));

    default_store()
        .set("portal", b"green".to_vec())
        .expect("memory store accepts writes");
    assert_eq!(
        default_store().get("portal").expect("get"),
        Some(b"green".to_vec())
    );
    assert!(!dir.path().join("defaults.json").exists());

    let again = coffer::install(&config).expect_err("second install");
    assert!(matches!(
        again,
        InitError::AlreadyInstalled {
            component: "sandbox"
        }
    ));
}
