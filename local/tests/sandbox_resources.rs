//! Sandbox and key-value resources working against real directories and a
//! file-backed store.

use std::path::Path;

use coffer_crypto::{AesGcmCrypter, KeyProvider, SymmetricKey};
use coffer_local::{
    FileResource, FileStore, KeyValueResource, KeyValueStore, Sandbox, SandboxLocation,
    SandboxResource,
};
use coffer_types::{CryptedJsonCoder, JsonCoder, ResourceError};
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Portal {
    origin: String,
    destination: String,
    fluid_ml: u32,
}

fn portal() -> Portal {
    Portal {
        origin: "C-137".to_string(),
        destination: "Citadel".to_string(),
        fluid_ml: 42,
    }
}

#[derive(Debug, Clone, Default)]
struct LabKey;

impl KeyProvider for LabKey {
    fn provide_key(&self) -> Result<SymmetricKey, coffer_crypto::CryptoError> {
        Ok(SymmetricKey::from_password("lab-key"))
    }
}

struct PortalLog<'a> {
    sandbox: &'a Sandbox,
}

impl SandboxResource for PortalLog<'_> {
    type Content = Portal;
    type Coder = JsonCoder<Portal>;

    fn location(&self) -> SandboxLocation {
        SandboxLocation::Documents
    }

    fn relative_path(&self) -> &Path {
        Path::new("logs/portal.json")
    }

    fn sandbox(&self) -> &Sandbox {
        self.sandbox
    }
}

struct SealedPortal<'a> {
    sandbox: &'a Sandbox,
}

impl SandboxResource for SealedPortal<'_> {
    type Content = Portal;
    type Coder = CryptedJsonCoder<Portal, AesGcmCrypter<LabKey>>;

    fn location(&self) -> SandboxLocation {
        SandboxLocation::Caches
    }

    fn relative_path(&self) -> &Path {
        Path::new("sealed/portal.bin")
    }

    fn sandbox(&self) -> &Sandbox {
        self.sandbox
    }
}

struct Escapee<'a> {
    sandbox: &'a Sandbox,
}

impl SandboxResource for Escapee<'_> {
    type Content = Portal;
    type Coder = JsonCoder<Portal>;

    fn location(&self) -> SandboxLocation {
        SandboxLocation::Caches
    }

    fn relative_path(&self) -> &Path {
        Path::new("../outside.json")
    }

    fn sandbox(&self) -> &Sandbox {
        self.sandbox
    }
}

fn sandbox_in(dir: &Path) -> Sandbox {
    Sandbox::with_roots(dir.join("caches"), dir.join("documents"))
}

#[test]
fn sandbox_resource_lands_under_location_root() {
    let dir = tempfile::tempdir().expect("tempdir");
    let sandbox = sandbox_in(dir.path());
    let log = PortalLog { sandbox: &sandbox };

    log.write(&portal()).expect("write");

    assert!(dir.path().join("documents/logs/portal.json").is_file());
    assert_eq!(log.read().expect("read"), portal());
}

#[test]
fn encrypted_sandbox_resource_is_opaque_on_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let sandbox = sandbox_in(dir.path());
    let sealed = SealedPortal { sandbox: &sandbox };

    sealed.write(&portal()).expect("write");

    let raw = std::fs::read(dir.path().join("caches/sealed/portal.bin")).expect("raw");
    assert!(!String::from_utf8_lossy(&raw).contains("Citadel"));
    assert_eq!(sealed.read().expect("read"), portal());
}

#[test]
fn tampered_ciphertext_fails_decryption() {
    let dir = tempfile::tempdir().expect("tempdir");
    let sandbox = sandbox_in(dir.path());
    let sealed = SealedPortal { sandbox: &sandbox };
    sealed.write(&portal()).expect("write");

    let path = dir.path().join("caches/sealed/portal.bin");
    let mut raw = std::fs::read(&path).expect("raw");
    raw[20] ^= 0xff;
    std::fs::write(&path, raw).expect("tamper");

    let err = sealed.read().expect_err("tampered");
    assert!(matches!(err, ResourceError::DecryptionFailed(_)));
}

#[test]
fn escaping_relative_path_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let sandbox = sandbox_in(dir.path());
    let escapee = Escapee { sandbox: &sandbox };

    let err = escapee.write(&portal()).expect_err("escape");
    assert!(matches!(err, ResourceError::InvalidPath { .. }));
    assert!(!dir.path().join("outside.json").exists());
}

struct LastPortal<'a> {
    store: &'a FileStore,
}

impl KeyValueResource for LastPortal<'_> {
    type Content = Portal;
    type Coder = JsonCoder<Portal>;

    fn key(&self) -> &str {
        "last-portal"
    }

    fn store(&self) -> &dyn KeyValueStore {
        self.store
    }
}

#[test]
fn key_value_resource_survives_store_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("defaults.json");

    {
        let store = FileStore::open(&path).expect("open");
        LastPortal { store: &store }
            .write(Some(&portal()))
            .expect("write");
    }

    let store = FileStore::open(&path).expect("reopen");
    let resource = LastPortal { store: &store };
    assert_eq!(resource.read().expect("read"), Some(portal()));

    resource.delete().expect("delete");
    assert_eq!(resource.read().expect("read"), None);
}
