//! Resources declared the way an application would declare them, through the
//! `coffer` facade.

use std::fs;
use std::path::Path;

use coffer::local::MemoryStore;
use coffer::{
    AesCbcCrypter, AesGcmCrypter, Bundle, BundleResource, CryptedJsonCoder, CryptoError,
    FileResource, HttpResource, JsonDecoder, KeyProvider, KeyValueResource, KeyValueStore,
    PasswordKeyProvider, ResourceError, Sandbox, SandboxLocation, SandboxResource, StringCoder,
    SymmetricKey,
};
use coffer::http::Url;
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};

const CITADEL_PASSWORD: &str = "pAssW0rd#OF-the/c1Tad3l";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Council {
    members: Vec<String>,
    in_session: bool,
}

fn council() -> Council {
    Council {
        members: vec!["Rick Prime".to_string(), "Zeta Alpha Rick".to_string()],
        in_session: true,
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct CitadelKey;

impl KeyProvider for CitadelKey {
    fn provide_key(&self) -> Result<SymmetricKey, CryptoError> {
        PasswordKeyProvider::new(CITADEL_PASSWORD).provide_key()
    }
}

fn sandbox_in(dir: &Path) -> Sandbox {
    Sandbox::with_roots(dir.join("caches"), dir.join("documents"))
}

// ============================================================================
// Key-value
// ============================================================================

struct Greeting<'a> {
    store: &'a dyn KeyValueStore,
}

impl KeyValueResource for Greeting<'_> {
    type Content = String;
    type Coder = StringCoder;

    fn key(&self) -> &str {
        "greeting"
    }

    fn store(&self) -> &dyn KeyValueStore {
        self.store
    }
}

#[test]
fn string_key_value_resource() {
    let store = MemoryStore::new();
    let greeting = Greeting { store: &store };

    assert_eq!(greeting.read().expect("read"), None);

    greeting
        .write(Some(&"Wubba lubba dub dub".to_string()))
        .expect("write");
    assert_eq!(
        greeting.read().expect("read").as_deref(),
        Some("Wubba lubba dub dub")
    );
    assert_eq!(
        store.get("greeting").expect("get"),
        Some(b"Wubba lubba dub dub".to_vec())
    );

    greeting.delete().expect("delete");
    assert_eq!(greeting.read().expect("read"), None);
}

// ============================================================================
// Sandbox
// ============================================================================

struct Notes<'a> {
    sandbox: &'a Sandbox,
}

impl SandboxResource for Notes<'_> {
    type Content = String;
    type Coder = StringCoder;

    fn location(&self) -> SandboxLocation {
        SandboxLocation::Documents
    }

    fn relative_path(&self) -> &Path {
        Path::new("notes.txt")
    }

    fn sandbox(&self) -> &Sandbox {
        self.sandbox
    }
}

#[test]
fn string_sandbox_resource() {
    let dir = tempfile::tempdir().expect("tempdir");
    let sandbox = sandbox_in(dir.path());
    let notes = Notes { sandbox: &sandbox };

    assert!(!notes.exists().expect("exists"));
    assert!(matches!(
        notes.read(),
        Err(ResourceError::FileNotFound { .. })
    ));

    notes.write(&"Get schwifty".to_string()).expect("write");
    assert!(notes.exists().expect("exists"));
    assert_eq!(notes.read().expect("read"), "Get schwifty");
    assert_eq!(
        fs::read_to_string(dir.path().join("documents/notes.txt")).expect("raw"),
        "Get schwifty"
    );

    notes.remove().expect("remove");
    assert!(!notes.exists().expect("exists"));
    notes.remove().expect("removing twice is fine");
}

struct SealedCouncil<'a> {
    sandbox: &'a Sandbox,
}

impl SandboxResource for SealedCouncil<'_> {
    type Content = Council;
    type Coder = CryptedJsonCoder<Council, AesGcmCrypter<CitadelKey>>;

    fn location(&self) -> SandboxLocation {
        SandboxLocation::Caches
    }

    fn relative_path(&self) -> &Path {
        Path::new("council.bin")
    }

    fn sandbox(&self) -> &Sandbox {
        self.sandbox
    }
}

struct LegacyCouncil<'a> {
    sandbox: &'a Sandbox,
}

impl SandboxResource for LegacyCouncil<'_> {
    type Content = Council;
    type Coder = CryptedJsonCoder<Council, AesCbcCrypter<CitadelKey>>;

    fn location(&self) -> SandboxLocation {
        SandboxLocation::Caches
    }

    fn relative_path(&self) -> &Path {
        Path::new("council.bin")
    }

    fn sandbox(&self) -> &Sandbox {
        self.sandbox
    }
}

#[test]
fn crypted_json_sandbox_resource() {
    let dir = tempfile::tempdir().expect("tempdir");
    let sandbox = sandbox_in(dir.path());
    let sealed = SealedCouncil { sandbox: &sandbox };

    sealed.write(&council()).expect("write");

    let raw = fs::read(dir.path().join("caches/council.bin")).expect("raw");
    assert!(!String::from_utf8_lossy(&raw).contains("Rick Prime"));
    assert_eq!(sealed.read().expect("read"), council());
}

#[test]
fn cbc_sandbox_resource_round_trips_and_rejects_gcm_data() {
    let dir = tempfile::tempdir().expect("tempdir");
    let sandbox = sandbox_in(dir.path());
    let legacy = LegacyCouncil { sandbox: &sandbox };

    legacy.write(&council()).expect("write");
    assert_eq!(legacy.read().expect("read"), council());

    // Same path, different cipher: GCM authentication must refuse CBC output.
    let sealed = SealedCouncil { sandbox: &sandbox };
    assert!(matches!(
        sealed.read(),
        Err(ResourceError::DecryptionFailed(_))
    ));
}

// ============================================================================
// Bundle
// ============================================================================

struct CouncilRoster<'a> {
    bundle: &'a Bundle,
}

impl BundleResource for CouncilRoster<'_> {
    type Decoder = JsonDecoder<Council>;

    fn bundle(&self) -> &Bundle {
        self.bundle
    }

    fn file_name(&self) -> &str {
        "assets/council.json"
    }
}

#[test]
fn bundled_json_resource() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::create_dir_all(dir.path().join("assets")).expect("mkdir");
    fs::write(
        dir.path().join("assets/council.json"),
        r#"{"members":["Rick Prime","Zeta Alpha Rick"],"in_session":true}"#,
    )
    .expect("seed");
    let bundle = Bundle::new(dir.path());

    assert_eq!(
        CouncilRoster { bundle: &bundle }.read().expect("read"),
        council()
    );
}

// ============================================================================
// HTTP
// ============================================================================

struct CitadelHome;

impl HttpResource for CitadelHome {
    type RequestBody = coffer::EmptyCoder;
    type ResponseBody = StringCoder;

    fn url(&self) -> Result<Url, ResourceError> {
        let raw = "https://www.citadel.org?rick=c-137&morty=%2F";
        Url::parse(raw).map_err(|e| ResourceError::UrlBroken {
            url: raw.to_string(),
            reason: e.to_string(),
        })
    }
}

#[test]
fn url_without_query_or_modifier_is_unchanged() {
    let request = CitadelHome.build_request().expect("build");

    assert_eq!(
        request.url.as_str(),
        "https://www.citadel.org/?rick=c-137&morty=%2F"
    );
    assert!(request.body.is_none());
}
