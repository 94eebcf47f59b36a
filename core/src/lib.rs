//! Coffer: typed resources over files, key-value stores, bundled assets, and
//! HTTP endpoints.
//!
//! A resource is a small type that says where its bytes live and which coder
//! turns them into content. This crate re-exports the pieces and wires the
//! process-wide defaults from configuration:
//!
//! - **`types`**: coders, [`ResourceError`], HTTP vocabulary, progress
//! - **`crypto`**: AES-GCM and AES-CBC crypters and key providers
//! - **`config`**: `config.toml` loading and resolution
//! - **`local`**: file, sandbox, bundle, and key-value resources
//! - **`http`**: HTTP resources, modifiers, observers, and certificate pinning
//!
//! Call [`init`] once at startup to load `config.toml`, or [`install`] with a
//! config built in code. Resources used without either fall back to default
//! configuration.

#![allow(clippy::missing_errors_doc)]

pub use coffer_config as config;
pub use coffer_crypto as crypto;
pub use coffer_http as http;
pub use coffer_local as local;
pub use coffer_types as types;

pub use coffer_config::{CofferConfig, ConfigError, ResolvedConfig};
pub use coffer_crypto::{
    AesCbcCrypter, AesGcmCrypter, CryptoError, EnvKeyProvider, KeyProvider, PasswordKeyProvider,
    SymmetricKey,
};
pub use coffer_http::{
    CertificatePinningRegistry, ClientBuildError, HttpClient, HttpResource, PinningError,
    RequestModifier, RequestObserver, Response,
};
pub use coffer_local::{
    Bundle, BundleResource, FileResource, KeyValueResource, KeyValueStore, Sandbox, SandboxLocation,
    SandboxResource,
};
pub use coffer_types::{
    CryptedDataCoder, CryptedJsonCoder, Crypter, DataCoder, EmptyCoder, HttpMethod, HttpStatus,
    JsonCoder, JsonDecoder, JsonEncoder, Progress, ProgressHandler, ResourceCoder,
    ResourceDecoder, ResourceEncoder, ResourceError, StringCoder,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InitError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Pinning(#[from] PinningError),
    #[error(transparent)]
    Client(#[from] ClientBuildError),
    /// The named global was already initialized, explicitly or by first use.
    #[error("{component} is already initialized")]
    AlreadyInstalled { component: &'static str },
}

/// Load `config.toml` (if any), resolve it, and [`install`] the result.
pub fn init() -> Result<ResolvedConfig, InitError> {
    let config = CofferConfig::load()?;
    if config.is_none() {
        tracing::debug!("No config file found, using defaults");
    }
    let resolved = ResolvedConfig::from_config(config.as_ref());
    install(&resolved)?;
    Ok(resolved)
}

/// Set the process-wide sandbox, key-value store, pinning registry entries,
/// and HTTP client from `config`.
///
/// Pinning patterns and the HTTP client are validated, and every global is
/// checked, before any of them is set. If one is already initialized the
/// call fails with [`InitError::AlreadyInstalled`] and sets nothing, so the
/// key-value store file is not opened either.
pub fn install(config: &ResolvedConfig) -> Result<(), InitError> {
    let staging = CertificatePinningRegistry::new();
    staging.apply(&config.pinning)?;

    let registry = CertificatePinningRegistry::shared();
    let client = HttpClient::from_config(&config.http, std::sync::Arc::clone(&registry))?;

    let installed = [
        (Sandbox::is_installed(), "sandbox"),
        (coffer_local::default_store_installed(), "default key-value store"),
        (HttpClient::is_installed(), "HTTP client"),
    ];
    if let Some(&(_, component)) = installed.iter().find(|(set, _)| *set) {
        return Err(InitError::AlreadyInstalled { component });
    }

    Sandbox::install(Sandbox::from_config(&config.sandbox))
        .map_err(|_| InitError::AlreadyInstalled { component: "sandbox" })?;
    coffer_local::install_default_store(coffer_local::store_from_config(&config.storage))
        .map_err(|_| InitError::AlreadyInstalled {
            component: "default key-value store",
        })?;
    HttpClient::install(client).map_err(|_| InitError::AlreadyInstalled {
        component: "HTTP client",
    })?;
    registry.apply(&config.pinning)?;

    tracing::info!(
        app = %config.sandbox.app_name,
        pinned_patterns = config.pinning.len(),
        "Coffer initialized"
    );
    Ok(())
}
