//! Certificate pinning.
//!
//! The registry maps host-name patterns to the certificates a connection to a
//! matching host must present. [`PinningVerifier`] enforces it during the TLS
//! handshake of the pinned client:
//!
//! - hosts matching no pattern are refused (the pinned client is only used for
//!   pinned hosts, so this also catches redirects to unpinned hosts);
//! - the end-entity certificate is accepted when it is byte-identical to a
//!   pinned certificate, or when it chains to one used as the only trust
//!   anchor;
//! - a pattern whose certificate file could not be read contributes no
//!   anchor, so matching hosts fail closed.

use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use coffer_config::ResolvedPin;
use regex::Regex;
use rustls::client::WebPkiServerVerifier;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, verify_tls12_signature, verify_tls13_signature};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{CertificateError, ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PinningError {
    #[error("invalid host pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

struct PinEntry {
    pattern: Regex,
    /// `None` when the certificate file could not be read.
    certificate: Option<CertificateDer<'static>>,
}

/// Host pattern to certificate table, shared between the client and the TLS
/// verifier.
#[derive(Default)]
pub struct CertificatePinningRegistry {
    entries: RwLock<Vec<PinEntry>>,
}

impl CertificatePinningRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry used by [`HttpClient::shared`](crate::HttpClient::shared).
    pub fn shared() -> Arc<Self> {
        static SHARED: OnceLock<Arc<CertificatePinningRegistry>> = OnceLock::new();
        Arc::clone(SHARED.get_or_init(|| Arc::new(Self::new())))
    }

    /// Pin the DER certificate at `path` for hosts matching `pattern`.
    ///
    /// A missing path or unreadable file still registers the pattern, without
    /// a certificate, so connections to matching hosts are refused.
    pub fn register_certificate(&self, path: Option<&Path>, pattern: Regex) {
        let certificate = path.and_then(|path| match fs::read(path) {
            Ok(der) => Some(CertificateDer::from(der)),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    pattern = pattern.as_str(),
                    "Pinned certificate unreadable, matching hosts will be refused: {e}"
                );
                None
            }
        });
        if path.is_none() {
            tracing::warn!(
                pattern = pattern.as_str(),
                "Pinning pattern registered without a certificate"
            );
        }
        self.push(PinEntry {
            pattern,
            certificate,
        });
    }

    pub fn register_der(&self, der: impl Into<Vec<u8>>, pattern: Regex) {
        self.push(PinEntry {
            pattern,
            certificate: Some(CertificateDer::from(der.into())),
        });
    }

    /// Register every configured `[[pinning]]` entry.
    ///
    /// Patterns are validated up front; nothing is registered if one is
    /// invalid.
    pub fn apply(&self, pins: &[ResolvedPin]) -> Result<(), PinningError> {
        let compiled = pins
            .iter()
            .map(|pin| {
                Regex::new(&pin.host_pattern)
                    .map(|regex| (regex, pin))
                    .map_err(|source| PinningError::InvalidPattern {
                        pattern: pin.host_pattern.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        for (regex, pin) in compiled {
            if pin.certificates.is_empty() {
                self.register_certificate(None, regex);
            } else {
                for path in &pin.certificates {
                    self.register_certificate(Some(path.as_path()), regex.clone());
                }
            }
        }
        Ok(())
    }

    /// Certificates pinned for `host`.
    ///
    /// `None` when no pattern matches. `Some` with an empty list when patterns
    /// match but none of them has a readable certificate.
    #[must_use]
    pub fn registered_certificates(&self, host: &str) -> Option<Vec<CertificateDer<'static>>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let mut matched = false;
        let mut certificates = Vec::new();
        for entry in entries.iter().filter(|e| e.pattern.is_match(host)) {
            matched = true;
            if let Some(cert) = &entry.certificate {
                certificates.push(cert.clone());
            }
        }
        matched.then_some(certificates)
    }

    #[must_use]
    pub fn is_pinned(&self, host: &str) -> bool {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.iter().any(|e| e.pattern.is_match(host))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&self, entry: PinEntry) {
        tracing::debug!(
            pattern = entry.pattern.as_str(),
            has_certificate = entry.certificate.is_some(),
            "Registered pinning entry"
        );
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }
}

impl fmt::Debug for CertificatePinningRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_list()
            .entries(entries.iter().map(|e| {
                (
                    e.pattern.as_str().to_string(),
                    e.certificate.as_ref().map(|c| c.len()),
                )
            }))
            .finish()
    }
}

// ============================================================================
// Trust evaluation
// ============================================================================

/// Server certificate verifier backed by a [`CertificatePinningRegistry`].
pub struct PinningVerifier {
    registry: Arc<CertificatePinningRegistry>,
    provider: Arc<CryptoProvider>,
}

impl PinningVerifier {
    #[must_use]
    pub fn new(registry: Arc<CertificatePinningRegistry>) -> Self {
        Self::with_provider(registry, Arc::new(rustls::crypto::aws_lc_rs::default_provider()))
    }

    #[must_use]
    pub fn with_provider(
        registry: Arc<CertificatePinningRegistry>,
        provider: Arc<CryptoProvider>,
    ) -> Self {
        Self { registry, provider }
    }
}

impl fmt::Debug for PinningVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PinningVerifier")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

fn host_of(server_name: &ServerName<'_>) -> Option<String> {
    match server_name {
        ServerName::DnsName(name) => Some(name.as_ref().to_string()),
        ServerName::IpAddress(ip) => Some(std::net::IpAddr::from(*ip).to_string()),
        _ => None,
    }
}

impl ServerCertVerifier for PinningVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        let host = host_of(server_name)
            .ok_or(rustls::Error::InvalidCertificate(CertificateError::NotValidForName))?;

        let Some(pinned) = self.registry.registered_certificates(&host) else {
            tracing::warn!(host = %host, "Refusing TLS connection to unpinned host");
            return Err(rustls::Error::InvalidCertificate(
                CertificateError::UnknownIssuer,
            ));
        };

        if pinned.iter().any(|cert| cert.as_ref() == end_entity.as_ref()) {
            tracing::debug!(host = %host, "Server certificate matches pinned certificate");
            return Ok(ServerCertVerified::assertion());
        }

        let mut roots = RootCertStore::empty();
        let (added, ignored) = roots.add_parsable_certificates(pinned);
        if added == 0 {
            tracing::warn!(
                host = %host,
                ignored,
                "No usable pinned certificate for host, refusing connection"
            );
            return Err(rustls::Error::InvalidCertificate(
                CertificateError::UnknownIssuer,
            ));
        }

        let verifier =
            WebPkiServerVerifier::builder_with_provider(Arc::new(roots), Arc::clone(&self.provider))
                .build()
                .map_err(|e| rustls::Error::General(e.to_string()))?;
        verifier
            .verify_server_cert(end_entity, intermediates, server_name, ocsp_response, now)
            .inspect_err(|e| {
                tracing::warn!(host = %host, "Server certificate rejected by pinning: {e}");
            })
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

/// rustls client configuration whose only trust decision is the registry.
pub fn pinned_tls_config(
    registry: Arc<CertificatePinningRegistry>,
) -> Result<ClientConfig, rustls::Error> {
    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
    let verifier = PinningVerifier::with_provider(registry, Arc::clone(&provider));
    let mut config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(verifier))
        .with_no_client_auth();
    config.alpn_protocols = vec![b"http/1.1".to_vec()];
    Ok(config)
}
