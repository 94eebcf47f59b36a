//! Key material and the providers that hand it to crypters.

use std::env;
use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::CryptoError;

/// AES key: 16, 24 or 32 bytes. Wiped from memory on drop.
#[derive(Clone)]
pub struct SymmetricKey(Zeroizing<Vec<u8>>);

impl SymmetricKey {
    /// Key sizes for AES-128, AES-192 and AES-256.
    pub const VALID_LENGTHS: [usize; 3] = [16, 24, 32];

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self, CryptoError> {
        let bytes = Zeroizing::new(bytes.into());
        if !Self::VALID_LENGTHS.contains(&bytes.len()) {
            return Err(CryptoError::InvalidKeyLength {
                length: bytes.len(),
            });
        }
        Ok(Self(bytes))
    }

    /// 256-bit key: the SHA-256 digest of the UTF-8 password.
    ///
    /// This is a plain hash, not a password-stretching KDF; use it for
    /// high-entropy secrets only.
    #[must_use]
    pub fn from_password(password: &str) -> Self {
        let digest = Sha256::digest(password.as_bytes());
        Self(Zeroizing::new(digest.to_vec()))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// Manual Debug impl to prevent leaking key bytes in logs.
impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymmetricKey([REDACTED; {} bytes])", self.len())
    }
}

/// Supplies the key for every encrypt/decrypt call.
///
/// Called once per operation, so rotating the underlying secret takes effect
/// on the next call.
pub trait KeyProvider {
    fn provide_key(&self) -> Result<SymmetricKey, CryptoError>;
}

impl KeyProvider for SymmetricKey {
    fn provide_key(&self) -> Result<SymmetricKey, CryptoError> {
        Ok(self.clone())
    }
}

impl<K: KeyProvider + ?Sized> KeyProvider for &K {
    fn provide_key(&self) -> Result<SymmetricKey, CryptoError> {
        (**self).provide_key()
    }
}

/// Derives the key from a password with [`SymmetricKey::from_password`].
#[derive(Clone)]
pub struct PasswordKeyProvider {
    password: Zeroizing<String>,
}

impl PasswordKeyProvider {
    #[must_use]
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: Zeroizing::new(password.into()),
        }
    }
}

impl fmt::Debug for PasswordKeyProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordKeyProvider")
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl KeyProvider for PasswordKeyProvider {
    fn provide_key(&self) -> Result<SymmetricKey, CryptoError> {
        Ok(SymmetricKey::from_password(&self.password))
    }
}

/// Reads a base64-encoded key from an environment variable on every call.
#[derive(Debug, Clone)]
pub struct EnvKeyProvider {
    var: String,
}

impl EnvKeyProvider {
    #[must_use]
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    #[must_use]
    pub fn var(&self) -> &str {
        &self.var
    }
}

impl KeyProvider for EnvKeyProvider {
    fn provide_key(&self) -> Result<SymmetricKey, CryptoError> {
        let encoded = Zeroizing::new(env::var(&self.var).map_err(|e| {
            CryptoError::KeyUnavailable(format!("{}: {e}", self.var).into())
        })?);
        let decoded = STANDARD
            .decode(encoded.trim())
            .map_err(|e| CryptoError::KeyUnavailable(Box::new(e)))?;
        SymmetricKey::from_bytes(decoded)
    }
}
