//! Symmetric crypters for Coffer's encrypted coders.
//!
//! | Module | Contents |
//! |--------|----------|
//! | `gcm`  | [`AesGcmCrypter`], authenticated AES-GCM (recommended) |
//! | `cbc`  | [`AesCbcCrypter`], AES-CBC with PKCS#7 padding |
//! | `key`  | [`SymmetricKey`] and the [`KeyProvider`] implementations |
//!
//! Both crypters implement [`coffer_types::Crypter`], so either can back a
//! [`CryptedDataCoder`](coffer_types::CryptedDataCoder) or a
//! [`CryptedJsonCoder`](coffer_types::CryptedJsonCoder).

#![allow(clippy::missing_errors_doc)]

pub mod cbc;
pub mod gcm;
pub mod key;

use coffer_types::BoxError;
use thiserror::Error;

pub use cbc::AesCbcCrypter;
pub use gcm::AesGcmCrypter;
pub use key::{EnvKeyProvider, KeyProvider, PasswordKeyProvider, SymmetricKey};

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid AES key length {length} (expected 16, 24 or 32 bytes)")]
    InvalidKeyLength { length: usize },
    #[error("ciphertext is {length} bytes, need at least {minimum}")]
    DataTooShort { length: usize, minimum: usize },
    #[error("ciphertext failed authentication")]
    AuthenticationFailed,
    #[error("invalid padding after decryption")]
    InvalidPadding,
    #[error("encryption failed")]
    EncryptionFailed,
    #[error("key unavailable: {0}")]
    KeyUnavailable(#[source] BoxError),
}
