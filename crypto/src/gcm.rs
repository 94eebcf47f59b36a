//! AES-GCM authenticated encryption.
//!
//! Sealed layout: `nonce (12) || ciphertext || tag (16)`, the same "combined"
//! representation most platform AES-GCM APIs produce.

use aes::Aes192;
use aes_gcm::aead::consts::U12;
use aes_gcm::aead::{Aead, KeyInit, Nonce};
use aes_gcm::{Aes128Gcm, Aes256Gcm, AesGcm};
use coffer_types::Crypter;

use crate::CryptoError;
use crate::key::{KeyProvider, SymmetricKey};

type Aes192Gcm = AesGcm<Aes192, U12>;

pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;

/// Encrypts with AES-GCM under the key from `K`, using a fresh random nonce
/// per call.
#[derive(Debug, Clone, Default)]
pub struct AesGcmCrypter<K> {
    keys: K,
}

impl<K> AesGcmCrypter<K> {
    #[must_use]
    pub const fn new(keys: K) -> Self {
        Self { keys }
    }

    pub fn key_provider(&self) -> &K {
        &self.keys
    }
}

impl<K: KeyProvider> Crypter for AesGcmCrypter<K> {
    type Error = CryptoError;

    fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let key = self.keys.provide_key()?;
        let nonce: [u8; NONCE_LEN] = rand::random();
        let ciphertext = match key.len() {
            16 => seal::<Aes128Gcm>(&key, &nonce, data)?,
            24 => seal::<Aes192Gcm>(&key, &nonce, data)?,
            32 => seal::<Aes256Gcm>(&key, &nonce, data)?,
            length => return Err(CryptoError::InvalidKeyLength { length }),
        };

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if data.len() < NONCE_LEN + TAG_LEN {
            return Err(CryptoError::DataTooShort {
                length: data.len(),
                minimum: NONCE_LEN + TAG_LEN,
            });
        }

        let key = self.keys.provide_key()?;
        let (nonce, ciphertext) = data.split_at(NONCE_LEN);
        match key.len() {
            16 => open::<Aes128Gcm>(&key, nonce, ciphertext),
            24 => open::<Aes192Gcm>(&key, nonce, ciphertext),
            32 => open::<Aes256Gcm>(&key, nonce, ciphertext),
            length => Err(CryptoError::InvalidKeyLength { length }),
        }
    }
}

fn seal<A>(key: &SymmetricKey, nonce: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError>
where
    A: Aead + KeyInit,
{
    let cipher = A::new_from_slice(key.as_bytes())
        .map_err(|_| CryptoError::InvalidKeyLength { length: key.len() })?;
    cipher
        .encrypt(Nonce::<A>::from_slice(nonce), plaintext)
        .map_err(|_| CryptoError::EncryptionFailed)
}

fn open<A>(key: &SymmetricKey, nonce: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError>
where
    A: Aead + KeyInit,
{
    let cipher = A::new_from_slice(key.as_bytes())
        .map_err(|_| CryptoError::InvalidKeyLength { length: key.len() })?;
    cipher
        .decrypt(Nonce::<A>::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::AuthenticationFailed)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::key::PasswordKeyProvider;

    fn crypter() -> AesGcmCrypter<PasswordKeyProvider> {
        AesGcmCrypter::new(PasswordKeyProvider::new("pAssW0rd#OF-the/c1Tad3l"))
    }

    #[test]
    fn round_trips_for_every_key_size() {
        for length in SymmetricKey::VALID_LENGTHS {
            let key = SymmetricKey::from_bytes(vec![0x42; length]).expect("valid key");
            let crypter = AesGcmCrypter::new(key);
            let sealed = crypter.encrypt(b"get schwifty").expect("encrypt");
            assert_eq!(sealed.len(), NONCE_LEN + b"get schwifty".len() + TAG_LEN);
            assert_eq!(crypter.decrypt(&sealed).expect("decrypt"), b"get schwifty".to_vec());
        }
    }

    #[test]
    fn every_call_uses_a_fresh_nonce() {
        let crypter = crypter();
        let first = crypter.encrypt(b"same input").expect("encrypt");
        let second = crypter.encrypt(b"same input").expect("encrypt");
        assert_ne!(first[..NONCE_LEN], second[..NONCE_LEN]);
        assert_ne!(first, second);
    }

    #[test]
    fn empty_plaintext_is_allowed() {
        let crypter = crypter();
        let sealed = crypter.encrypt(&[]).expect("encrypt");
        assert_eq!(sealed.len(), NONCE_LEN + TAG_LEN);
        assert!(crypter.decrypt(&sealed).expect("decrypt").is_empty());
    }

    #[test]
    fn tampering_is_detected() {
        let crypter = crypter();
        let mut sealed = crypter.encrypt(b"portal fluid").expect("encrypt");
        let last = sealed.len() - 1;
        sealed[last] ^= 0x01;
        assert!(matches!(
            crypter.decrypt(&sealed),
            Err(CryptoError::AuthenticationFailed)
        ));
    }

    #[test]
    fn wrong_key_fails_authentication() {
        let sealed = crypter().encrypt(b"portal fluid").expect("encrypt");
        let other = AesGcmCrypter::new(PasswordKeyProvider::new("another password"));
        assert!(matches!(
            other.decrypt(&sealed),
            Err(CryptoError::AuthenticationFailed)
        ));
    }

    #[test]
    fn truncated_input_is_rejected_before_decryption() {
        let err = crypter().decrypt(&[0u8; NONCE_LEN + TAG_LEN - 1]).unwrap_err();
        assert!(matches!(
            err,
            CryptoError::DataTooShort {
                length: 27,
                minimum: 28
            }
        ));
    }
}
