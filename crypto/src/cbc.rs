//! AES-CBC with PKCS#7 padding.
//!
//! Sealed layout: `iv (16) || ciphertext`. CBC carries no authentication tag,
//! so a wrong key surfaces as [`CryptoError::InvalidPadding`] at best and as
//! garbage plaintext at worst. Prefer [`AesGcmCrypter`](crate::AesGcmCrypter)
//! for new data.

use aes::{Aes128, Aes192, Aes256};
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockCipher, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use coffer_types::Crypter;

use crate::CryptoError;
use crate::key::KeyProvider;

pub const IV_LEN: usize = 16;

#[derive(Debug, Clone, Default)]
pub struct AesCbcCrypter<K> {
    keys: K,
}

impl<K> AesCbcCrypter<K> {
    #[must_use]
    pub const fn new(keys: K) -> Self {
        Self { keys }
    }

    pub fn key_provider(&self) -> &K {
        &self.keys
    }
}

impl<K: KeyProvider> Crypter for AesCbcCrypter<K> {
    type Error = CryptoError;

    fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let key = self.keys.provide_key()?;
        let iv: [u8; IV_LEN] = rand::random();
        let ciphertext = seal_with_iv(key.as_bytes(), &iv, data)?;

        let mut sealed = Vec::with_capacity(IV_LEN + ciphertext.len());
        sealed.extend_from_slice(&iv);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        // At least one padded block must follow the IV.
        if data.len() <= IV_LEN {
            return Err(CryptoError::DataTooShort {
                length: data.len(),
                minimum: IV_LEN + 1,
            });
        }

        let key = self.keys.provide_key()?;
        let (iv, ciphertext) = data.split_at(IV_LEN);
        match key.len() {
            16 => open::<Aes128>(key.as_bytes(), iv, ciphertext),
            24 => open::<Aes192>(key.as_bytes(), iv, ciphertext),
            32 => open::<Aes256>(key.as_bytes(), iv, ciphertext),
            length => Err(CryptoError::InvalidKeyLength { length }),
        }
    }
}

fn seal_with_iv(key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    match key.len() {
        16 => seal::<Aes128>(key, iv, plaintext),
        24 => seal::<Aes192>(key, iv, plaintext),
        32 => seal::<Aes256>(key, iv, plaintext),
        length => Err(CryptoError::InvalidKeyLength { length }),
    }
}

fn seal<C>(key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError>
where
    C: BlockCipher + BlockEncryptMut,
    cbc::Encryptor<C>: KeyIvInit + BlockEncryptMut,
{
    let encryptor = cbc::Encryptor::<C>::new_from_slices(key, iv)
        .map_err(|_| CryptoError::InvalidKeyLength { length: key.len() })?;
    Ok(encryptor.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

fn open<C>(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError>
where
    C: BlockCipher + BlockDecryptMut,
    cbc::Decryptor<C>: KeyIvInit + BlockDecryptMut,
{
    let decryptor = cbc::Decryptor::<C>::new_from_slices(key, iv)
        .map_err(|_| CryptoError::InvalidKeyLength { length: key.len() })?;
    decryptor
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CryptoError::InvalidPadding)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::key::{PasswordKeyProvider, SymmetricKey};

    fn hex(s: &str) -> Vec<u8> {
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).expect("hex digit"))
            .collect()
    }

    #[test]
    fn matches_nist_sp800_38a_first_block() {
        let key = hex("2b7e151628aed2a6abf7158809cf4f3c");
        let iv = hex("000102030405060708090a0b0c0d0e0f");
        let plaintext = hex("6bc1bee22e409f96e93d7e117393172a");

        let ciphertext = seal_with_iv(&key, &iv, &plaintext).expect("seal");
        // One data block plus one full block of PKCS#7 padding.
        assert_eq!(ciphertext.len(), 32);
        assert_eq!(ciphertext[..16], hex("7649abac8119b246cee98e9b12e9197d")[..]);
    }

    #[test]
    fn round_trips_for_every_key_size() {
        for length in SymmetricKey::VALID_LENGTHS {
            let crypter = AesCbcCrypter::new(SymmetricKey::from_bytes(vec![9u8; length]).expect("valid key"));
            let sealed = crypter.encrypt(b"wubba lubba dub dub").expect("encrypt");
            assert_eq!(sealed.len(), IV_LEN + 32);
            assert_eq!(
                crypter.decrypt(&sealed).expect("decrypt"),
                b"wubba lubba dub dub".to_vec()
            );
        }
    }

    #[test]
    fn random_iv_changes_output() {
        let crypter = AesCbcCrypter::new(PasswordKeyProvider::new("squanch"));
        let first = crypter.encrypt(b"same input").expect("encrypt");
        let second = crypter.encrypt(b"same input").expect("encrypt");
        assert_ne!(first, second);
    }

    #[test]
    fn iv_only_input_is_too_short() {
        let crypter = AesCbcCrypter::new(PasswordKeyProvider::new("squanch"));
        assert!(matches!(
            crypter.decrypt(&[0u8; IV_LEN]),
            Err(CryptoError::DataTooShort {
                length: 16,
                minimum: 17
            })
        ));
    }

    #[test]
    fn partial_block_is_a_padding_error() {
        let crypter = AesCbcCrypter::new(PasswordKeyProvider::new("squanch"));
        assert!(matches!(
            crypter.decrypt(&[0u8; IV_LEN + 5]),
            Err(CryptoError::InvalidPadding)
        ));
    }
}
