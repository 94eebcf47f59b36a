//! The encrypt/decrypt seam used by crypted coders.
//!
//! Implementations live in `coffer-crypto`; anything with this shape can be
//! plugged into [`CryptedDataCoder`](crate::CryptedDataCoder) or
//! [`CryptedJsonCoder`](crate::CryptedJsonCoder).

use std::error::Error as StdError;

pub trait Crypter {
    type Error: StdError + Send + Sync + 'static;

    fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>, Self::Error>;

    fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>, Self::Error>;
}

impl<C: Crypter + ?Sized> Crypter for &C {
    type Error = C::Error;

    fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>, Self::Error> {
        (**self).encrypt(data)
    }

    fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>, Self::Error> {
        (**self).decrypt(data)
    }
}
