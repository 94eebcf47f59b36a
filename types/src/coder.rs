//! Coders convert between raw bytes and typed content.
//!
//! Every resource owns a coder: HTTP resources use an encoder for the request
//! body and a decoder for the response body, local resources use a full
//! [`ResourceCoder`] so they can both read and write.
//!
//! | Coder | Content | Content type |
//! |-------|---------|--------------|
//! | [`EmptyCoder`] | `()` | none |
//! | [`DataCoder`] | `Vec<u8>` | settable |
//! | [`StringCoder`] | `String` | `text/plain` (settable) |
//! | [`JsonEncoder`] / [`JsonDecoder`] / [`JsonCoder`] | `M` | `application/json` |
//! | [`CryptedDataCoder`] | `Vec<u8>` | settable |
//! | [`CryptedJsonCoder`] | `M` | `application/octet-stream` |

use std::fmt;
use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::crypter::Crypter;
use crate::error::ResourceError;

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_TEXT: &str = "text/plain";
pub const CONTENT_TYPE_OCTET_STREAM: &str = "application/octet-stream";

pub trait ResourceEncoder {
    type Content;

    /// Label sent as `Content-Type` when the encoded bytes travel over HTTP.
    fn content_type(&self) -> Option<&str> {
        None
    }

    /// `Ok(None)` means there is no body at all.
    fn encode(&self, content: &Self::Content) -> Result<Option<Vec<u8>>, ResourceError>;
}

pub trait ResourceDecoder {
    type Content;

    fn decode(&self, data: &[u8]) -> Result<Self::Content, ResourceError>;
}

/// Both directions over the same content type.
pub trait ResourceCoder<T>: ResourceEncoder<Content = T> + ResourceDecoder<Content = T> {}

impl<T, C> ResourceCoder<T> for C where
    C: ResourceEncoder<Content = T> + ResourceDecoder<Content = T> + ?Sized
{
}

// ============================================================================
// Pass-through coders
// ============================================================================

/// Encodes to no body, decodes anything to `()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyCoder;

impl ResourceEncoder for EmptyCoder {
    type Content = ();

    fn encode(&self, _content: &()) -> Result<Option<Vec<u8>>, ResourceError> {
        Ok(None)
    }
}

impl ResourceDecoder for EmptyCoder {
    type Content = ();

    fn decode(&self, _data: &[u8]) -> Result<(), ResourceError> {
        Ok(())
    }
}

/// Raw bytes in, raw bytes out.
#[derive(Debug, Clone, Default)]
pub struct DataCoder {
    content_type: Option<String>,
}

impl DataCoder {
    #[must_use]
    pub fn with_content_type(content_type: impl Into<String>) -> Self {
        Self {
            content_type: Some(content_type.into()),
        }
    }
}

impl ResourceEncoder for DataCoder {
    type Content = Vec<u8>;

    fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    fn encode(&self, content: &Vec<u8>) -> Result<Option<Vec<u8>>, ResourceError> {
        Ok(Some(content.clone()))
    }
}

impl ResourceDecoder for DataCoder {
    type Content = Vec<u8>;

    fn decode(&self, data: &[u8]) -> Result<Vec<u8>, ResourceError> {
        Ok(data.to_vec())
    }
}

/// UTF-8 text.
#[derive(Debug, Clone)]
pub struct StringCoder {
    content_type: Option<String>,
}

impl StringCoder {
    #[must_use]
    pub fn with_content_type(content_type: impl Into<String>) -> Self {
        Self {
            content_type: Some(content_type.into()),
        }
    }
}

impl Default for StringCoder {
    fn default() -> Self {
        Self::with_content_type(CONTENT_TYPE_TEXT)
    }
}

impl ResourceEncoder for StringCoder {
    type Content = String;

    fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    fn encode(&self, content: &String) -> Result<Option<Vec<u8>>, ResourceError> {
        Ok(Some(content.as_bytes().to_vec()))
    }
}

impl ResourceDecoder for StringCoder {
    type Content = String;

    fn decode(&self, data: &[u8]) -> Result<String, ResourceError> {
        String::from_utf8(data.to_vec()).map_err(ResourceError::StringDecodingFailed)
    }
}

// ============================================================================
// JSON coders
// ============================================================================

/// Serializes `M` with `serde_json`.
pub struct JsonEncoder<M> {
    _model: PhantomData<fn(&M)>,
}

impl<M> JsonEncoder<M> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _model: PhantomData,
        }
    }
}

impl<M> Default for JsonEncoder<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> Clone for JsonEncoder<M> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<M> fmt::Debug for JsonEncoder<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonEncoder")
            .field("model", &std::any::type_name::<M>())
            .finish()
    }
}

impl<M: Serialize> ResourceEncoder for JsonEncoder<M> {
    type Content = M;

    fn content_type(&self) -> Option<&str> {
        Some(CONTENT_TYPE_JSON)
    }

    fn encode(&self, content: &M) -> Result<Option<Vec<u8>>, ResourceError> {
        serde_json::to_vec(content)
            .map(Some)
            .map_err(ResourceError::JsonEncodingFailed)
    }
}

/// Deserializes `M` with `serde_json`.
pub struct JsonDecoder<M> {
    _model: PhantomData<fn() -> M>,
}

impl<M> JsonDecoder<M> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _model: PhantomData,
        }
    }
}

impl<M> Default for JsonDecoder<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> Clone for JsonDecoder<M> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<M> fmt::Debug for JsonDecoder<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonDecoder")
            .field("model", &std::any::type_name::<M>())
            .finish()
    }
}

impl<M: DeserializeOwned> ResourceDecoder for JsonDecoder<M> {
    type Content = M;

    fn decode(&self, data: &[u8]) -> Result<M, ResourceError> {
        serde_json::from_slice(data).map_err(ResourceError::JsonDecodingFailed)
    }
}

/// [`JsonEncoder`] and [`JsonDecoder`] over the same model.
pub struct JsonCoder<M> {
    encoder: JsonEncoder<M>,
    decoder: JsonDecoder<M>,
}

impl<M> JsonCoder<M> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            encoder: JsonEncoder::new(),
            decoder: JsonDecoder::new(),
        }
    }
}

impl<M> Default for JsonCoder<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> Clone for JsonCoder<M> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<M> fmt::Debug for JsonCoder<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonCoder")
            .field("model", &std::any::type_name::<M>())
            .finish()
    }
}

impl<M: Serialize> ResourceEncoder for JsonCoder<M> {
    type Content = M;

    fn content_type(&self) -> Option<&str> {
        self.encoder.content_type()
    }

    fn encode(&self, content: &M) -> Result<Option<Vec<u8>>, ResourceError> {
        self.encoder.encode(content)
    }
}

impl<M: DeserializeOwned> ResourceDecoder for JsonCoder<M> {
    type Content = M;

    fn decode(&self, data: &[u8]) -> Result<M, ResourceError> {
        self.decoder.decode(data)
    }
}

// ============================================================================
// Encrypting coders
// ============================================================================

fn seal<C: Crypter>(crypter: &C, plain: &[u8]) -> Result<Vec<u8>, ResourceError> {
    crypter
        .encrypt(plain)
        .map_err(|e| ResourceError::EncryptionFailed(Box::new(e)))
}

fn open<C: Crypter>(crypter: &C, sealed: &[u8]) -> Result<Vec<u8>, ResourceError> {
    crypter
        .decrypt(sealed)
        .map_err(|e| ResourceError::DecryptionFailed(Box::new(e)))
}

/// Raw bytes, encrypted at rest with `C`.
#[derive(Debug, Clone, Default)]
pub struct CryptedDataCoder<C> {
    crypter: C,
    data: DataCoder,
}

impl<C> CryptedDataCoder<C> {
    #[must_use]
    pub fn new(crypter: C) -> Self {
        Self {
            crypter,
            data: DataCoder::default(),
        }
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.data = DataCoder::with_content_type(content_type);
        self
    }

    pub fn crypter(&self) -> &C {
        &self.crypter
    }
}

impl<C: Crypter> ResourceEncoder for CryptedDataCoder<C> {
    type Content = Vec<u8>;

    fn content_type(&self) -> Option<&str> {
        self.data.content_type()
    }

    fn encode(&self, content: &Vec<u8>) -> Result<Option<Vec<u8>>, ResourceError> {
        let plain = self.data.encode(content)?.unwrap_or_default();
        seal(&self.crypter, &plain).map(Some)
    }
}

impl<C: Crypter> ResourceDecoder for CryptedDataCoder<C> {
    type Content = Vec<u8>;

    fn decode(&self, data: &[u8]) -> Result<Vec<u8>, ResourceError> {
        let plain = open(&self.crypter, data)?;
        self.data.decode(&plain)
    }
}

/// JSON content, encrypted at rest with `C`.
pub struct CryptedJsonCoder<M, C> {
    crypter: C,
    json: JsonCoder<M>,
}

impl<M, C> CryptedJsonCoder<M, C> {
    #[must_use]
    pub fn new(crypter: C) -> Self {
        Self {
            crypter,
            json: JsonCoder::new(),
        }
    }

    pub fn crypter(&self) -> &C {
        &self.crypter
    }
}

impl<M, C: Default> Default for CryptedJsonCoder<M, C> {
    fn default() -> Self {
        Self::new(C::default())
    }
}

impl<M, C: Clone> Clone for CryptedJsonCoder<M, C> {
    fn clone(&self) -> Self {
        Self::new(self.crypter.clone())
    }
}

impl<M, C: fmt::Debug> fmt::Debug for CryptedJsonCoder<M, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CryptedJsonCoder")
            .field("model", &std::any::type_name::<M>())
            .field("crypter", &self.crypter)
            .finish()
    }
}

impl<M: Serialize, C: Crypter> ResourceEncoder for CryptedJsonCoder<M, C> {
    type Content = M;

    fn content_type(&self) -> Option<&str> {
        Some(CONTENT_TYPE_OCTET_STREAM)
    }

    fn encode(&self, content: &M) -> Result<Option<Vec<u8>>, ResourceError> {
        let json = self.json.encode(content)?.unwrap_or_default();
        seal(&self.crypter, &json).map(Some)
    }
}

impl<M: DeserializeOwned, C: Crypter> ResourceDecoder for CryptedJsonCoder<M, C> {
    type Content = M;

    fn decode(&self, data: &[u8]) -> Result<M, ResourceError> {
        let json = open(&self.crypter, data)?;
        self.json.decode(&json)
    }
}
