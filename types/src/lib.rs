//! Core vocabulary for Coffer.
//!
//! This crate contains pure types with no IO, no async, and minimal dependencies:
//!
//! - **`coder`**: [`ResourceEncoder`] / [`ResourceDecoder`] and the built-in coders
//! - **`crypter`**: the [`Crypter`] seam used by encrypting coders
//! - **`http`**: [`HttpMethod`] and [`HttpStatus`]
//! - **`progress`**: [`Progress`] reporting for byte transfers
//! - **`error`**: [`ResourceError`], shared by every resource

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

pub mod coder;
pub mod crypter;
pub mod error;
pub mod http;
pub mod progress;

pub use coder::{
    CONTENT_TYPE_JSON, CONTENT_TYPE_OCTET_STREAM, CONTENT_TYPE_TEXT, CryptedDataCoder,
    CryptedJsonCoder, DataCoder, EmptyCoder, JsonCoder, JsonDecoder, JsonEncoder, ResourceCoder,
    ResourceDecoder, ResourceEncoder, StringCoder,
};
pub use crypter::Crypter;
pub use error::{BoxError, ResourceError};
pub use http::{HttpMethod, HttpStatus, StatusClass, UnknownMethodError};
pub use progress::{Progress, ProgressHandler};
