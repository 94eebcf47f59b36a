//! HTTP resources for Coffer.
//!
//! An [`HttpResource`] describes one endpoint: its URL, method, headers,
//! query, body coder, and response coder. Calling
//! [`response`](HttpResource::response) builds a [`Request`], passes it
//! through the resource's [`RequestModifier`]s, sends it with an
//! [`HttpClient`], and decodes a 2xx body.
//!
//! | Module | Contents |
//! |--------|----------|
//! | `resource` | [`HttpResource`] and its defaults |
//! | `request` | [`Request`], URL building |
//! | `response` | [`Response`] |
//! | `modifier` | path and request modifiers |
//! | `client` | [`HttpClient`], progress, transport error mapping |
//! | `pinning` | [`CertificatePinningRegistry`] and the pinning TLS verifier |
//! | `observer` | [`RequestObserver`] lifecycle hooks |
//!
//! Non-2xx responses fail with [`ResourceError::HttpStatus`] and their body is
//! never decoded.

#![allow(clippy::missing_errors_doc)]

pub mod client;
pub mod modifier;
pub mod observer;
pub mod pinning;
pub mod request;
pub mod resource;
pub mod response;

pub use client::{ClientBuildError, HttpClient, TransferProgress};
pub use modifier::{
    AppendComponentPathModifier, BearerTokenRequestModifier, CachePolicy,
    CachePolicyRequestModifier, HeaderRequestModifier, ModifierFut, ParametersPathModifier,
    PathModifier, RequestModifier, TokenFut, TokenSource,
};
pub use observer::{RequestMetrics, RequestObserver, TracingObserver};
pub use pinning::{CertificatePinningRegistry, PinningError, PinningVerifier, pinned_tls_config};
pub use request::{Request, build_url, insert_header};
pub use resource::{HttpResource, RequestContent, ResponseContent, ResponseFut};
pub use response::Response;

pub use coffer_types::ResourceError;
pub use reqwest::header::HeaderMap;
pub use url::Url;
