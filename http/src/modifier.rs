//! Path and request modifiers.
//!
//! A [`PathModifier`] rewrites the URL path before the query is merged. A
//! [`RequestModifier`] gets the fully built [`Request`] and may rewrite any
//! part of it, asynchronously (fetching a token, signing the body, ...).

use std::future::Future;
use std::pin::Pin;

use coffer_types::ResourceError;
use reqwest::header::{AUTHORIZATION, CACHE_CONTROL, HeaderValue, PRAGMA};

use crate::request::{Request, insert_header};

// ============================================================================
// Path modifiers
// ============================================================================

pub trait PathModifier: Send + Sync {
    fn modify(&self, path: &str) -> String;
}

/// Substitutes `{key}` placeholders with values.
///
/// Parsed URLs carry braces percent-encoded, so `%7Bkey%7D` is matched too.
#[derive(Debug, Clone, Default)]
pub struct ParametersPathModifier {
    parameters: Vec<(String, String)>,
}

impl ParametersPathModifier {
    pub fn new<K, V>(parameters: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            parameters: parameters
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl PathModifier for ParametersPathModifier {
    fn modify(&self, path: &str) -> String {
        self.parameters
            .iter()
            .fold(path.to_string(), |path, (key, value)| {
                path.replace(&format!("{{{key}}}"), value)
                    .replace(&format!("%7B{key}%7D"), value)
            })
    }
}

/// Appends one path component, keeping exactly one `/` at the seam when the
/// component does not bring its own.
#[derive(Debug, Clone)]
pub struct AppendComponentPathModifier {
    component: String,
}

impl AppendComponentPathModifier {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
        }
    }
}

impl PathModifier for AppendComponentPathModifier {
    fn modify(&self, path: &str) -> String {
        let base = path.strip_suffix('/').unwrap_or(path);
        if self.component.starts_with('/') {
            format!("{base}{}", self.component)
        } else {
            format!("{base}/{}", self.component)
        }
    }
}

// ============================================================================
// Request modifiers
// ============================================================================

pub type ModifierFut<'a> = Pin<Box<dyn Future<Output = Result<Request, ResourceError>> + Send + 'a>>;

/// Rewrites a built request before it is sent. Modifiers run in order; the
/// first error aborts the request.
pub trait RequestModifier: Send + Sync {
    fn modify<'a>(&'a self, request: Request) -> ModifierFut<'a>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    /// Leave caching headers alone.
    #[default]
    ProtocolDefault,
    /// Ask every cache on the path to revalidate.
    ReloadIgnoringCache,
    /// Accept a stale cached response of any age.
    ReturnCacheDataElseLoad,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CachePolicyRequestModifier {
    policy: CachePolicy,
}

impl CachePolicyRequestModifier {
    #[must_use]
    pub const fn new(policy: CachePolicy) -> Self {
        Self { policy }
    }

    #[must_use]
    pub const fn policy(&self) -> CachePolicy {
        self.policy
    }
}

impl RequestModifier for CachePolicyRequestModifier {
    fn modify<'a>(&'a self, mut request: Request) -> ModifierFut<'a> {
        match self.policy {
            CachePolicy::ProtocolDefault => {}
            CachePolicy::ReloadIgnoringCache => {
                request
                    .headers
                    .insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
                request
                    .headers
                    .insert(PRAGMA, HeaderValue::from_static("no-cache"));
            }
            CachePolicy::ReturnCacheDataElseLoad => {
                request
                    .headers
                    .insert(CACHE_CONTROL, HeaderValue::from_static("max-stale"));
            }
        }
        Box::pin(async move { Ok(request) })
    }
}

/// Sets fixed headers, replacing values already present.
#[derive(Debug, Clone, Default)]
pub struct HeaderRequestModifier {
    headers: Vec<(String, String)>,
}

impl HeaderRequestModifier {
    pub fn new<K, V>(headers: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            headers: headers
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl RequestModifier for HeaderRequestModifier {
    fn modify<'a>(&'a self, mut request: Request) -> ModifierFut<'a> {
        Box::pin(async move {
            for (name, value) in &self.headers {
                insert_header(&mut request.headers, name, value)?;
            }
            Ok(request)
        })
    }
}

pub type TokenFut = Pin<Box<dyn Future<Output = Result<String, ResourceError>> + Send>>;

pub type TokenSource = Box<dyn Fn() -> TokenFut + Send + Sync>;

/// Sets `Authorization: Bearer <token>`, asking the source for a token on
/// every request.
pub struct BearerTokenRequestModifier<F> {
    source: F,
}

impl<F> BearerTokenRequestModifier<F>
where
    F: Fn() -> TokenFut + Send + Sync,
{
    pub fn new(source: F) -> Self {
        Self { source }
    }
}

impl BearerTokenRequestModifier<TokenSource> {
    /// A modifier that always sends the same token.
    #[must_use]
    pub fn fixed(token: impl Into<String>) -> Self {
        let token = token.into();
        Self {
            source: Box::new(move || -> TokenFut {
                let token = token.clone();
                Box::pin(async move { Ok(token) })
            }),
        }
    }
}

impl<F> RequestModifier for BearerTokenRequestModifier<F>
where
    F: Fn() -> TokenFut + Send + Sync,
{
    fn modify<'a>(&'a self, mut request: Request) -> ModifierFut<'a> {
        Box::pin(async move {
            let token = (self.source)().await?;
            let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                ResourceError::InvalidHeader {
                    name: AUTHORIZATION.to_string(),
                }
            })?;
            value.set_sensitive(true);
            request.headers.insert(AUTHORIZATION, value);
            Ok(request)
        })
    }
}
