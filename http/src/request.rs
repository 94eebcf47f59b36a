//! The built request handed to modifiers and then to the client.

use std::time::Duration;

use coffer_types::{HttpMethod, ResourceError};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use url::{Url, form_urlencoded};

use crate::modifier::PathModifier;

/// Everything needed to send one request.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: HeaderMap,
    /// `None` sends no body at all.
    pub body: Option<Vec<u8>>,
    /// Overrides the client's default timeout.
    pub timeout: Option<Duration>,
}

impl Request {
    #[must_use]
    pub fn new(method: HttpMethod, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
            timeout: None,
        }
    }

    /// Host used for pinning lookups. IPv6 addresses come without brackets,
    /// matching what the TLS layer sees.
    #[must_use]
    pub fn host(&self) -> Option<String> {
        self.url.host().map(|host| match host {
            url::Host::Ipv6(ip) => ip.to_string(),
            other => other.to_string(),
        })
    }
}

/// Insert `name: value`, replacing existing values for `name`.
pub fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) -> Result<(), ResourceError> {
    let invalid = || ResourceError::InvalidHeader {
        name: name.to_string(),
    };
    let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
    let value = HeaderValue::from_str(value).map_err(|_| invalid())?;
    headers.insert(name, value);
    Ok(())
}

/// Apply the path modifier, then merge `query` into the URL.
///
/// A query item replaces every existing item with the same name and is
/// appended form-encoded. Existing items that are not replaced keep their
/// original bytes, so `?flag` stays `flag` and `%20` stays `%20`.
pub fn build_url(
    mut url: Url,
    path_modifier: Option<&dyn PathModifier>,
    query: &[(String, String)],
) -> Result<Url, ResourceError> {
    if url.cannot_be_a_base() {
        return Err(ResourceError::UrlBroken {
            url: url.to_string(),
            reason: "URL cannot have a path or query".to_string(),
        });
    }

    if let Some(modifier) = path_modifier {
        let path = modifier.modify(url.path());
        url.set_path(&path);
    }

    if !query.is_empty() {
        let overridden = |segment: &str| {
            form_urlencoded::parse(segment.as_bytes())
                .next()
                .is_some_and(|(name, _)| query.iter().any(|(new, _)| *new == name))
        };
        let mut segments: Vec<String> = url
            .query()
            .unwrap_or_default()
            .split('&')
            .filter(|segment| !segment.is_empty() && !overridden(segment))
            .map(str::to_string)
            .collect();
        segments.push(
            form_urlencoded::Serializer::new(String::new())
                .extend_pairs(query)
                .finish(),
        );
        url.set_query(Some(&segments.join("&")));
    }

    Ok(url)
}
