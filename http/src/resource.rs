//! Typed HTTP resources.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use coffer_types::{HttpMethod, ProgressHandler, ResourceDecoder, ResourceEncoder, ResourceError};
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use url::Url;

use crate::client::{HttpClient, TransferProgress};
use crate::modifier::{PathModifier, RequestModifier};
use crate::request::{Request, build_url, insert_header};
use crate::response::Response;

pub type ResponseFut<'a, T> =
    Pin<Box<dyn Future<Output = Result<Response<T>, ResourceError>> + Send + 'a>>;

/// Content type carried by a resource's request body.
pub type RequestContent<R> = <<R as HttpResource>::RequestBody as ResourceEncoder>::Content;

/// Content type decoded from a resource's response body.
pub type ResponseContent<R> = <<R as HttpResource>::ResponseBody as ResourceDecoder>::Content;

/// A remote resource: where it lives, how to ask for it, and how to read the
/// answer.
///
/// Only [`url`](Self::url) is required. Everything else defaults to a plain
/// `GET` without body, headers, query, or modifiers, sent through
/// [`HttpClient::shared`].
pub trait HttpResource: Send + Sync {
    type RequestBody: ResourceEncoder + Default;
    type ResponseBody: ResourceDecoder<Content: Send> + Default;

    fn url(&self) -> Result<Url, ResourceError>;

    fn method(&self) -> HttpMethod {
        HttpMethod::Get
    }

    fn path_modifier(&self) -> Option<&dyn PathModifier> {
        None
    }

    /// Set on the request after the client's default headers, replacing them.
    fn request_headers(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    /// Merged into the URL query; an item replaces existing items of the same
    /// name.
    fn request_query(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    fn request_timeout(&self) -> Option<Duration> {
        None
    }

    /// `None` sends no body and no `Content-Type`.
    fn request_body(&self) -> Option<&RequestContent<Self>> {
        None
    }

    fn request_encoder(&self) -> Self::RequestBody {
        Self::RequestBody::default()
    }

    fn response_decoder(&self) -> Self::ResponseBody {
        Self::ResponseBody::default()
    }

    /// Applied in order after the request is built.
    fn request_modifiers(&self) -> &[Box<dyn RequestModifier>] {
        &[]
    }

    fn send_progress(&self) -> Option<ProgressHandler> {
        None
    }

    fn receive_progress(&self) -> Option<ProgressHandler> {
        None
    }

    fn client(&self) -> &HttpClient {
        HttpClient::shared()
    }

    /// The request as it stands before request modifiers run.
    fn build_request(&self) -> Result<Request, ResourceError> {
        let url = build_url(self.url()?, self.path_modifier(), &self.request_query())?;
        let mut request = Request::new(self.method(), url);
        for (name, value) in self.request_headers() {
            insert_header(&mut request.headers, &name, &value)?;
        }

        if let Some(content) = self.request_body() {
            let encoder = self.request_encoder();
            if let Some(body) = encoder.encode(content)? {
                if let Some(content_type) = encoder.content_type() {
                    let value = HeaderValue::from_str(content_type).map_err(|_| {
                        ResourceError::InvalidHeader {
                            name: CONTENT_TYPE.to_string(),
                        }
                    })?;
                    request.headers.insert(CONTENT_TYPE, value);
                }
                request.body = Some(body);
            }
        }

        request.timeout = self.request_timeout();
        Ok(request)
    }

    /// Build, modify, send, and decode.
    fn response(&self) -> ResponseFut<'_, ResponseContent<Self>> {
        Box::pin(async move {
            let mut request = self.build_request()?;
            for modifier in self.request_modifiers() {
                request = modifier.modify(request).await?;
            }

            let progress = TransferProgress {
                send: self.send_progress(),
                receive: self.receive_progress(),
            };
            let raw = self.client().execute(request, progress).await?;
            let decoder = self.response_decoder();
            raw.try_map(|body| decoder.decode(&body))
        })
    }
}
