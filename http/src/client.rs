//! The HTTP client shared by resources.
//!
//! Two reqwest clients sit behind one [`HttpClient`]: the default one with
//! platform trust, and a pinned one whose TLS trust comes only from the
//! [`CertificatePinningRegistry`]. Each request picks the pinned client when
//! its host matches a pinning pattern.
//!
//! Pinned hosts are only reachable over `https`. A plain `http` request to
//! one, a handshake the pinning verifier rejects, and any other TLS failure
//! all surface as [`ResourceError::SecureConnectionFailed`].

use std::error::Error as StdError;
use std::io;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use coffer_config::{ResolvedConfig, ResolvedHttp};
use coffer_types::{HttpMethod, HttpStatus, Progress, ProgressHandler, ResourceError};
use futures_util::StreamExt;
use reqwest::header::{CONTENT_LENGTH, HeaderMap};
use thiserror::Error;
use uuid::Uuid;

use crate::observer::{RequestMetrics, RequestObserver, TracingObserver};
use crate::pinning::{CertificatePinningRegistry, pinned_tls_config};
use crate::request::{Request, insert_header};
use crate::response::Response;

const SEND_CHUNK_SIZE: usize = 16 * 1024;

static SHARED: OnceLock<HttpClient> = OnceLock::new();

#[derive(Debug, Error)]
pub enum ClientBuildError {
    #[error("invalid default header {name}")]
    InvalidHeader { name: String },
    #[error("failed to configure pinned TLS: {0}")]
    Tls(#[from] rustls::Error),
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Progress callbacks for one request.
#[derive(Clone, Default)]
pub struct TransferProgress {
    pub send: Option<ProgressHandler>,
    pub receive: Option<ProgressHandler>,
}

pub struct HttpClient {
    default: reqwest::Client,
    /// `None` when the pinned TLS stack could not be built; pinned hosts are
    /// then refused.
    pinned: Option<reqwest::Client>,
    registry: Arc<CertificatePinningRegistry>,
    observers: Vec<Arc<dyn RequestObserver>>,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("pinned_available", &self.pinned.is_some())
            .field("registry", &self.registry)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    /// Default configuration with the shared pinning registry.
    pub fn new() -> Result<Self, ClientBuildError> {
        Self::from_config(
            &ResolvedConfig::default().http,
            CertificatePinningRegistry::shared(),
        )
    }

    pub fn from_config(
        http: &ResolvedHttp,
        registry: Arc<CertificatePinningRegistry>,
    ) -> Result<Self, ClientBuildError> {
        let default = base_client_builder(http)?.build()?;
        let pinned = base_client_builder(http)?
            .https_only(true)
            .use_preconfigured_tls(pinned_tls_config(Arc::clone(&registry))?)
            .build()?;

        Ok(Self {
            default,
            pinned: Some(pinned),
            registry,
            observers: vec![Arc::new(TracingObserver)],
        })
    }

    /// The process-wide client used by resources that don't pick their own.
    pub fn shared() -> &'static HttpClient {
        SHARED.get_or_init(|| {
            Self::new().unwrap_or_else(|e| {
                tracing::error!(
                    "Failed to build HTTP client: {e}. Falling back to a plain client; pinned hosts will be refused."
                );
                Self {
                    default: reqwest::Client::new(),
                    pinned: None,
                    registry: CertificatePinningRegistry::shared(),
                    observers: vec![Arc::new(TracingObserver)],
                }
            })
        })
    }

    /// Fails (returning the argument) once [`HttpClient::shared`] has been
    /// initialized.
    pub fn install(client: HttpClient) -> Result<(), HttpClient> {
        SHARED.set(client)
    }

    pub fn is_installed() -> bool {
        SHARED.get().is_some()
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn RequestObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Drop every observer, including the default [`TracingObserver`].
    #[must_use]
    pub fn without_observers(mut self) -> Self {
        self.observers.clear();
        self
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<CertificatePinningRegistry> {
        &self.registry
    }

    /// Send `request` and collect the body of a 2xx response.
    pub async fn execute(
        &self,
        request: Request,
        progress: TransferProgress,
    ) -> Result<Response<Vec<u8>>, ResourceError> {
        let id = Uuid::new_v4();
        for observer in &self.observers {
            observer.will_start(id, &request);
        }

        let started = Instant::now();
        let method = request.method;
        let url = request.url.clone();
        let request_bytes = request.body.as_ref().map_or(0, |b| b.len() as u64);
        let mut response_bytes = 0;

        let result = self.send(request, progress, &mut response_bytes).await;

        let metrics = RequestMetrics {
            method,
            url,
            elapsed: started.elapsed(),
            request_bytes,
            response_bytes,
            status: match &result {
                Ok(response) => Some(response.status),
                Err(e) => e.http_status(),
            },
        };
        for observer in &self.observers {
            observer.did_collect_metrics(id, &metrics);
            match &result {
                Ok(response) => observer.did_succeed(id, response.status),
                Err(e) => observer.did_fail(id, e),
            }
        }
        result
    }

    async fn send(
        &self,
        request: Request,
        progress: TransferProgress,
        received: &mut u64,
    ) -> Result<Response<Vec<u8>>, ResourceError> {
        let host = request.host().unwrap_or_default();
        let client = if self.registry.is_pinned(&host) {
            if request.url.scheme() != "https" {
                tracing::warn!(host = %host, "Refusing plain-text request to pinned host");
                return Err(ResourceError::SecureConnectionFailed(
                    format!("pinned host {host} requires https, got {}", request.url.scheme())
                        .into(),
                ));
            }
            self.pinned.as_ref().ok_or_else(|| {
                ResourceError::SecureConnectionFailed(
                    format!("no pinned TLS client available for {host}").into(),
                )
            })?
        } else {
            &self.default
        };

        let Request {
            method,
            url,
            headers,
            body,
            timeout,
        } = request;
        let mut builder = client.request(to_reqwest_method(method), url).headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(body) = body {
            builder = match progress.send {
                Some(handler) => builder
                    .header(CONTENT_LENGTH, body.len())
                    .body(progress_body(body, handler)),
                None => builder.body(body),
            };
        }

        let response = builder.send().await.map_err(classify)?;
        let status = HttpStatus::from_u16(response.status().as_u16());
        if !status.is_success() {
            return Err(ResourceError::HttpStatus(status));
        }
        let headers = response.headers().clone();
        let body = read_body(response, progress.receive, received).await?;

        Ok(Response {
            status,
            headers,
            body,
        })
    }
}

fn base_client_builder(http: &ResolvedHttp) -> Result<reqwest::ClientBuilder, ClientBuildError> {
    let mut headers = HeaderMap::new();
    for (name, value) in &http.headers {
        insert_header(&mut headers, name, value)
            .map_err(|_| ClientBuildError::InvalidHeader { name: name.clone() })?;
    }

    let mut builder = reqwest::Client::builder()
        .user_agent(http.user_agent.clone())
        .timeout(http.timeout)
        .connect_timeout(http.connect_timeout)
        .default_headers(headers);
    if !http.use_system_proxy {
        builder = builder.no_proxy();
    }
    Ok(builder)
}

fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Head => reqwest::Method::HEAD,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Delete => reqwest::Method::DELETE,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Connect => reqwest::Method::CONNECT,
        HttpMethod::Options => reqwest::Method::OPTIONS,
        HttpMethod::Trace => reqwest::Method::TRACE,
    }
}

/// Streams `body` in fixed chunks, reporting each chunk as the transport
/// pulls it.
fn progress_body(body: Vec<u8>, handler: ProgressHandler) -> reqwest::Body {
    let total = body.len() as u64;
    let chunks: Vec<Vec<u8>> = body.chunks(SEND_CHUNK_SIZE).map(<[u8]>::to_vec).collect();
    let mut sent = 0u64;
    let stream = futures_util::stream::iter(chunks.into_iter().map(move |chunk| {
        sent += chunk.len() as u64;
        handler(Progress::new(sent, Some(total)));
        Ok::<_, io::Error>(chunk)
    }));
    reqwest::Body::wrap_stream(stream)
}

async fn read_body(
    response: reqwest::Response,
    handler: Option<ProgressHandler>,
    received: &mut u64,
) -> Result<Vec<u8>, ResourceError> {
    let Some(handler) = handler else {
        let bytes = response.bytes().await.map_err(classify)?;
        *received = bytes.len() as u64;
        return Ok(bytes.into());
    };

    let total = response.content_length();
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(classify)?;
        body.extend_from_slice(&chunk);
        *received = body.len() as u64;
        handler(Progress::new(*received, total));
    }
    Ok(body)
}

fn classify(err: reqwest::Error) -> ResourceError {
    if err.is_timeout() {
        ResourceError::TimedOut(Box::new(err))
    } else if is_tls_failure(&err) {
        ResourceError::SecureConnectionFailed(Box::new(err))
    } else {
        ResourceError::RequestFailed(Box::new(err))
    }
}

/// Whether a rustls error sits anywhere in the source chain. TLS streams
/// report handshake failures as `io::Error`s (sometimes nested) wrapping the
/// rustls error, and `io::Error::source` skips the wrapped error, so
/// `io::Error`s are unwrapped through `get_ref` instead.
fn is_tls_failure(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if e.is::<rustls::Error>() {
            return true;
        }
        current = match e.downcast_ref::<io::Error>() {
            Some(io_err) => io_err
                .get_ref()
                .map(|inner| inner as &(dyn StdError + 'static))
                .or_else(|| e.source()),
            None => e.source(),
        };
    }
    false
}
