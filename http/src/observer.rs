//! Request lifecycle hooks.

use std::time::Duration;

use coffer_types::{HttpMethod, HttpStatus, ResourceError};
use url::Url;
use uuid::Uuid;

use crate::request::Request;

/// Timing and size of one finished request, successful or not.
#[derive(Debug, Clone)]
pub struct RequestMetrics {
    pub method: HttpMethod,
    pub url: Url,
    pub elapsed: Duration,
    pub request_bytes: u64,
    pub response_bytes: u64,
    /// `None` when no response arrived.
    pub status: Option<HttpStatus>,
}

/// Notified around every request sent by an [`HttpClient`](crate::HttpClient).
///
/// `id` is fresh per request and ties the callbacks of one request together.
/// Every method has an empty default.
pub trait RequestObserver: Send + Sync {
    fn will_start(&self, id: Uuid, request: &Request) {
        let _ = (id, request);
    }

    /// Called once per request, before `did_succeed` or `did_fail`.
    fn did_collect_metrics(&self, id: Uuid, metrics: &RequestMetrics) {
        let _ = (id, metrics);
    }

    fn did_succeed(&self, id: Uuid, status: HttpStatus) {
        let _ = (id, status);
    }

    fn did_fail(&self, id: Uuid, error: &ResourceError) {
        let _ = (id, error);
    }
}

/// Logs every request event through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl RequestObserver for TracingObserver {
    fn will_start(&self, id: Uuid, request: &Request) {
        tracing::debug!(
            %id,
            method = %request.method,
            url = %request.url,
            "Request starting"
        );
    }

    fn did_collect_metrics(&self, id: Uuid, metrics: &RequestMetrics) {
        tracing::debug!(
            %id,
            elapsed_ms = u64::try_from(metrics.elapsed.as_millis()).unwrap_or(u64::MAX),
            request_bytes = metrics.request_bytes,
            response_bytes = metrics.response_bytes,
            status = metrics.status.map(HttpStatus::as_u16),
            "Request metrics"
        );
    }

    fn did_succeed(&self, id: Uuid, status: HttpStatus) {
        tracing::debug!(%id, %status, "Request succeeded");
    }

    fn did_fail(&self, id: Uuid, error: &ResourceError) {
        tracing::warn!(%id, "Request failed: {error}");
    }
}
