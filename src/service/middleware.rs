//! Service middleware for metrics and request tracking.
//!
//! ## Metrics Exposed
//!
//! Metrics are emitted as structured log events under the
//! `tx_entropy::metrics` target and aggregated from logs:
//!
//! - `request` - path pattern, method, status and latency of every request
//! - `inspection` - status, link count, cache hit and latency per transaction
//! - `batch` - requested, inspected and skipped counts per batch

use std::sync::OnceLock;
use std::time::Instant;

use axum::{extract::Request, http::HeaderMap, middleware::Next, response::Response};
use regex_lite::Regex;
use tracing::{info, info_span, Instrument};

/// Header carrying an upstream trace id (`TRACE_ID/SPAN_ID;o=OPTIONS`).
pub const TRACE_CONTEXT_HEADER: &str = "x-cloud-trace-context";

/// Correlation id of the current request.
///
/// Inserted into request extensions by [`request_logging_middleware`] and
/// echoed in error bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationId(pub String);

/// The upstream trace id when present, otherwise a fresh UUID.
pub(crate) fn correlation_id(headers: &HeaderMap) -> String {
    headers
        .get(TRACE_CONTEXT_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split('/').next())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

/// Request logging middleware that adds a correlation ID and timing.
pub async fn request_logging_middleware(mut request: Request, next: Next) -> Response {
    let start = Instant::now();

    let trace_id = correlation_id(request.headers());
    request
        .extensions_mut()
        .insert(CorrelationId(trace_id.clone()));

    let method = request.method().clone();
    let uri = request.uri().path().to_string();

    let span = info_span!(
        "request",
        trace_id = %trace_id,
        method = %method,
        path = %uri,
        status = tracing::field::Empty,
        latency_ms = tracing::field::Empty,
    );

    let response = next.run(request).instrument(span.clone()).await;

    let latency = start.elapsed();
    let status = response.status().as_u16();

    span.record("status", status);
    span.record("latency_ms", latency.as_millis() as u64);

    info!(
        target: "tx_entropy::access",
        trace_id = %trace_id,
        method = %method,
        path = %uri,
        status = status,
        latency_ms = latency.as_millis() as u64,
        "request completed"
    );

    response
}

/// Metrics middleware that records request counts and latency.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = normalize_path(request.uri().path());

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status().as_u16();

    info!(
        target: "tx_entropy::metrics",
        metric_type = "request",
        path = %path,
        method = %method,
        status = status,
        latency_ms = latency.as_millis() as u64,
        "request_metric"
    );

    response
}

fn txid_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"[0-9a-fA-F]{64}").ok())
        .as_ref()
}

/// Normalize path for metrics to avoid high cardinality.
///
/// Replaces txids with a `:txid` placeholder.
pub(crate) fn normalize_path(path: &str) -> String {
    match txid_pattern() {
        Some(re) => re.replace_all(path, ":txid").to_string(),
        None => path.to_string(),
    }
}

/// Record the metrics of one inspection.
pub fn record_inspection_metrics(
    skipped: bool,
    deterministic_links: usize,
    cache_hit: bool,
    latency_ms: u64,
) {
    let status = if skipped { "skipped" } else { "computed" };
    info!(
        target: "tx_entropy::metrics",
        metric_type = "inspection",
        status = status,
        deterministic_links = deterministic_links,
        cache_hit = cache_hit,
        latency_ms = latency_ms,
        "inspection_metric"
    );
}

/// Record the metrics of one batch.
pub fn record_batch_metrics(requested: usize, inspected: usize, skipped: usize, latency_ms: u64) {
    info!(
        target: "tx_entropy::metrics",
        metric_type = "batch",
        requested = requested,
        inspected = inspected,
        skipped = skipped,
        latency_ms = latency_ms,
        "batch_metric"
    );
}
