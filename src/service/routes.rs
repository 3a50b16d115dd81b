//! Axum routes for the inspection service.

use std::time::Instant;

use axum::{
    extract::{Extension, Json, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};

use crate::batch::{BatchInspection, BatchInspector};
use crate::cache::CacheStats;
use crate::config::{AnalysisOption, AnalysisParams, Network, ProviderKind, MAX_CJ_INTRAFEES_RATIO};
use crate::inspector::{InspectorError, TxInspection};
use crate::provider::ProviderError;
use crate::TX_ENTROPY_SCHEMA_VERSION;

use super::middleware::{record_batch_metrics, record_inspection_metrics, CorrelationId};
use super::state::ServiceState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to inspect one transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectRequest {
    /// Transaction id.
    pub txid: String,
    /// Network; the service default when omitted.
    #[serde(default)]
    pub network: Option<Network>,
    /// Analysis parameters; defaults when omitted.
    #[serde(default)]
    pub params: Option<AnalysisParams>,
}

/// Request to inspect several transactions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchInspectRequest {
    /// Transaction ids, processed in order.
    pub txids: Vec<String>,
    /// Network; the service default when omitted.
    #[serde(default)]
    pub network: Option<Network>,
    /// Analysis parameters applied to every transaction.
    #[serde(default)]
    pub params: Option<AnalysisParams>,
}

/// Query string of `GET /api/tx/:txid`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InspectQuery {
    /// Network; the service default when omitted.
    pub network: Option<Network>,
}

/// Response for a single inspection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectResponse {
    /// Network the txid was resolved on.
    pub network: Network,
    /// Hash of the parameters used.
    pub params_hash: String,
    /// Report and graph elements.
    #[serde(flatten)]
    pub inspection: TxInspection,
}

/// Default parameters and accepted values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsResponse {
    /// Parameters applied when a request omits them.
    pub params: AnalysisParams,
    /// Default network.
    pub network: Network,
    /// Configured provider.
    pub provider: ProviderKind,
    /// All recognized option names.
    pub available_options: Vec<String>,
    /// Upper bound of `max_cj_intrafees_ratio`.
    pub max_cj_intrafees_ratio_limit: u8,
}

/// Service health response (detailed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub schema_version: String,
    pub provider: String,
    pub analyzer: String,
    pub uptime_secs: u64,
    /// Report cache statistics, absent when the cache is disabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheStats>,
}

/// Simple liveness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessResponse {
    pub status: String,
}

/// Readiness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub details: Option<String>,
}

/// Structured error response with correlation ID for tracing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
    /// Machine-readable error code.
    pub code: String,
    /// Correlation ID for request tracing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    /// Additional error details (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    /// Create a new error response with code and message.
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            correlation_id: None,
            details: None,
        }
    }

    /// Add a correlation ID to the error.
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Add details to the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// An error response with its HTTP status.
#[derive(Debug, Clone)]
pub struct ApiError {
    /// HTTP status.
    pub status: StatusCode,
    /// JSON body.
    pub body: ErrorResponse,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::warn!(
            status = self.status.as_u16(),
            code = %self.body.code,
            error = %self.body.error,
            correlation_id = ?self.body.correlation_id,
            "Request error"
        );
        (self.status, Json(self.body)).into_response()
    }
}

/// Map an inspection error to a status code and error body.
///
/// `txid` is the transaction the request was about, if there was only one.
fn inspector_error(
    err: InspectorError,
    correlation: Option<&CorrelationId>,
    txid: Option<&str>,
) -> ApiError {
    let (status, code) = match &err {
        InspectorError::InvalidParams(_) => (StatusCode::BAD_REQUEST, "INVALID_PARAMS"),
        InspectorError::Fetch(ProviderError::InvalidTxid(_)) => {
            (StatusCode::BAD_REQUEST, "INVALID_TXID")
        }
        InspectorError::Fetch(ProviderError::NotFound(_)) => (StatusCode::NOT_FOUND, "TX_NOT_FOUND"),
        InspectorError::Fetch(_) => (StatusCode::BAD_GATEWAY, "FETCH_FAILED"),
        InspectorError::Analyzer(_) => (StatusCode::INTERNAL_SERVER_ERROR, "ANALYZER_FAILED"),
        InspectorError::ContractViolation { .. } => {
            tracing::error!(error = %err, "analyzer contract violation");
            (StatusCode::INTERNAL_SERVER_ERROR, "CONTRACT_VIOLATION")
        }
    };
    let txid = match &err {
        InspectorError::ContractViolation { txid, .. } => Some(txid.as_str()),
        _ => txid,
    };

    let mut body = ErrorResponse::new(code, err.to_string());
    if let Some(CorrelationId(id)) = correlation {
        body = body.with_correlation_id(id.as_str());
    }
    if let Some(txid) = txid {
        body = body.with_details(format!("txid {}", txid));
    }
    ApiError { status, body }
}

// ============================================================================
// Route Handlers
// ============================================================================

async fn run_inspection(
    state: &ServiceState,
    correlation: Option<&CorrelationId>,
    txid: &str,
    network: Network,
    params: AnalysisParams,
) -> Result<Json<InspectResponse>, ApiError> {
    let start = Instant::now();
    let inspection = state
        .inspector
        .inspect(txid, network, &params)
        .await
        .map_err(|e| inspector_error(e, correlation, Some(txid)))?;

    record_inspection_metrics(
        inspection.report.is_skipped(),
        inspection.report.deterministic_links.len(),
        inspection.cache_hit,
        start.elapsed().as_millis() as u64,
    );

    Ok(Json(InspectResponse {
        network,
        params_hash: params.params_hash(),
        inspection,
    }))
}

/// Inspect one transaction.
async fn inspect_handler(
    State(state): State<ServiceState>,
    correlation: Option<Extension<CorrelationId>>,
    Json(request): Json<InspectRequest>,
) -> Result<Json<InspectResponse>, ApiError> {
    let network = request.network.unwrap_or(state.default_network);
    let params = request.params.unwrap_or_default();
    let correlation = correlation.map(|Extension(id)| id);
    run_inspection(&state, correlation.as_ref(), &request.txid, network, params).await
}

/// Inspect one transaction with default parameters.
async fn inspect_get_handler(
    State(state): State<ServiceState>,
    correlation: Option<Extension<CorrelationId>>,
    Path(txid): Path<String>,
    Query(query): Query<InspectQuery>,
) -> Result<Json<InspectResponse>, ApiError> {
    let network = query.network.unwrap_or(state.default_network);
    let correlation = correlation.map(|Extension(id)| id);
    run_inspection(&state, correlation.as_ref(), &txid, network, AnalysisParams::default()).await
}

/// Inspect several transactions; unreachable ids are reported in `skipped`.
async fn batch_inspect_handler(
    State(state): State<ServiceState>,
    correlation: Option<Extension<CorrelationId>>,
    Json(request): Json<BatchInspectRequest>,
) -> Result<Json<BatchInspection>, ApiError> {
    let start = Instant::now();
    let network = request.network.unwrap_or(state.default_network);
    let params = request.params.unwrap_or_default();

    let batch = BatchInspector::new(state.inspector.as_ref())
        .inspect_all(&request.txids, network, &params)
        .await
        .map_err(|e| {
            let correlation = correlation.as_ref().map(|Extension(id)| id);
            inspector_error(e, correlation, None)
        })?;

    record_batch_metrics(
        request.txids.len(),
        batch.inspections.len(),
        batch.skipped.len(),
        start.elapsed().as_millis() as u64,
    );

    Ok(Json(batch))
}

/// Default parameters and accepted values.
async fn defaults_handler(State(state): State<ServiceState>) -> Json<DefaultsResponse> {
    Json(DefaultsResponse {
        params: AnalysisParams::default(),
        network: state.default_network,
        provider: state.provider_kind,
        available_options: AnalysisOption::ALL.iter().map(|o| o.as_str().to_string()).collect(),
        max_cj_intrafees_ratio_limit: MAX_CJ_INTRAFEES_RATIO,
    })
}

/// Health check endpoint (detailed).
async fn health_handler(State(state): State<ServiceState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        schema_version: TX_ENTROPY_SCHEMA_VERSION.to_string(),
        provider: state.inspector.provider().descriptor().to_string(),
        analyzer: state.inspector.analyzer().descriptor().to_string(),
        uptime_secs: state.uptime_secs(),
        cache: state.inspector.cache_stats(),
    })
}

/// Liveness probe endpoint.
///
/// Returns 200 if the process is alive. Does NOT check dependencies.
async fn liveness_handler() -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: "alive".to_string(),
    })
}

/// Readiness probe endpoint.
///
/// Provider and analyzer are built at startup, so a running service is ready.
async fn readiness_handler() -> Json<ReadinessResponse> {
    Json(ReadinessResponse {
        ready: true,
        details: None,
    })
}

// ============================================================================
// Router Construction
// ============================================================================

/// Create the Axum router for the inspection service.
pub fn create_router(state: ServiceState) -> Router {
    Router::new()
        // Inspection
        .route("/api/inspect", post(inspect_handler))
        .route("/api/inspect/batch", post(batch_inspect_handler))
        .route("/api/tx/:txid", get(inspect_get_handler))
        .route("/api/defaults", get(defaults_handler))
        // Health checks
        .route("/health", get(health_handler))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    use crate::analyzer::{FixtureAnalyzer, LinkabilityAnalyzer};
    use crate::cache::CacheConfig;
    use crate::config::ProviderKind;
    use crate::inspector::TxInspector;
    use crate::provider::{BlockchainProvider, InMemoryProvider};
    use crate::types::{AnalysisOutcome, IntrafeeBounds, LinkabilityMatrix, Transaction, TxoRef};

    fn txid(n: u8) -> String {
        format!("{:02x}", n).repeat(32)
    }

    fn state() -> ServiceState {
        let tx = Transaction::new(
            txid(1),
            vec![TxoRef::new("in0", 10_000), TxoRef::new("in1", 20_000)],
            vec![TxoRef::new("out0", 15_000), TxoRef::new("out1", 14_000)],
        );
        let outcome = AnalysisOutcome {
            matrix: Some(LinkabilityMatrix::from_rows(vec![vec![3, 3], vec![0, 3]]).unwrap()),
            nb_cmbn: 3,
            inputs: tx.inputs.clone(),
            outputs: tx.outputs.clone(),
            fees: 1_000,
            intrafee_bounds: IntrafeeBounds::default(),
            efficiency: Some(0.5),
        };

        let mut provider = InMemoryProvider::new();
        provider.add_tx(tx);
        let provider: Arc<dyn BlockchainProvider> = Arc::new(provider);
        let analyzer: Arc<dyn LinkabilityAnalyzer> =
            Arc::new(FixtureAnalyzer::new().with_outcome(txid(1), outcome));

        let inspector = TxInspector::new(provider, analyzer).with_cache(&CacheConfig::default());
        ServiceState::new(inspector, Network::Mainnet, ProviderKind::BlockchainInfo)
    }

    async fn send(request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = create_router(state()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_inspect() {
        let (status, json) = send(post_json("/api/inspect", serde_json::json!({"txid": txid(1)}))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["network"], "mainnet");
        assert_eq!(json["report"]["nb_cmbn"], 3);
        assert_eq!(json["report"]["status"], "computed");
        assert_eq!(json["report"]["deterministic_links"].as_array().unwrap().len(), 3);
        assert_eq!(json["elements"].as_array().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn test_inspect_get() {
        let request = Request::get(format!("/api/tx/{}?network=mainnet", txid(1)))
            .body(Body::empty())
            .unwrap();
        let (status, json) = send(request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["report"]["txid"], txid(1));
    }

    #[tokio::test]
    async fn test_inspect_not_found() {
        let (status, json) = send(post_json("/api/inspect", serde_json::json!({"txid": txid(7)}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["code"], "TX_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_error_carries_correlation_id_and_txid() {
        let app = create_router(state())
            .layer(axum::middleware::from_fn(crate::service::request_logging_middleware));
        let mut request = post_json("/api/inspect", serde_json::json!({"txid": txid(7)}));
        request
            .headers_mut()
            .insert(crate::service::TRACE_CONTEXT_HEADER, "trace42/7;o=1".parse().unwrap());

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(json["correlation_id"], "trace42");
        assert_eq!(json["details"], format!("txid {}", txid(7)));
    }

    #[tokio::test]
    async fn test_error_without_request_logging_has_no_correlation_id() {
        let (status, json) = send(post_json("/api/inspect", serde_json::json!({"txid": txid(7)}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(json.get("correlation_id").is_none());
    }

    #[test]
    fn test_inspector_error_status_mapping() {
        let fetch = InspectorError::Fetch(ProviderError::Network("refused".into()));
        let err = inspector_error(fetch, None, Some("ab"));
        assert_eq!(err.status, StatusCode::BAD_GATEWAY);
        assert_eq!(err.body.code, "FETCH_FAILED");
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);

        let violation = InspectorError::ContractViolation {
            txid: "cd".to_string(),
            violation: crate::types::ContractViolation::Efficiency(2.0),
        };
        let err = inspector_error(violation, Some(&CorrelationId("c1".into())), None);
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.body.details.as_deref(), Some("txid cd"));
        assert_eq!(err.body.correlation_id.as_deref(), Some("c1"));
    }

    #[tokio::test]
    async fn test_inspect_invalid_params() {
        let body = serde_json::json!({
            "txid": txid(1),
            "params": {"max_cj_intrafees_ratio": 150}
        });
        let (status, json) = send(post_json("/api/inspect", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "INVALID_PARAMS");
    }

    #[tokio::test]
    async fn test_batch_skips_missing() {
        let body = serde_json::json!({"txids": [txid(1), txid(7), txid(1)]});
        let (status, json) = send(post_json("/api/inspect/batch", body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["inspections"].as_array().unwrap().len(), 2);
        assert_eq!(json["skipped"][0]["txid"], txid(7));
        assert_eq!(json["inspections"][1]["cache_hit"], true);
    }

    #[tokio::test]
    async fn test_defaults() {
        let (status, json) = send(Request::get("/api/defaults").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["params"]["max_txos"], 12);
        assert_eq!(json["provider"], "blockchain_info");
        assert_eq!(json["available_options"].as_array().unwrap().len(), 5);
        assert_eq!(json["max_cj_intrafees_ratio_limit"], 99);
    }

    #[tokio::test]
    async fn test_health() {
        let (status, json) = send(Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["provider"], "in-memory provider");
        assert_eq!(json["cache"]["cap"], 1024);

        let (status, json) = send(Request::get("/health/ready").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["ready"], true);
    }
}
