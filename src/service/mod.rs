//! Linkability inspection REST service.
//!
//! ## Endpoints
//!
//! - `POST /api/inspect` - Inspect one transaction
//! - `POST /api/inspect/batch` - Inspect several transactions, skipping unreachable ones
//! - `GET /api/tx/:txid` - Inspect one transaction with default parameters
//! - `GET /api/defaults` - Default parameters and accepted option names
//! - `GET /health` - Detailed service health check
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe

pub mod middleware;
pub mod routes;
pub mod state;

pub use middleware::{
    metrics_middleware, record_batch_metrics, record_inspection_metrics,
    request_logging_middleware, CorrelationId, TRACE_CONTEXT_HEADER,
};
pub use routes::{create_router, ApiError, ErrorResponse};
pub use state::{DynInspector, ServiceInitError, ServiceState};
