//! Linkability Inspection Service Binary
//!
//! Runs the inspector as a REST API service:
//! - Structured JSON logging for Cloud Logging
//! - Request tracing with correlation IDs
//! - Graceful shutdown handling
//! - Health check endpoints
//!
//! ## Configuration
//!
//! Environment variables:
//! - `TX_ENTROPY_ANALYZER_CMD`: Analyzer program and arguments (required)
//! - `TX_ENTROPY_PROVIDER`: rpc, blockchain_info or smartbit (default: blockchain_info)
//! - `TX_ENTROPY_NETWORK`: mainnet or testnet (default: mainnet)
//! - `TX_ENTROPY_CACHE_ENTRIES`: Report cache capacity, 0 disables (default: 1024)
//! - `PORT`: Service port (default: 8002)
//! - `HOST`: Service host (default: 0.0.0.0)
//! - `RUST_LOG`: Log level filter (default: info)
//! - `LOG_FORMAT`: "json" for structured logs, "pretty" for development (default: json)
//!
//! ## Usage
//!
//! ```bash
//! TX_ENTROPY_ANALYZER_CMD="ludwig --json" cargo run --bin tx_entropy_service --features service
//! ```

use std::net::SocketAddr;

use axum::middleware;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use tx_entropy_kernel::logging::{init_tracing, LogFormat};
use tx_entropy_kernel::service::{
    create_router, metrics_middleware, request_logging_middleware, ServiceState,
};
use tx_entropy_kernel::ServiceConfig;

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown"),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown"),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing(
        "tx_entropy=info,tx_entropy_service=info,tx_entropy_kernel=info,tower_http=info",
        LogFormat::Json,
    );

    let version = env!("CARGO_PKG_VERSION");
    let build_sha = option_env!("BUILD_SHA").unwrap_or("dev");

    info!(
        version = version,
        build_sha = build_sha,
        "Starting Linkability Inspection Service"
    );

    let config = ServiceConfig::from_env();

    let state = match ServiceState::from_config(&config) {
        Ok(state) => state,
        Err(e) => {
            error!(error = %e, "Failed to initialize service state");
            return Err(e.into());
        }
    };

    info!(
        provider = %config.provider,
        network = %config.network,
        analyzer = %config.analyzer_cmd.join(" "),
        cache_entries = config.cache_entries,
        "Inspector initialized"
    );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!(
        address = %addr,
        version = version,
        "Linkability Inspection Service listening"
    );

    let listener = TcpListener::bind(addr).await?;

    info!("Ready to accept connections");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Linkability Inspection Service shutdown complete");

    Ok(())
}
