//! # tx-entropy-kernel
//!
//! Interpretation of combinatorial linkability results for Bitcoin
//! transactions.
//!
//! The kernel answers one question:
//!
//! > Given the linkability matrix of a transaction, which inputs and outputs
//! > are **certainly** connected, and how ambiguous is the rest?
//!
//! ## Core Contract
//!
//! 1. Derive entropy and wallet-efficiency metrics from the combination count
//! 2. Extract every deterministic link (a cell equal to the combination count)
//! 3. Project the links into renderable graph elements
//!
//! ## Architecture
//!
//! ```text
//! txid → BlockchainProvider → Transaction → LinkabilityAnalyzer → AnalysisOutcome
//!                                                                      ↓
//!                       TxInspection ← GraphElements ← Links ← TxReport (metrics)
//! ```
//!
//! Metric derivation, link extraction and graph projection are pure,
//! synchronous functions. Fetching and combinatorial search live behind the
//! [`BlockchainProvider`] and [`LinkabilityAnalyzer`] traits.
//!
//! ## Determinism Guarantees
//!
//! - Links are emitted outputs-major, inputs-minor
//! - Same links → same graph elements, in the same order
//! - Absent metrics stay absent; nothing is clamped or defaulted

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod config;
pub mod canonical;
pub mod metrics;
pub mod links;
pub mod projector;
pub mod report;
pub mod provider;
pub mod analyzer;
pub mod cache;
pub mod inspector;
pub mod batch;
pub mod logging;

#[cfg(feature = "service")]
pub mod service;

// Re-exports
pub use types::{
    is_valid_txid, AnalysisOutcome, ContractViolation, DeterministicLink, GraphEdge,
    GraphElement, GraphNode, IntrafeeBounds, LinkabilityMatrix, MatrixError, Transaction,
    TxoRef, DETERMINISTIC_EDGE_CLASS, LINKED_INPUT_CLASS,
};
pub use config::{
    parse_options, AnalysisOption, AnalysisOptions, AnalysisParams, Network, ParamsError,
    ProviderKind, ServiceConfig,
};
pub use canonical::{canonical_hash, canonical_hash_hex, to_canonical_bytes};
pub use metrics::{efficiency_bits, entropy_bits, TxMetrics};
pub use links::{extract_deterministic_links, is_deterministic};
pub use projector::{project_links, project_links_with_layout, GraphLayout};
pub use report::{LinkabilityStatus, TxReport};
pub use provider::{BlockchainProvider, InMemoryProvider, ProviderError};
#[cfg(feature = "providers")]
pub use provider::{build_provider, BitcoindRpcProvider, BlockchainInfoProvider, SmartbitProvider};
pub use analyzer::{AnalyzerError, FixtureAnalyzer, LinkabilityAnalyzer};
#[cfg(feature = "runtime")]
pub use analyzer::CommandAnalyzer;
pub use cache::{AnalysisKey, CacheConfig, CacheStats, ReportCache};
pub use inspector::{interpret, InspectorError, TxInspection, TxInspector};
pub use batch::{BatchInspection, BatchInspector, SkippedTx};

// Service re-exports (when service feature is enabled)
#[cfg(feature = "service")]
pub use service::{create_router, ServiceState};

/// Schema version of the report and graph element JSON.
/// Increment on breaking changes to any serialized type.
pub const TX_ENTROPY_SCHEMA_VERSION: &str = "1.0.0";
