//! Per-transaction inspection pipeline.
//!
//! The inspector fetches a transaction, hands it to the analyzer, checks the
//! outcome against its contract and interprets it into a [`TxReport`] plus
//! the graph elements for its deterministic links.
//!
//! ## Pipeline
//!
//! 1. Validate parameters
//! 2. Consult the report cache (if enabled)
//! 3. Fetch the transaction from the provider
//! 4. Run the analyzer under the caller's time budget
//! 5. Validate the outcome (matrix shape, cell bounds, efficiency)
//! 6. Derive metrics, extract links, project the graph
//!
//! Every invocation carries all of its parameters; the inspector holds no
//! per-request state.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::analyzer::{AnalyzerError, LinkabilityAnalyzer};
use crate::cache::{AnalysisKey, CacheConfig, CacheStats, ReportCache};
use crate::config::{AnalysisOption, AnalysisParams, Network, ParamsError};
use crate::projector::project_links;
use crate::provider::{BlockchainProvider, ProviderError};
use crate::report::TxReport;
use crate::types::{AnalysisOutcome, ContractViolation, GraphElement, Transaction};

/// Error type for inspection.
#[derive(Debug, thiserror::Error)]
pub enum InspectorError {
    /// Request parameters are out of range.
    #[error("Invalid parameters: {0}")]
    InvalidParams(#[from] ParamsError),
    /// The transaction could not be fetched.
    #[error("Fetch failed: {0}")]
    Fetch(#[from] ProviderError),
    /// The analyzer failed to produce an outcome.
    #[error("Analyzer failed: {0}")]
    Analyzer(#[from] AnalyzerError),
    /// The analyzer produced an outcome that breaks its contract.
    #[error("Contract violation for {txid}: {violation}")]
    ContractViolation {
        /// Transaction being analyzed.
        txid: String,
        /// What was wrong.
        violation: ContractViolation,
    },
}

impl InspectorError {
    /// Whether this is a recoverable fetch failure (batches skip these).
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, Self::Fetch(_))
    }
}

/// Interpreted result for one transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxInspection {
    /// The structured report.
    pub report: TxReport,
    /// Graph elements for the deterministic links.
    pub elements: Vec<GraphElement>,
    /// Whether the report came from the cache.
    #[serde(default)]
    pub cache_hit: bool,
}

impl TxInspection {
    fn from_report(report: TxReport, cache_hit: bool) -> Self {
        let elements = project_links(&report.deterministic_links);
        Self {
            report,
            elements,
            cache_hit,
        }
    }
}

/// Validate and interpret an analyzer outcome.
///
/// This is the synchronous core of the pipeline: no I/O, no state.
pub fn interpret(txid: &str, outcome: AnalysisOutcome) -> Result<TxInspection, InspectorError> {
    outcome
        .validate()
        .map_err(|violation| InspectorError::ContractViolation {
            txid: txid.to_string(),
            violation,
        })?;
    Ok(TxInspection::from_report(
        TxReport::from_outcome(txid, outcome),
        false,
    ))
}

/// Transaction inspector.
///
/// Generic over the provider and analyzer so tests can run the full pipeline
/// against in-memory implementations; both may be trait objects.
pub struct TxInspector<P: ?Sized, A: ?Sized> {
    provider: Arc<P>,
    analyzer: Arc<A>,
    cache: Option<ReportCache>,
}

impl<P, A> TxInspector<P, A>
where
    P: BlockchainProvider + ?Sized,
    A: LinkabilityAnalyzer + ?Sized,
{
    /// Create an inspector without a result cache.
    pub fn new(provider: Arc<P>, analyzer: Arc<A>) -> Self {
        Self {
            provider,
            analyzer,
            cache: None,
        }
    }

    /// Enable the result cache.
    pub fn with_cache(mut self, config: &CacheConfig) -> Self {
        self.cache = ReportCache::new(config);
        self
    }

    /// Get the provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Get the analyzer.
    pub fn analyzer(&self) -> &A {
        &self.analyzer
    }

    /// Cache statistics, `None` if caching is disabled.
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(ReportCache::stats)
    }

    /// Fetch, analyze and interpret one transaction.
    pub async fn inspect(
        &self,
        txid: &str,
        network: Network,
        params: &AnalysisParams,
    ) -> Result<TxInspection, InspectorError> {
        params.validate()?;

        let key = AnalysisKey::compute(txid, network, params);
        if let Some(report) = self.cache.as_ref().and_then(|c| c.get(&key)) {
            debug!(txid = %txid, "report cache hit");
            return Ok(TxInspection::from_report(report, true));
        }

        let tx = self.provider.get_tx(txid, network).await?;
        debug!(
            txid = %txid,
            provider = self.provider.descriptor(),
            inputs = tx.inputs.len(),
            outputs = tx.outputs.len(),
            "transaction fetched"
        );

        let inspection = self.inspect_tx(&tx, params).await?;

        if let Some(cache) = &self.cache {
            cache.put(key, inspection.report.clone());
        }

        Ok(inspection)
    }

    /// Analyze and interpret an already-fetched transaction.
    ///
    /// Bypasses the cache, which is keyed on txid and cannot vouch for
    /// caller-supplied transaction contents.
    pub async fn inspect_tx(
        &self,
        tx: &Transaction,
        params: &AnalysisParams,
    ) -> Result<TxInspection, InspectorError> {
        params.validate()?;

        let outcome = self.analyzer.analyze(tx, params).await?;

        if outcome.matrix.is_some() && !params.options.contains(AnalysisOption::Linkability) {
            debug!(
                txid = %tx.txid,
                "matrix supplied without LINKABILITY, interpreting it as given"
            );
        }

        let inspection = interpret(&tx.txid, outcome)?;

        info!(
            txid = %tx.txid,
            analyzer = self.analyzer.descriptor(),
            status = ?inspection.report.status,
            nb_cmbn = inspection.report.metrics.nb_cmbn,
            deterministic_links = inspection.report.deterministic_links.len(),
            "transaction inspected"
        );

        Ok(inspection)
    }
}
