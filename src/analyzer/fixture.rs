//! Scripted analyzer for tests and demos.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::config::AnalysisParams;
use crate::types::{AnalysisOutcome, Transaction};
use super::{AnalyzerError, LinkabilityAnalyzer};

/// Analyzer returning pre-recorded outcomes keyed by txid.
///
/// Transactions without a recorded outcome are reported as skipped, the same
/// state a real analyzer reports when it gives up.
#[derive(Debug, Clone, Default)]
pub struct FixtureAnalyzer {
    outcomes: BTreeMap<String, AnalysisOutcome>,
    failures: BTreeMap<String, AnalyzerError>,
}

impl FixtureAnalyzer {
    /// Create an analyzer with no recorded outcomes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome for `txid`.
    pub fn add_outcome(&mut self, txid: impl Into<String>, outcome: AnalysisOutcome) {
        self.outcomes.insert(txid.into(), outcome);
    }

    /// Builder form of [`add_outcome`](Self::add_outcome).
    pub fn with_outcome(mut self, txid: impl Into<String>, outcome: AnalysisOutcome) -> Self {
        self.add_outcome(txid, outcome);
        self
    }

    /// Make every analysis of `txid` fail with `error`.
    pub fn fail_with(&mut self, txid: impl Into<String>, error: AnalyzerError) {
        self.failures.insert(txid.into(), error);
    }
}

#[async_trait]
impl LinkabilityAnalyzer for FixtureAnalyzer {
    async fn analyze(
        &self,
        tx: &Transaction,
        _params: &AnalysisParams,
    ) -> Result<AnalysisOutcome, AnalyzerError> {
        if let Some(error) = self.failures.get(&tx.txid) {
            return Err(error.clone());
        }
        Ok(self
            .outcomes
            .get(&tx.txid)
            .cloned()
            .unwrap_or_else(|| AnalysisOutcome::skipped(tx)))
    }

    fn descriptor(&self) -> &str {
        "fixture analyzer"
    }
}
