//! Batch inspection across many transaction ids.
//!
//! Transactions are processed sequentially and independently, in request
//! order. A fetch failure skips that id (logged and recorded in
//! [`BatchInspection::skipped`]) and processing continues. Any other error
//! (invalid parameters, analyzer failure, contract violation) aborts the
//! batch, since it points at a bug rather than a runtime condition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::analyzer::LinkabilityAnalyzer;
use crate::config::{AnalysisParams, Network};
use crate::inspector::{InspectorError, TxInspection, TxInspector};
use crate::provider::BlockchainProvider;

/// A transaction omitted from a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedTx {
    /// The requested id.
    pub txid: String,
    /// Why it was skipped.
    pub reason: String,
}

/// Result of a batch inspection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchInspection {
    /// Hash of the parameters every transaction was analyzed with.
    pub params_hash: String,
    /// Network the ids were resolved on.
    pub network: Network,
    /// Successful inspections, in request order.
    pub inspections: Vec<TxInspection>,
    /// Ids that could not be fetched, in request order.
    pub skipped: Vec<SkippedTx>,
    /// When processing started.
    pub started_at: DateTime<Utc>,
    /// When processing finished.
    pub finished_at: DateTime<Utc>,
}

impl BatchInspection {
    /// Txids of the successful inspections.
    pub fn txids(&self) -> Vec<&str> {
        self.inspections
            .iter()
            .map(|i| i.report.txid.as_str())
            .collect()
    }

    /// Get the inspection of a txid.
    pub fn get(&self, txid: &str) -> Option<&TxInspection> {
        self.inspections.iter().find(|i| i.report.txid == txid)
    }
}

/// Batch inspector.
pub struct BatchInspector<'a, P: ?Sized, A: ?Sized> {
    inspector: &'a TxInspector<P, A>,
}

impl<'a, P, A> BatchInspector<'a, P, A>
where
    P: BlockchainProvider + ?Sized,
    A: LinkabilityAnalyzer + ?Sized,
{
    /// Wrap an inspector.
    pub fn new(inspector: &'a TxInspector<P, A>) -> Self {
        Self { inspector }
    }

    /// Inspect all ids.
    pub async fn inspect_all<S: AsRef<str>>(
        &self,
        txids: &[S],
        network: Network,
        params: &AnalysisParams,
    ) -> Result<BatchInspection, InspectorError> {
        params.validate()?;

        let started_at = Utc::now();
        let mut inspections = Vec::with_capacity(txids.len());
        let mut skipped = Vec::new();

        for txid in txids {
            let txid: &str = txid.as_ref();
            match self.inspector.inspect(txid, network, params).await {
                Ok(inspection) => inspections.push(inspection),
                Err(InspectorError::Fetch(e)) => {
                    warn!(txid = %txid, error = %e, "unable to retrieve transaction, skipping");
                    skipped.push(SkippedTx {
                        txid: txid.to_string(),
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            requested = txids.len(),
            inspected = inspections.len(),
            skipped = skipped.len(),
            "batch complete"
        );

        Ok(BatchInspection {
            params_hash: params.params_hash(),
            network,
            inspections,
            skipped,
            started_at,
            finished_at: Utc::now(),
        })
    }
}
