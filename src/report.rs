//! Per-transaction result record and its textual rendering.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::links::extract_deterministic_links;
use crate::metrics::TxMetrics;
use crate::types::{AnalysisOutcome, DeterministicLink, LinkabilityMatrix, TxoRef};

/// Whether a linkability matrix was computed for the transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkabilityStatus {
    /// A matrix was computed; an empty link list means "no deterministic links".
    Computed,
    /// No matrix (too many txos, time budget exceeded, or linkability not
    /// requested).
    Skipped,
}

/// Structured result for one analyzed transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxReport {
    /// Transaction id.
    pub txid: String,
    /// Inputs as analyzed.
    pub inputs: Vec<TxoRef>,
    /// Outputs as analyzed.
    pub outputs: Vec<TxoRef>,
    /// Derived metrics.
    #[serde(flatten)]
    pub metrics: TxMetrics,
    /// Raw wallet efficiency, kept for percentage display.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub efficiency: Option<f64>,
    /// Whether a matrix was computed.
    pub status: LinkabilityStatus,
    /// The matrix, when computed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkability: Option<LinkabilityMatrix>,
    /// Deterministic links, outputs-major.
    pub deterministic_links: Vec<DeterministicLink>,
}

impl TxReport {
    /// Interpret an analyzer outcome.
    ///
    /// The outcome is expected to have passed
    /// [`AnalysisOutcome::validate`].
    pub fn from_outcome(txid: impl Into<String>, outcome: AnalysisOutcome) -> Self {
        let metrics = TxMetrics::from_outcome(&outcome);
        let deterministic_links = extract_deterministic_links(
            outcome.matrix.as_ref(),
            outcome.nb_cmbn,
            &outcome.inputs,
            &outcome.outputs,
        );
        let status = if outcome.matrix.is_some() {
            LinkabilityStatus::Computed
        } else {
            LinkabilityStatus::Skipped
        };

        Self {
            txid: txid.into(),
            inputs: outcome.inputs,
            outputs: outcome.outputs,
            metrics,
            efficiency: outcome.efficiency,
            status,
            linkability: outcome.matrix,
            deterministic_links,
        }
    }

    /// Whether the analysis was skipped.
    pub fn is_skipped(&self) -> bool {
        self.status == LinkabilityStatus::Skipped
    }

    /// Transaction entropy in bits.
    pub fn entropy_bits(&self) -> Option<f64> {
        self.metrics.entropy_bits
    }
}

fn write_txos(f: &mut fmt::Formatter<'_>, txos: &[TxoRef]) -> fmt::Result {
    write!(f, "[")?;
    for (k, txo) in txos.iter().enumerate() {
        if k > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", txo)?;
    }
    write!(f, "]")
}

impl fmt::Display for TxReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Inputs = ")?;
        write_txos(f, &self.inputs)?;
        write!(f, "\nOutputs = ")?;
        write_txos(f, &self.outputs)?;
        writeln!(f)?;
        writeln!(f, "Fees = {} satoshis", self.metrics.fees)?;

        if let Some(bounds) = self.metrics.intrafee_bounds {
            writeln!(
                f,
                "Hypothesis: Max intrafees received by a participant = {} satoshis",
                bounds.max_received
            )?;
            writeln!(
                f,
                "Hypothesis: Max intrafees paid by a participant = {} satoshis",
                bounds.max_paid
            )?;
        }

        writeln!(f, "Nb combinations = {}", self.metrics.nb_cmbn)?;
        if let Some(bits) = self.metrics.entropy_bits {
            writeln!(f, "Tx entropy = {:.6} bits", bits)?;
        }
        if let (Some(e), Some(bits)) = (self.efficiency, self.metrics.efficiency_bits) {
            writeln!(f, "Wallet efficiency = {:.6}% ({:.6} bits)", e * 100.0, bits)?;
        }

        match &self.linkability {
            None => {
                if self.metrics.nb_cmbn == 0 {
                    writeln!(
                        f,
                        "Skipped processing of this transaction (too many inputs and/or outputs)"
                    )?;
                }
            }
            Some(matrix) => {
                match matrix.probabilities(self.metrics.nb_cmbn) {
                    Some(probabilities) => {
                        writeln!(f, "Linkability Matrix (probabilities) :")?;
                        for row in probabilities {
                            let cells: Vec<String> = row.iter().map(|p| format!("{:.4}", p)).collect();
                            writeln!(f, "[{}]", cells.join(" "))?;
                        }
                    }
                    None => {
                        writeln!(f, "Linkability Matrix (#combinations with link) :")?;
                        for row in matrix.rows() {
                            let cells: Vec<String> = row.iter().map(u64::to_string).collect();
                            writeln!(f, "[{}]", cells.join(" "))?;
                        }
                    }
                }

                writeln!(f, "Deterministic links :")?;
                for link in &self.deterministic_links {
                    writeln!(f, "{}", link)?;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IntrafeeBounds;

    fn outcome(matrix: Option<Vec<Vec<u64>>>, nb_cmbn: u64) -> AnalysisOutcome {
        AnalysisOutcome {
            matrix: matrix.map(|rows| LinkabilityMatrix::from_rows(rows).unwrap()),
            nb_cmbn,
            inputs: vec![TxoRef::new("i0", 10_000), TxoRef::new("i1", 20_000)],
            outputs: vec![TxoRef::new("o0", 15_000), TxoRef::new("o1", 14_000)],
            fees: 1_000,
            intrafee_bounds: IntrafeeBounds::default(),
            efficiency: None,
        }
    }

    #[test]
    fn test_computed_report() {
        let report = TxReport::from_outcome("tx", outcome(Some(vec![vec![3, 3], vec![0, 3]]), 3));
        assert_eq!(report.status, LinkabilityStatus::Computed);
        assert_eq!(report.deterministic_links.len(), 3);
        assert!(report.entropy_bits().is_some());
    }

    #[test]
    fn test_skipped_distinct_from_no_links() {
        let skipped = TxReport::from_outcome("tx", outcome(None, 0));
        let unlinked = TxReport::from_outcome("tx", outcome(Some(vec![vec![2, 1], vec![1, 2]]), 3));

        assert!(skipped.deterministic_links.is_empty());
        assert!(unlinked.deterministic_links.is_empty());
        assert!(skipped.is_skipped());
        assert!(!unlinked.is_skipped());
    }

    #[test]
    fn test_text_probabilities() {
        let mut o = outcome(Some(vec![vec![2, 2], vec![1, 2]]), 2);
        o.efficiency = Some(0.5);
        let text = TxReport::from_outcome("tx", o).to_string();

        assert!(text.contains("Fees = 1000 satoshis"));
        assert!(text.contains("Nb combinations = 2"));
        assert!(text.contains("Tx entropy = 1.000000 bits"));
        assert!(text.contains("Wallet efficiency = 50.000000% (-1.000000 bits)"));
        assert!(text.contains("Linkability Matrix (probabilities) :"));
        assert!(text.contains("[1.0000 1.0000]"));
        assert!(text.contains("(i0, 10000) & (o0, 15000) are deterministically linked"));
        assert!(!text.contains("Hypothesis"));
    }

    #[test]
    fn test_text_counts_when_no_combinations() {
        let text = TxReport::from_outcome("tx", outcome(Some(vec![vec![0, 0], vec![0, 0]]), 0)).to_string();
        assert!(text.contains("Linkability Matrix (#combinations with link) :"));
        assert!(!text.contains("Tx entropy"));
    }

    #[test]
    fn test_text_skipped_notice() {
        let text = TxReport::from_outcome("tx", outcome(None, 0)).to_string();
        assert!(text.contains("Skipped processing of this transaction"));
        assert!(!text.contains("Deterministic links"));
    }

    #[test]
    fn test_text_intrafees() {
        let mut o = outcome(None, 0);
        o.intrafee_bounds = IntrafeeBounds::new(500, 700);
        let text = TxReport::from_outcome("tx", o).to_string();
        assert!(text.contains("received by a participant = 500 satoshis"));
        assert!(text.contains("paid by a participant = 700 satoshis"));
    }

    #[test]
    fn test_coinbase_matrix_keeps_output_rows() {
        let mut o = outcome(None, 1);
        o.inputs.clear();
        o.matrix = Some(LinkabilityMatrix::zeros(2, 0));
        let report = TxReport::from_outcome("tx", o);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["linkability"], serde_json::json!([[], []]));
        assert_eq!(report.to_string().lines().filter(|l| *l == "[]").count(), 2);
    }

    #[test]
    fn test_json_shape() {
        let report = TxReport::from_outcome("tx", outcome(None, 0));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["fees"], 1000);
        assert_eq!(json["status"], "skipped");
        assert!(json.get("entropy_bits").is_none());
        assert!(json.get("linkability").is_none());
        assert_eq!(json["deterministic_links"].as_array().unwrap().len(), 0);
    }
}
