//! Analyzer outcome types.

use serde::{Deserialize, Serialize};

use super::matrix::{LinkabilityMatrix, MatrixError};
use super::txo::{Transaction, TxoRef};

/// Hypothesized side-payments between coinjoin participants.
///
/// Serialized as `[max_received, max_paid]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(u64, u64)", into = "(u64, u64)")]
pub struct IntrafeeBounds {
    /// Max intrafees received by a participant, in satoshis.
    pub max_received: u64,
    /// Max intrafees paid by a participant, in satoshis.
    pub max_paid: u64,
}

impl IntrafeeBounds {
    /// Create new bounds.
    pub fn new(max_received: u64, max_paid: u64) -> Self {
        Self {
            max_received,
            max_paid,
        }
    }

    /// Bounds are only meaningful when both sides are non-zero.
    pub fn is_present(&self) -> bool {
        self.max_received > 0 && self.max_paid > 0
    }
}

impl From<(u64, u64)> for IntrafeeBounds {
    fn from((max_received, max_paid): (u64, u64)) -> Self {
        Self::new(max_received, max_paid)
    }
}

impl From<IntrafeeBounds> for (u64, u64) {
    fn from(b: IntrafeeBounds) -> Self {
        (b.max_received, b.max_paid)
    }
}

/// Violation of the analyzer's output contract.
///
/// These indicate a collaborator bug and are reported, never coerced.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ContractViolation {
    /// Matrix shape or cell bound is wrong.
    #[error("Invalid linkability matrix: {0}")]
    Matrix(#[from] MatrixError),
    /// Efficiency is NaN, infinite or above 1.
    #[error("Invalid wallet efficiency: {0}")]
    Efficiency(f64),
}

/// Raw result of a combinatorial analysis.
///
/// Field names on the wire follow the analyzer's own output (`mat_lnk`,
/// `intrafees`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    /// Linkability matrix; `None` when analysis was skipped.
    #[serde(rename = "mat_lnk", default)]
    pub matrix: Option<LinkabilityMatrix>,
    /// Number of valid combinations found.
    pub nb_cmbn: u64,
    /// Inputs as analyzed (possibly merged).
    pub inputs: Vec<TxoRef>,
    /// Outputs as analyzed (possibly merged).
    pub outputs: Vec<TxoRef>,
    /// Fees in satoshis.
    pub fees: u64,
    /// Intrafee hypothesis.
    #[serde(rename = "intrafees", default)]
    pub intrafee_bounds: IntrafeeBounds,
    /// Wallet efficiency in `(0, 1]`.
    #[serde(default)]
    pub efficiency: Option<f64>,
}

impl AnalysisOutcome {
    /// The "skipped" terminal state for a transaction: no matrix, no
    /// combinations, txos and fees taken from the transaction itself.
    pub fn skipped(tx: &Transaction) -> Self {
        Self {
            matrix: None,
            nb_cmbn: 0,
            inputs: tx.inputs.clone(),
            outputs: tx.outputs.clone(),
            fees: tx.fees(),
            intrafee_bounds: IntrafeeBounds::default(),
            efficiency: None,
        }
    }

    /// Whether the analyzer skipped this transaction.
    pub fn is_skipped(&self) -> bool {
        self.matrix.is_none()
    }

    /// Check the outcome against its own contract.
    pub fn validate(&self) -> Result<(), ContractViolation> {
        if let Some(matrix) = &self.matrix {
            matrix.validate_against(self.nb_cmbn, self.inputs.len(), self.outputs.len())?;
        }
        if let Some(e) = self.efficiency {
            if !e.is_finite() || e > 1.0 {
                return Err(ContractViolation::Efficiency(e));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(rows: Vec<Vec<u64>>, nb_cmbn: u64) -> AnalysisOutcome {
        AnalysisOutcome {
            matrix: Some(LinkabilityMatrix::from_rows(rows).unwrap()),
            nb_cmbn,
            inputs: vec![TxoRef::new("i0", 10), TxoRef::new("i1", 20)],
            outputs: vec![TxoRef::new("o0", 15), TxoRef::new("o1", 14)],
            fees: 1,
            intrafee_bounds: IntrafeeBounds::default(),
            efficiency: None,
        }
    }

    #[test]
    fn test_intrafee_presence() {
        assert!(IntrafeeBounds::new(1, 1).is_present());
        assert!(!IntrafeeBounds::new(0, 5).is_present());
        assert!(!IntrafeeBounds::new(5, 0).is_present());
    }

    #[test]
    fn test_validate_ok() {
        assert!(outcome(vec![vec![3, 3], vec![0, 3]], 3).validate().is_ok());
    }

    #[test]
    fn test_validate_shape_mismatch() {
        let o = outcome(vec![vec![3, 3, 3], vec![0, 3, 3]], 3);
        assert!(matches!(
            o.validate(),
            Err(ContractViolation::Matrix(MatrixError::ShapeMismatch { .. }))
        ));
    }

    #[test]
    fn test_validate_efficiency() {
        let mut o = outcome(vec![vec![1, 0], vec![0, 1]], 1);
        o.efficiency = Some(f64::NAN);
        assert!(matches!(o.validate(), Err(ContractViolation::Efficiency(_))));

        o.efficiency = Some(1.5);
        assert!(o.validate().is_err());

        // Non-positive efficiency is a degenerate metric, not a violation
        o.efficiency = Some(0.0);
        assert!(o.validate().is_ok());
    }

    #[test]
    fn test_skipped_from_tx() {
        let tx = Transaction::new(
            "ab".repeat(32),
            vec![TxoRef::new("a", 100)],
            vec![TxoRef::new("b", 90)],
        );
        let o = AnalysisOutcome::skipped(&tx);
        assert!(o.is_skipped());
        assert_eq!(o.nb_cmbn, 0);
        assert_eq!(o.fees, 10);
        assert!(o.validate().is_ok());
    }

    #[test]
    fn test_wire_format() {
        let json = r#"{
            "mat_lnk": [[1, 0], [0, 1]],
            "nb_cmbn": 1,
            "inputs": [{"address": "a", "value": 5}, {"address": "b", "value": 6}],
            "outputs": [{"address": "c", "value": 5}, {"address": "d", "value": 5}],
            "fees": 1,
            "intrafees": [0, 0],
            "efficiency": null
        }"#;
        let o: AnalysisOutcome = serde_json::from_str(json).unwrap();
        assert_eq!(o.matrix.as_ref().unwrap().shape(), (2, 2));
        assert_eq!(o.intrafee_bounds, IntrafeeBounds::new(0, 0));

        let skipped = r#"{"mat_lnk": null, "nb_cmbn": 0, "inputs": [], "outputs": [], "fees": 0}"#;
        let o: AnalysisOutcome = serde_json::from_str(skipped).unwrap();
        assert!(o.is_skipped());
    }
}
