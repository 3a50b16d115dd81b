//! Entropy metric derivation.
//!
//! Metrics that cannot be computed are absent (`None`), never clamped or
//! defaulted.

use serde::{Deserialize, Serialize};

use crate::types::{AnalysisOutcome, IntrafeeBounds};

/// Transaction entropy in bits, `log2(nb_cmbn)`, when `nb_cmbn > 0`.
pub fn entropy_bits(nb_cmbn: u64) -> Option<f64> {
    if nb_cmbn > 0 {
        Some((nb_cmbn as f64).log2())
    } else {
        None
    }
}

/// Wallet efficiency in bits, `log2(efficiency)`, when present and positive.
pub fn efficiency_bits(efficiency: Option<f64>) -> Option<f64> {
    match efficiency {
        Some(e) if e > 0.0 => Some(e.log2()),
        _ => None,
    }
}

/// Metrics derived from one analysis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TxMetrics {
    /// Fees in satoshis.
    pub fees: u64,
    /// Number of valid combinations.
    pub nb_cmbn: u64,
    /// `log2(nb_cmbn)`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entropy_bits: Option<f64>,
    /// `log2(efficiency)`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub efficiency_bits: Option<f64>,
    /// Intrafee hypothesis, only when both bounds are non-zero.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intrafee_bounds: Option<IntrafeeBounds>,
}

impl TxMetrics {
    /// Derive metrics from raw values.
    pub fn derive(
        nb_cmbn: u64,
        efficiency: Option<f64>,
        fees: u64,
        intrafee_bounds: IntrafeeBounds,
    ) -> Self {
        Self {
            fees,
            nb_cmbn,
            entropy_bits: entropy_bits(nb_cmbn),
            efficiency_bits: efficiency_bits(efficiency),
            intrafee_bounds: intrafee_bounds.is_present().then_some(intrafee_bounds),
        }
    }

    /// Derive metrics from an analyzer outcome.
    pub fn from_outcome(outcome: &AnalysisOutcome) -> Self {
        Self::derive(
            outcome.nb_cmbn,
            outcome.efficiency,
            outcome.fees,
            outcome.intrafee_bounds,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entropy_bits() {
        assert_eq!(entropy_bits(1), Some(0.0));
        assert_eq!(entropy_bits(8), Some(3.0));
        assert!((entropy_bits(3).unwrap() - 1.584_962_500_721_156).abs() < 1e-12);
        assert_eq!(entropy_bits(0), None);
    }

    #[test]
    fn test_efficiency_bits() {
        assert_eq!(efficiency_bits(Some(0.5)), Some(-1.0));
        assert_eq!(efficiency_bits(Some(1.0)), Some(0.0));
        assert_eq!(efficiency_bits(Some(0.0)), None);
        assert_eq!(efficiency_bits(Some(-0.2)), None);
        assert_eq!(efficiency_bits(None), None);
    }

    #[test]
    fn test_derive_passes_through_fees() {
        let m = TxMetrics::derive(0, None, 2_500, IntrafeeBounds::default());
        assert_eq!(m.fees, 2_500);
        assert!(m.entropy_bits.is_none());
        assert!(m.efficiency_bits.is_none());
        assert!(m.intrafee_bounds.is_none());
    }

    #[test]
    fn test_derive_intrafees_need_both_bounds() {
        let half = TxMetrics::derive(4, Some(0.25), 0, IntrafeeBounds::new(100, 0));
        assert!(half.intrafee_bounds.is_none());
        assert_eq!(half.entropy_bits, Some(2.0));
        assert_eq!(half.efficiency_bits, Some(-2.0));

        let both = TxMetrics::derive(4, None, 0, IntrafeeBounds::new(100, 200));
        assert_eq!(both.intrafee_bounds, Some(IntrafeeBounds::new(100, 200)));
    }

    #[test]
    fn test_absent_metrics_are_not_serialized() {
        let m = TxMetrics::derive(0, None, 10, IntrafeeBounds::default());
        let json = serde_json::to_value(m).unwrap();
        assert!(json.get("entropy_bits").is_none());
        assert_eq!(json["fees"], 10);
    }
}
