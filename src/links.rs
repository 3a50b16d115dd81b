//! Deterministic link extraction.
//!
//! A pair `(input j, output i)` is deterministically linked when output `i`
//! is fed by input `j` in every valid combination, i.e. the matrix cell
//! equals `nb_cmbn` and is non-zero.
//!
//! ## Ordering
//!
//! Links are emitted outputs-major: outer loop over outputs in transaction
//! order, inner loop over inputs in transaction order. The projector assigns
//! vertical lanes by emission index, so this order is part of the contract.

use crate::types::{DeterministicLink, LinkabilityMatrix, TxoRef};

/// The deterministic-link predicate for a single cell.
#[inline]
pub fn is_deterministic(cell: u64, nb_cmbn: u64) -> bool {
    cell == nb_cmbn && cell != 0
}

/// Extract all deterministic links from a linkability matrix.
///
/// Returns an empty sequence when `matrix` is `None` (analysis skipped) or
/// when `nb_cmbn == 0`. Callers that need to tell "skipped" apart from "no
/// links" must check whether a matrix was present.
///
/// The matrix is expected to have been validated against `inputs` and
/// `outputs` (see [`LinkabilityMatrix::validate_against`]); cells outside the
/// txo lists are ignored.
pub fn extract_deterministic_links(
    matrix: Option<&LinkabilityMatrix>,
    nb_cmbn: u64,
    inputs: &[TxoRef],
    outputs: &[TxoRef],
) -> Vec<DeterministicLink> {
    let Some(matrix) = matrix else {
        return Vec::new();
    };
    if nb_cmbn == 0 {
        return Vec::new();
    }

    let mut links = Vec::new();
    for (i, output) in outputs.iter().enumerate() {
        let Some(row) = matrix.row(i) else {
            break;
        };
        for (j, input) in inputs.iter().enumerate() {
            match row.get(j) {
                Some(&cell) if is_deterministic(cell, nb_cmbn) => {
                    links.push(DeterministicLink::new(input.clone(), output.clone(), j, i));
                }
                Some(_) => {}
                None => break,
            }
        }
    }

    links
}
