//! Deterministic links.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::txo::TxoRef;

/// An input/output pair linked in every valid combination.
///
/// Carries the matrix indices it was read from so callers can map the link
/// back to the transaction without searching by address (addresses may repeat).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeterministicLink {
    /// The funding input.
    pub input: TxoRef,
    /// The funded output.
    pub output: TxoRef,
    /// Column index of the input in the matrix.
    pub input_index: usize,
    /// Row index of the output in the matrix.
    pub output_index: usize,
}

impl DeterministicLink {
    /// Create a new link.
    pub fn new(input: TxoRef, output: TxoRef, input_index: usize, output_index: usize) -> Self {
        Self {
            input,
            output,
            input_index,
            output_index,
        }
    }
}

impl fmt::Display for DeterministicLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} & {} are deterministically linked", self.input, self.output)
    }
}
