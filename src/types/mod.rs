//! Core types for the entropy kernel.

pub mod txo;
pub mod matrix;
pub mod link;
pub mod graph;
pub mod analysis;

pub use txo::{TxoRef, Transaction, is_valid_txid};
pub use matrix::{LinkabilityMatrix, MatrixError};
pub use link::DeterministicLink;
pub use graph::{
    GraphElement, GraphNode, GraphEdge, NodeData, EdgeData, Position,
    LINKED_INPUT_CLASS, DETERMINISTIC_EDGE_CLASS,
};
pub use analysis::{AnalysisOutcome, IntrafeeBounds, ContractViolation};
