//! Combinatorial linkability analyzers.
//!
//! The analyzer is the collaborator that enumerates the valid input/output
//! mappings of a transaction. This crate only interprets its result, so the
//! analyzer sits behind a trait: tests script outcomes with
//! [`FixtureAnalyzer`], production runs an external program through
//! [`CommandAnalyzer`].

pub mod fixture;

#[cfg(feature = "runtime")]
pub mod command;

use async_trait::async_trait;

use crate::config::AnalysisParams;
use crate::types::{AnalysisOutcome, Transaction};

/// Error type for analyzer operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalyzerError {
    /// No analyzer program was configured.
    #[error("No analyzer command configured")]
    NotConfigured,
    /// The analyzer process could not be started.
    #[error("Failed to spawn analyzer: {0}")]
    Spawn(String),
    /// Reading from or writing to the analyzer failed.
    #[error("Analyzer I/O error: {0}")]
    Io(String),
    /// The analyzer exited unsuccessfully.
    #[error("Analyzer exited with status {status:?}: {stderr}")]
    Failed {
        /// Exit code, if the process was not killed by a signal.
        status: Option<i32>,
        /// Captured standard error.
        stderr: String,
    },
    /// The analyzer produced output that could not be decoded.
    #[error("Failed to decode analyzer output: {0}")]
    Decode(String),
}

/// Trait for combinatorial analyzers.
#[async_trait]
pub trait LinkabilityAnalyzer: Send + Sync {
    /// Analyze a transaction under the given parameters.
    ///
    /// Exceeding `params.max_duration()` is not an error: implementations
    /// return [`AnalysisOutcome::skipped`] instead.
    async fn analyze(
        &self,
        tx: &Transaction,
        params: &AnalysisParams,
    ) -> Result<AnalysisOutcome, AnalyzerError>;

    /// Short description used in logs.
    fn descriptor(&self) -> &str;
}

pub use fixture::FixtureAnalyzer;

#[cfg(feature = "runtime")]
pub use command::CommandAnalyzer;
