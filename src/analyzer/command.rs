//! Subprocess-backed analyzer.
//!
//! ## Protocol
//!
//! The program receives one JSON document on stdin:
//!
//! ```json
//! {"tx": {...}, "options": ["PRECHECK", "LINKABILITY"], "max_duration": 600,
//!  "max_txos": 12, "max_cj_intrafees_ratio": 0.0}
//! ```
//!
//! and writes one [`AnalysisOutcome`] document on stdout. The ratio is sent
//! as a fraction in `[0, 0.99]`.
//!
//! ## Time Budget
//!
//! The process gets `max_duration` plus a grace period to answer. When the
//! budget elapses the process is killed and the transaction is reported as
//! skipped.

use std::io;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::{AnalysisOptions, AnalysisParams};
use crate::types::{AnalysisOutcome, Transaction};
use super::{AnalyzerError, LinkabilityAnalyzer};

/// Extra time granted on top of the analysis budget for process start-up and
/// serialization.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize)]
struct AnalyzerRequest<'a> {
    tx: &'a Transaction,
    options: &'a AnalysisOptions,
    max_duration: u64,
    max_txos: usize,
    max_cj_intrafees_ratio: f64,
}

/// Analyzer that runs an external program per transaction.
#[derive(Debug, Clone)]
pub struct CommandAnalyzer {
    program: String,
    args: Vec<String>,
    grace_period: Duration,
}

impl CommandAnalyzer {
    /// Create an analyzer running `program` with `args`.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }

    /// Create from a command line: program followed by its arguments.
    pub fn from_command_line<S: AsRef<str>>(words: &[S]) -> Result<Self, AnalyzerError> {
        let (program, args) = words.split_first().ok_or(AnalyzerError::NotConfigured)?;
        let program: &str = program.as_ref();
        let args = args
            .iter()
            .map(|a| {
                let a: &str = a.as_ref();
                a.to_string()
            })
            .collect();
        Ok(Self::new(program, args))
    }

    /// Override the grace period.
    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// The program being run.
    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl LinkabilityAnalyzer for CommandAnalyzer {
    async fn analyze(
        &self,
        tx: &Transaction,
        params: &AnalysisParams,
    ) -> Result<AnalysisOutcome, AnalyzerError> {
        let request = AnalyzerRequest {
            tx,
            options: &params.options,
            max_duration: params.max_duration_secs,
            max_txos: params.max_txos,
            max_cj_intrafees_ratio: params.intrafees_ratio_fraction(),
        };
        let payload =
            serde_json::to_vec(&request).map_err(|e| AnalyzerError::Io(e.to_string()))?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AnalyzerError::Spawn(format!("{}: {}", self.program, e)))?;

        debug!(txid = %tx.txid, program = %self.program, "analyzer started");

        // Feed stdin while stdout and stderr are drained, so an analyzer that
        // writes before it has read all of its input cannot fill both pipes.
        let stdin = child.stdin.take();
        let writer = tokio::spawn(async move {
            if let Some(mut stdin) = stdin {
                stdin.write_all(&payload).await?;
                stdin.shutdown().await?;
            }
            Ok::<_, io::Error>(())
        });

        // Dropping this future drops the child, which kills it
        let run = async move {
            let output = child.wait_with_output().await?;
            match writer.await {
                Ok(Ok(())) => {}
                // the analyzer may exit without consuming all of its input
                Ok(Err(e)) if e.kind() == io::ErrorKind::BrokenPipe => {}
                Ok(Err(e)) => return Err(e),
                Err(e) => return Err(io::Error::new(io::ErrorKind::Other, e)),
            }
            Ok(output)
        };

        let budget = params.max_duration() + self.grace_period;
        let output = match tokio::time::timeout(budget, run).await {
            Err(_) => {
                warn!(
                    txid = %tx.txid,
                    budget_ms = budget.as_millis() as u64,
                    "analyzer exceeded its time budget, skipping"
                );
                return Ok(AnalysisOutcome::skipped(tx));
            }
            Ok(result) => result.map_err(|e| AnalyzerError::Io(e.to_string()))?,
        };

        if !output.status.success() {
            return Err(AnalyzerError::Failed {
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        serde_json::from_slice(&output.stdout).map_err(|e| AnalyzerError::Decode(e.to_string()))
    }

    fn descriptor(&self) -> &str {
        "external analyzer command"
    }
}
