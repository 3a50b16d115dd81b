//! Command-line linkability inspection.
//!
//! Fetches each transaction, runs the configured analyzer and prints one
//! report per transaction. Transactions that cannot be fetched are logged
//! and skipped.
//!
//! ## Usage
//!
//! ```bash
//! tx_entropy --analyzer-cmd "ludwig --json" \
//!     --option LINKABILITY --option MERGE_INPUTS \
//!     --max-duration 60 <txid> <txid>
//! ```
//!
//! Environment variables:
//! - `TX_ENTROPY_PROVIDER`: provider used when `--provider` is absent
//! - `TX_ENTROPY_ANALYZER_CMD`: analyzer used when `--analyzer-cmd` is absent
//! - `BITCOIND_RPC_URL`, `BITCOIND_RPC_USER`, `BITCOIND_RPC_PASSWORD`: RPC provider
//! - `RUST_LOG`: Log level filter (default: warn)
//! - `LOG_FORMAT`: "json" or "pretty" (default: pretty)

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tracing::error;

use tx_entropy_kernel::config::{DEFAULT_MAX_DURATION_SECS, DEFAULT_MAX_TXOS, MAX_CJ_INTRAFEES_RATIO};
use tx_entropy_kernel::logging::{init_tracing, LogFormat};
use tx_entropy_kernel::{
    build_provider, AnalysisOption, AnalysisOptions, AnalysisParams, BatchInspector,
    CommandAnalyzer, LinkabilityAnalyzer, Network, ProviderKind, TxInspector,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Console summary per transaction
    Text,
    /// One JSON document for the whole batch
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "tx_entropy")]
#[command(version)]
#[command(about = "Measure the entropy and deterministic links of Bitcoin transactions")]
struct Args {
    /// Transaction ids to inspect
    #[arg(required = true)]
    txids: Vec<String>,

    /// Source of transaction data: rpc, blockchain-info or smartbit
    #[arg(long, env = "TX_ENTROPY_PROVIDER", default_value = "blockchain-info", value_parser = parse_provider)]
    provider: ProviderKind,

    /// Resolve txids on testnet
    #[arg(long)]
    testnet: bool,

    /// Analysis option (PRECHECK, LINKABILITY, MERGE_INPUTS, MERGE_OUTPUTS,
    /// MERGE_FEES); repeatable, replaces the defaults
    #[arg(long = "option", value_parser = parse_option)]
    options: Vec<AnalysisOption>,

    /// Start from an empty option set instead of the defaults
    #[arg(long)]
    no_default_options: bool,

    /// Time budget per transaction, in seconds
    #[arg(long, default_value_t = DEFAULT_MAX_DURATION_SECS)]
    max_duration: u64,

    /// Skip transactions with more inputs or outputs than this
    #[arg(long, default_value_t = DEFAULT_MAX_TXOS)]
    max_txos: usize,

    /// Max intrafees paid by a coinjoin taker, in percent (0-99)
    #[arg(long, default_value_t = 0, value_parser = parse_ratio)]
    max_cj_intrafees_ratio: u8,

    /// Analyzer program and arguments
    #[arg(long, env = "TX_ENTROPY_ANALYZER_CMD")]
    analyzer_cmd: String,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

fn parse_provider(s: &str) -> Result<ProviderKind, String> {
    ProviderKind::from_str(s)
        .ok_or_else(|| format!("unknown provider '{}' (expected rpc, blockchain-info or smartbit)", s))
}

fn parse_option(s: &str) -> Result<AnalysisOption, String> {
    AnalysisOption::from_str(s).ok_or_else(|| format!("unknown analysis option '{}'", s))
}

fn parse_ratio(s: &str) -> Result<u8, String> {
    let ratio: u8 = s.parse().map_err(|_| format!("'{}' is not a percentage", s))?;
    if ratio > MAX_CJ_INTRAFEES_RATIO {
        return Err(format!("must be between 0 and {}", MAX_CJ_INTRAFEES_RATIO));
    }
    Ok(ratio)
}

impl Args {
    fn options(&self) -> AnalysisOptions {
        if !self.options.is_empty() {
            AnalysisOptions::from_options(self.options.iter().copied())
        } else if self.no_default_options {
            AnalysisOptions::none()
        } else {
            AnalysisOptions::default()
        }
    }

    fn network(&self) -> Network {
        if self.testnet {
            Network::Testnet
        } else {
            Network::Mainnet
        }
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let params = AnalysisParams::new(
        args.options(),
        args.max_duration,
        args.max_txos,
        args.max_cj_intrafees_ratio,
    )?;
    let network = args.network();

    let words: Vec<&str> = args.analyzer_cmd.split_whitespace().collect();
    let analyzer: Arc<dyn LinkabilityAnalyzer> = Arc::new(CommandAnalyzer::from_command_line(&words)?);
    let provider = build_provider(args.provider, network)?;
    let inspector = TxInspector::new(provider, analyzer);

    let batch = BatchInspector::new(&inspector)
        .inspect_all(&args.txids, network, &params)
        .await?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&batch)?),
        OutputFormat::Text => {
            for inspection in &batch.inspections {
                println!();
                println!("--- {} ---", inspection.report.txid);
                print!("{}", inspection.report);
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing("tx_entropy=warn,tx_entropy_kernel=warn", LogFormat::Pretty);

    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "inspection failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
