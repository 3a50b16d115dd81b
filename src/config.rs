//! Analysis parameters and runtime configuration.
//!
//! ## Parameter Hashing
//!
//! `AnalysisParams::params_hash` is the xxh64 of the canonical JSON of the
//! parameters. Every field that changes an analysis result is part of the
//! hash: the option set, the time budget, the txo limit and the intrafee
//! ratio. Options serialize as a sorted list, so insertion order never
//! changes the hash.

use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::canonical::canonical_hash_hex;

/// Default per-transaction time budget, in seconds.
pub const DEFAULT_MAX_DURATION_SECS: u64 = 600;

/// Default maximum number of inputs or outputs analyzed.
pub const DEFAULT_MAX_TXOS: usize = 12;

/// Upper bound for the coinjoin intrafee ratio, in percent.
pub const MAX_CJ_INTRAFEES_RATIO: u8 = 99;

/// One analyzer option flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisOption {
    /// Reject pathological transaction shapes before the search.
    Precheck,
    /// Compute the linkability matrix.
    Linkability,
    /// Collapse inputs controlled by the same address before the search.
    MergeInputs,
    /// Collapse outputs controlled by the same address before the search.
    MergeOutputs,
    /// Treat fees as an additional output during the search.
    MergeFees,
}

impl AnalysisOption {
    /// All options, in canonical order.
    pub const ALL: [AnalysisOption; 5] = [
        Self::Precheck,
        Self::Linkability,
        Self::MergeInputs,
        Self::MergeOutputs,
        Self::MergeFees,
    ];

    /// Parse an option name (case-insensitive, `-` or `_` separated).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().replace('-', "_").as_str() {
            "PRECHECK" => Some(Self::Precheck),
            "LINKABILITY" => Some(Self::Linkability),
            "MERGE_INPUTS" => Some(Self::MergeInputs),
            "MERGE_OUTPUTS" => Some(Self::MergeOutputs),
            "MERGE_FEES" => Some(Self::MergeFees),
            _ => None,
        }
    }

    /// Wire name of the option.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Precheck => "PRECHECK",
            Self::Linkability => "LINKABILITY",
            Self::MergeInputs => "MERGE_INPUTS",
            Self::MergeOutputs => "MERGE_OUTPUTS",
            Self::MergeFees => "MERGE_FEES",
        }
    }
}

impl fmt::Display for AnalysisOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of analyzer options.
///
/// The merge options change matrix dimensions and results; they are not
/// cosmetic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalysisOptions(BTreeSet<AnalysisOption>);

impl AnalysisOptions {
    /// Empty option set.
    pub fn none() -> Self {
        Self(BTreeSet::new())
    }

    /// Build a set from options.
    pub fn from_options(options: impl IntoIterator<Item = AnalysisOption>) -> Self {
        Self(options.into_iter().collect())
    }

    /// Whether an option is set.
    pub fn contains(&self, option: AnalysisOption) -> bool {
        self.0.contains(&option)
    }

    /// Set an option.
    pub fn insert(&mut self, option: AnalysisOption) -> bool {
        self.0.insert(option)
    }

    /// Clear an option.
    pub fn remove(&mut self, option: AnalysisOption) -> bool {
        self.0.remove(&option)
    }

    /// Iterate in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = AnalysisOption> + '_ {
        self.0.iter().copied()
    }

    /// Number of options set.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no option is set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self::from_options([
            AnalysisOption::Precheck,
            AnalysisOption::Linkability,
            AnalysisOption::MergeInputs,
        ])
    }
}

impl fmt::Display for AnalysisOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(|o| o.as_str()).collect();
        write!(f, "[{}]", names.join(", "))
    }
}

/// Error type for invalid analysis parameters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParamsError {
    /// Intrafee ratio above the allowed maximum.
    #[error("max_cj_intrafees_ratio must be within 0..={max}, got {0}", max = MAX_CJ_INTRAFEES_RATIO)]
    IntrafeesRatioOutOfRange(u8),
    /// Unknown option name.
    #[error("Unknown analysis option: {0}")]
    UnknownOption(String),
}

/// Parameters of one analysis request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnalysisParams {
    /// Analyzer options.
    #[serde(default)]
    pub options: AnalysisOptions,
    /// Time budget per transaction, in seconds.
    #[serde(default = "default_max_duration")]
    pub max_duration_secs: u64,
    /// Transactions with more inputs or outputs than this are skipped.
    #[serde(default = "default_max_txos")]
    pub max_txos: usize,
    /// Max intrafees paid by the taker of a coinjoin, in percent of the
    /// coinjoined amount.
    #[serde(default)]
    pub max_cj_intrafees_ratio: u8,
}

fn default_max_duration() -> u64 {
    DEFAULT_MAX_DURATION_SECS
}

fn default_max_txos() -> usize {
    DEFAULT_MAX_TXOS
}

impl AnalysisParams {
    /// Create validated parameters.
    pub fn new(
        options: AnalysisOptions,
        max_duration_secs: u64,
        max_txos: usize,
        max_cj_intrafees_ratio: u8,
    ) -> Result<Self, ParamsError> {
        let params = Self {
            options,
            max_duration_secs,
            max_txos,
            max_cj_intrafees_ratio,
        };
        params.validate()?;
        Ok(params)
    }

    /// Check parameter ranges.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.max_cj_intrafees_ratio > MAX_CJ_INTRAFEES_RATIO {
            return Err(ParamsError::IntrafeesRatioOutOfRange(self.max_cj_intrafees_ratio));
        }
        Ok(())
    }

    /// Time budget as a `Duration`.
    pub fn max_duration(&self) -> Duration {
        Duration::from_secs(self.max_duration_secs)
    }

    /// Intrafee ratio as a fraction in `[0, 0.99]`.
    pub fn intrafees_ratio_fraction(&self) -> f64 {
        f64::from(self.max_cj_intrafees_ratio) / 100.0
    }

    /// Hash of all result-affecting parameters.
    pub fn params_hash(&self) -> String {
        canonical_hash_hex(self)
    }
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            options: AnalysisOptions::default(),
            max_duration_secs: DEFAULT_MAX_DURATION_SECS,
            max_txos: DEFAULT_MAX_TXOS,
            max_cj_intrafees_ratio: 0,
        }
    }
}

/// Parse a list of option names.
pub fn parse_options<S: AsRef<str>>(names: &[S]) -> Result<AnalysisOptions, ParamsError> {
    let mut options = AnalysisOptions::none();
    for name in names {
        let option = AnalysisOption::from_str(name.as_ref())
            .ok_or_else(|| ParamsError::UnknownOption(name.as_ref().to_string()))?;
        options.insert(option);
    }
    Ok(options)
}

/// Bitcoin network.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Bitcoin mainnet.
    #[default]
    Mainnet,
    /// Bitcoin testnet.
    Testnet,
}

impl Network {
    /// Parse from string (for flags and environment variables).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "mainnet" | "main" => Some(Self::Mainnet),
            "testnet" | "test" => Some(Self::Testnet),
            _ => None,
        }
    }

    /// Whether this is mainnet.
    pub fn is_mainnet(&self) -> bool {
        matches!(self, Self::Mainnet)
    }

    /// Default bitcoind RPC port.
    pub fn default_rpc_port(&self) -> u16 {
        match self {
            Self::Mainnet => 8332,
            Self::Testnet => 18332,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mainnet => write!(f, "mainnet"),
            Self::Testnet => write!(f, "testnet"),
        }
    }
}

/// Source of transaction data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Local bitcoind JSON-RPC interface.
    Rpc,
    /// Remote blockchain.info API.
    #[default]
    BlockchainInfo,
    /// Remote Smartbit API.
    Smartbit,
}

impl ProviderKind {
    /// Parse from string (for flags and environment variables).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "rpc" | "bitcoind" => Some(Self::Rpc),
            "blockchain_info" | "blockchaininfo" => Some(Self::BlockchainInfo),
            "smartbit" => Some(Self::Smartbit),
            _ => None,
        }
    }

    /// Human-readable description, used in logs.
    pub fn descriptor(&self) -> &'static str {
        match self {
            Self::Rpc => "local RPC interface",
            Self::BlockchainInfo => "remote blockchain.info API",
            Self::Smartbit => "remote Smartbit API",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rpc => write!(f, "rpc"),
            Self::BlockchainInfo => write!(f, "blockchain_info"),
            Self::Smartbit => write!(f, "smartbit"),
        }
    }
}

/// Configuration of the HTTP service, read from the environment.
///
/// | Variable | Default |
/// |---|---|
/// | `HOST` | `0.0.0.0` |
/// | `PORT` | `8002` |
/// | `TX_ENTROPY_PROVIDER` | `blockchain_info` |
/// | `TX_ENTROPY_NETWORK` | `mainnet` |
/// | `TX_ENTROPY_ANALYZER_CMD` | none (required) |
/// | `TX_ENTROPY_CACHE_ENTRIES` | `1024` (0 disables the cache) |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Transaction data source.
    pub provider: ProviderKind,
    /// Default network for requests that do not name one.
    pub network: Network,
    /// Analyzer program followed by its arguments.
    pub analyzer_cmd: Vec<String>,
    /// Result cache capacity.
    pub cache_entries: usize,
}

impl ServiceConfig {
    /// Load from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let provider = lookup("TX_ENTROPY_PROVIDER")
            .and_then(|s| ProviderKind::from_str(&s))
            .unwrap_or_default();
        let network = lookup("TX_ENTROPY_NETWORK")
            .and_then(|s| Network::from_str(&s))
            .unwrap_or_default();
        let analyzer_cmd = lookup("TX_ENTROPY_ANALYZER_CMD")
            .map(|s| s.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();

        Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: lookup("PORT").and_then(|s| s.parse().ok()).unwrap_or(8002),
            provider,
            network,
            analyzer_cmd,
            cache_entries: lookup("TX_ENTROPY_CACHE_ENTRIES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(1024),
        }
    }
}
