//! Blockchain data providers.
//!
//! A provider turns a txid into a [`Transaction`] whose inputs carry the
//! address and value of the outputs they spend.

pub mod memory;

#[cfg(feature = "providers")]
pub mod rpc;
#[cfg(feature = "providers")]
pub mod blockchain_info;
#[cfg(feature = "providers")]
pub mod smartbit;

use async_trait::async_trait;

use crate::config::Network;
use crate::types::Transaction;

/// Error type for provider operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// The txid is not a 64-character hex string.
    #[error("Invalid txid: {0}")]
    InvalidTxid(String),
    /// The provider does not know the transaction.
    #[error("Transaction not found: {0}")]
    NotFound(String),
    /// The provider could not be reached or answered with a transport error.
    #[error("Network error: {0}")]
    Network(String),
    /// The provider answered with data that could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),
}

/// Trait for transaction data sources.
#[async_trait]
pub trait BlockchainProvider: Send + Sync {
    /// Fetch a transaction with resolved inputs.
    async fn get_tx(&self, txid: &str, network: Network) -> Result<Transaction, ProviderError>;

    /// Short description used in logs.
    fn descriptor(&self) -> &str;
}

pub use memory::InMemoryProvider;

#[cfg(feature = "providers")]
pub use rpc::{BitcoindRpcProvider, RpcConfig};
#[cfg(feature = "providers")]
pub use blockchain_info::BlockchainInfoProvider;
#[cfg(feature = "providers")]
pub use smartbit::SmartbitProvider;

/// Build the provider selected by `kind`.
///
/// The RPC provider reads its connection settings from the environment
/// (see [`RpcConfig::from_env`]).
#[cfg(feature = "providers")]
pub fn build_provider(
    kind: crate::config::ProviderKind,
    network: Network,
) -> Result<std::sync::Arc<dyn BlockchainProvider>, ProviderError> {
    use crate::config::ProviderKind;
    use std::sync::Arc;

    let provider: Arc<dyn BlockchainProvider> = match kind {
        ProviderKind::Rpc => Arc::new(BitcoindRpcProvider::new(RpcConfig::from_env(network))?),
        ProviderKind::BlockchainInfo => Arc::new(BlockchainInfoProvider::new()?),
        ProviderKind::Smartbit => Arc::new(SmartbitProvider::new()?),
    };
    Ok(provider)
}

/// Convert a BTC amount (as returned by bitcoind) to satoshis.
pub fn btc_to_sat(btc: f64) -> u64 {
    (btc * 100_000_000.0).round().max(0.0) as u64
}
