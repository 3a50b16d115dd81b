//! In-memory provider for testing.

use std::collections::BTreeMap;
use async_trait::async_trait;

use crate::config::Network;
use crate::types::Transaction;
use super::{BlockchainProvider, ProviderError};

/// In-memory provider for testing.
///
/// Transactions are keyed by `(network, txid)`. Failures can be scripted per
/// txid to exercise the fetch-failure path.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    txs: BTreeMap<(Network, String), Transaction>,
    failures: BTreeMap<String, ProviderError>,
}

impl InMemoryProvider {
    /// Create a new empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mainnet transaction.
    pub fn add_tx(&mut self, tx: Transaction) {
        self.add_tx_on(Network::Mainnet, tx);
    }

    /// Add a transaction on a given network.
    pub fn add_tx_on(&mut self, network: Network, tx: Transaction) {
        self.txs.insert((network, tx.txid.clone()), tx);
    }

    /// Make every fetch of `txid` fail with `error`.
    pub fn fail_with(&mut self, txid: impl Into<String>, error: ProviderError) {
        self.failures.insert(txid.into(), error);
    }

    /// Number of stored transactions.
    pub fn num_txs(&self) -> usize {
        self.txs.len()
    }
}

#[async_trait]
impl BlockchainProvider for InMemoryProvider {
    async fn get_tx(&self, txid: &str, network: Network) -> Result<Transaction, ProviderError> {
        if let Some(error) = self.failures.get(txid) {
            return Err(error.clone());
        }
        self.txs
            .get(&(network, txid.to_string()))
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(txid.to_string()))
    }

    fn descriptor(&self) -> &str {
        "in-memory provider"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TxoRef;

    fn tx(txid: &str) -> Transaction {
        Transaction::new(txid, vec![TxoRef::new("a", 10)], vec![TxoRef::new("b", 9)])
    }

    #[tokio::test]
    async fn test_get_tx() {
        let mut provider = InMemoryProvider::new();
        provider.add_tx(tx("t1"));

        let fetched = provider.get_tx("t1", Network::Mainnet).await.unwrap();
        assert_eq!(fetched.txid, "t1");
        assert_eq!(provider.num_txs(), 1);
    }

    #[tokio::test]
    async fn test_network_is_part_of_the_key() {
        let mut provider = InMemoryProvider::new();
        provider.add_tx_on(Network::Testnet, tx("t1"));

        assert!(provider.get_tx("t1", Network::Testnet).await.is_ok());
        assert_eq!(
            provider.get_tx("t1", Network::Mainnet).await,
            Err(ProviderError::NotFound("t1".to_string()))
        );
    }

    #[tokio::test]
    async fn test_scripted_failure() {
        let mut provider = InMemoryProvider::new();
        provider.add_tx(tx("t1"));
        provider.fail_with("t1", ProviderError::Network("connection reset".to_string()));

        assert!(matches!(
            provider.get_tx("t1", Network::Mainnet).await,
            Err(ProviderError::Network(_))
        ));
    }
}
