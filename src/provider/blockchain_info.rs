//! blockchain.info remote API provider.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::config::Network;
use crate::types::{is_valid_txid, Transaction, TxoRef};
use super::{BlockchainProvider, ProviderError};

const MAINNET_BASE_URL: &str = "https://blockchain.info";
const TESTNET_BASE_URL: &str = "https://testnet.blockchain.info";

#[derive(Debug, Deserialize)]
struct RawTx {
    hash: String,
    #[serde(default)]
    inputs: Vec<RawInput>,
    #[serde(default)]
    out: Vec<RawOutput>,
}

#[derive(Debug, Deserialize)]
struct RawInput {
    prev_out: Option<RawOutput>,
}

#[derive(Debug, Deserialize)]
struct RawOutput {
    addr: Option<String>,
    value: u64,
    n: u32,
    #[serde(default)]
    tx_index: u64,
}

impl RawOutput {
    fn to_txo(&self, owner: &str) -> TxoRef {
        let address = self
            .addr
            .clone()
            .unwrap_or_else(|| TxoRef::outpoint_id(owner, self.n));
        TxoRef::new(address, self.value)
    }
}

impl RawTx {
    fn into_transaction(self) -> Transaction {
        let inputs = self
            .inputs
            .iter()
            .filter_map(|i| i.prev_out.as_ref())
            .map(|prev| prev.to_txo(&prev.tx_index.to_string()))
            .collect();
        let outputs = self.out.iter().map(|o| o.to_txo(&self.hash)).collect();
        Transaction::new(self.hash, inputs, outputs)
    }
}

/// Provider backed by the blockchain.info `rawtx` endpoint.
pub struct BlockchainInfoProvider {
    client: Client,
    mainnet_url: String,
    testnet_url: String,
}

impl BlockchainInfoProvider {
    /// Create a provider for the public endpoints.
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_base_urls(MAINNET_BASE_URL, TESTNET_BASE_URL)
    }

    /// Create a provider for custom endpoints (mirrors, test servers).
    pub fn with_base_urls(
        mainnet_url: impl Into<String>,
        testnet_url: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(Self {
            client,
            mainnet_url: mainnet_url.into(),
            testnet_url: testnet_url.into(),
        })
    }

    fn tx_url(&self, txid: &str, network: Network) -> String {
        let base = match network {
            Network::Mainnet => &self.mainnet_url,
            Network::Testnet => &self.testnet_url,
        };
        format!("{}/rawtx/{}", base.trim_end_matches('/'), txid)
    }
}

#[async_trait]
impl BlockchainProvider for BlockchainInfoProvider {
    async fn get_tx(&self, txid: &str, network: Network) -> Result<Transaction, ProviderError> {
        if !is_valid_txid(txid) {
            return Err(ProviderError::InvalidTxid(txid.to_string()));
        }

        let url = self.tx_url(txid, network);
        debug!(url = %url, "blockchain.info request");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound(txid.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if body.to_lowercase().contains("not found") {
                return Err(ProviderError::NotFound(txid.to_string()));
            }
            return Err(ProviderError::Network(format!("HTTP {} - {}", status, body)));
        }

        let raw: RawTx = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        Ok(raw.into_transaction())
    }

    fn descriptor(&self) -> &str {
        "remote blockchain.info API"
    }
}
