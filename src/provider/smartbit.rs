//! Smartbit remote API provider.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::config::Network;
use crate::types::{is_valid_txid, Transaction, TxoRef};
use super::{BlockchainProvider, ProviderError};

const MAINNET_BASE_URL: &str = "https://api.smartbit.com.au";
const TESTNET_BASE_URL: &str = "https://testnet-api.smartbit.com.au";

#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,
    transaction: Option<RawTx>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawTx {
    txid: String,
    #[serde(default)]
    inputs: Vec<RawInput>,
    #[serde(default)]
    outputs: Vec<RawOutput>,
}

#[derive(Debug, Deserialize)]
struct RawInput {
    #[serde(default)]
    addresses: Vec<String>,
    #[serde(default)]
    value_int: u64,
    // absent on coinbase inputs
    txid: Option<String>,
    vout: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawOutput {
    #[serde(default)]
    addresses: Vec<String>,
    value_int: u64,
    n: u32,
}

impl RawTx {
    fn into_transaction(self) -> Transaction {
        let inputs = self
            .inputs
            .iter()
            .filter_map(|i| {
                let (Some(prev_txid), Some(prev_vout)) = (&i.txid, i.vout) else {
                    return None;
                };
                let address = i
                    .addresses
                    .first()
                    .cloned()
                    .unwrap_or_else(|| TxoRef::outpoint_id(prev_txid, prev_vout));
                Some(TxoRef::new(address, i.value_int))
            })
            .collect();
        let outputs = self
            .outputs
            .iter()
            .map(|o| {
                let address = o
                    .addresses
                    .first()
                    .cloned()
                    .unwrap_or_else(|| TxoRef::outpoint_id(&self.txid, o.n));
                TxoRef::new(address, o.value_int)
            })
            .collect();
        Transaction::new(self.txid, inputs, outputs)
    }
}

impl Envelope {
    fn into_result(self, txid: &str) -> Result<Transaction, ProviderError> {
        match (self.success, self.transaction) {
            (true, Some(raw)) => Ok(raw.into_transaction()),
            (true, None) => Err(ProviderError::Decode("missing transaction".to_string())),
            (false, _) => {
                debug!(txid = %txid, error = ?self.error, "smartbit lookup failed");
                Err(ProviderError::NotFound(txid.to_string()))
            }
        }
    }
}

/// Provider backed by the Smartbit `blockchain/tx` endpoint.
pub struct SmartbitProvider {
    client: Client,
    mainnet_url: String,
    testnet_url: String,
}

impl SmartbitProvider {
    /// Create a provider for the public endpoints.
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_base_urls(MAINNET_BASE_URL, TESTNET_BASE_URL)
    }

    /// Create a provider for custom endpoints.
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
        let base = if network.is_mainnet() {
            &self.mainnet_url
        } else {
            &self.testnet_url
        };
        format!("{}/v1/blockchain/tx/{}", base.trim_end_matches('/'), txid)
    }
}

#[async_trait]
impl BlockchainProvider for SmartbitProvider {
    async fn get_tx(&self, txid: &str, network: Network) -> Result<Transaction, ProviderError> {
        if !is_valid_txid(txid) {
            return Err(ProviderError::InvalidTxid(txid.to_string()));
        }

        let url = self.tx_url(txid, network);
        debug!(url = %url, "smartbit request");

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
        if status.is_server_error() {
            return Err(ProviderError::Network(format!("HTTP {}", status)));
        }

        // Smartbit reports unknown transactions as `success: false` bodies
        let envelope: Envelope = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        envelope.into_result(txid)
    }

    fn descriptor(&self) -> &str {
        "remote Smartbit API"
    }
}
