//! bitcoind JSON-RPC provider.
//!
//! Uses `getrawtransaction <txid> true`. Input addresses and values are not
//! part of a verbose transaction, so each spent output is resolved by
//! fetching its parent transaction. The node must run with `txindex=1` for
//! confirmed transactions that are not in the wallet.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Network;
use crate::types::{is_valid_txid, Transaction, TxoRef};
use super::{btc_to_sat, BlockchainProvider, ProviderError};

/// bitcoind error code for unknown transactions.
const RPC_INVALID_ADDRESS_OR_KEY: i32 = -5;

/// Connection settings for bitcoind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcConfig {
    /// Endpoint URL, e.g. `http://127.0.0.1:8332`.
    pub url: String,
    /// RPC user.
    pub username: String,
    /// RPC password.
    pub password: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl RpcConfig {
    /// Load from `BITCOIND_RPC_URL`, `BITCOIND_RPC_USER`,
    /// `BITCOIND_RPC_PASSWORD` and `BITCOIND_RPC_TIMEOUT_SECS`. The URL
    /// defaults to localhost on the network's standard port.
    pub fn from_env(network: Network) -> Self {
        Self::from_lookup(network, |key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup.
    pub fn from_lookup(network: Network, lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            url: lookup("BITCOIND_RPC_URL")
                .unwrap_or_else(|| format!("http://127.0.0.1:{}", network.default_rpc_port())),
            username: lookup("BITCOIND_RPC_USER").unwrap_or_default(),
            password: lookup("BITCOIND_RPC_PASSWORD").unwrap_or_default(),
            timeout_secs: lookup("BITCOIND_RPC_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        }
    }
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i32,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RawTx {
    txid: String,
    vin: Vec<RawVin>,
    vout: Vec<RawVout>,
}

#[derive(Debug, Deserialize)]
struct RawVin {
    txid: Option<String>,
    vout: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawVout {
    value: f64,
    n: u32,
    #[serde(rename = "scriptPubKey")]
    script_pub_key: RawScript,
}

#[derive(Debug, Default, Deserialize)]
struct RawScript {
    address: Option<String>,
    #[serde(default)]
    addresses: Vec<String>,
}

impl RawVout {
    fn to_txo(&self, txid: &str) -> TxoRef {
        // Newer nodes report `address`, older ones an `addresses` list
        let address = self
            .script_pub_key
            .address
            .clone()
            .or_else(|| self.script_pub_key.addresses.first().cloned())
            .unwrap_or_else(|| TxoRef::outpoint_id(txid, self.n));
        TxoRef::new(address, btc_to_sat(self.value))
    }
}

/// Provider backed by a bitcoind node.
pub struct BitcoindRpcProvider {
    client: Client,
    config: RpcConfig,
    request_id: AtomicU64,
}

impl BitcoindRpcProvider {
    /// Create a new provider.
    pub fn new(config: RpcConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(Self {
            client,
            config,
            request_id: AtomicU64::new(0),
        })
    }

    async fn call<T: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T, ProviderError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let request = RpcRequest {
            jsonrpc: "1.0",
            id,
            method,
            params,
        };

        debug!(method = method, id = id, "bitcoind RPC call");

        let response = self
            .client
            .post(&self.config.url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        // bitcoind answers RPC-level errors with HTTP 404/500 and a JSON body,
        // so the body is decoded regardless of status
        let status = response.status();
        let rpc_response: RpcResponse<T> = response.json().await.map_err(|e| {
            ProviderError::Decode(format!("HTTP {}: {}", status, e))
        })?;

        if let Some(error) = rpc_response.error {
            if error.code == RPC_INVALID_ADDRESS_OR_KEY {
                return Err(ProviderError::NotFound(error.message));
            }
            return Err(ProviderError::Network(format!(
                "RPC error {}: {}",
                error.code, error.message
            )));
        }

        rpc_response
            .result
            .ok_or_else(|| ProviderError::Decode("Empty RPC result".to_string()))
    }

    async fn get_raw(&self, txid: &str) -> Result<RawTx, ProviderError> {
        self.call("getrawtransaction", serde_json::json!([txid, true]))
            .await
            .map_err(|e| match e {
                ProviderError::NotFound(_) => ProviderError::NotFound(txid.to_string()),
                other => other,
            })
    }
}

#[async_trait]
impl BlockchainProvider for BitcoindRpcProvider {
    async fn get_tx(&self, txid: &str, _network: Network) -> Result<Transaction, ProviderError> {
        if !is_valid_txid(txid) {
            return Err(ProviderError::InvalidTxid(txid.to_string()));
        }

        let raw = self.get_raw(txid).await?;
        let outputs = raw.vout.iter().map(|v| v.to_txo(&raw.txid)).collect();

        let mut parents: BTreeMap<String, RawTx> = BTreeMap::new();
        let mut inputs = Vec::with_capacity(raw.vin.len());

        for vin in &raw.vin {
            // coinbase inputs spend nothing
            let (Some(prev_txid), Some(prev_vout)) = (&vin.txid, vin.vout) else {
                continue;
            };

            if !parents.contains_key(prev_txid) {
                let parent = self.get_raw(prev_txid).await?;
                parents.insert(prev_txid.clone(), parent);
            }
            let parent = &parents[prev_txid];

            let spent = parent
                .vout
                .iter()
                .find(|v| v.n == prev_vout)
                .ok_or_else(|| {
                    ProviderError::Decode(format!("{} has no output {}", prev_txid, prev_vout))
                })?;
            inputs.push(spent.to_txo(prev_txid));
        }

        Ok(Transaction::new(raw.txid, inputs, outputs))
    }

    fn descriptor(&self) -> &str {
        "local RPC interface"
    }
}
