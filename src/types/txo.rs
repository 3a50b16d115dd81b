//! Transaction output references and fetched transactions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of a txid in bytes.
pub const TXID_BYTES: usize = 32;

/// Reference to a transaction output: who holds it and how much it carries.
///
/// `address` is the holder's address when one can be decoded from the script,
/// otherwise an outpoint identifier (`"<txid>:<vout>"`) so that node identity
/// stays unique in the projected graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxoRef {
    /// Address or identifier of the output.
    pub address: String,
    /// Value in satoshis.
    pub value: u64,
}

impl TxoRef {
    /// Create a new txo reference.
    pub fn new(address: impl Into<String>, value: u64) -> Self {
        Self {
            address: address.into(),
            value,
        }
    }

    /// Identifier used when an output has no decodable address.
    pub fn outpoint_id(txid: &str, vout: u32) -> String {
        format!("{}:{}", txid, vout)
    }
}

impl fmt::Display for TxoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.address, self.value)
    }
}

/// A transaction as returned by a blockchain provider.
///
/// Input and output order is the order found on chain and defines the
/// index mapping of the linkability matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction id (hex, display byte order).
    pub txid: String,
    /// Spent outputs, in input order.
    pub inputs: Vec<TxoRef>,
    /// Created outputs, in output order.
    pub outputs: Vec<TxoRef>,
}

impl Transaction {
    /// Create a new transaction.
    pub fn new(txid: impl Into<String>, inputs: Vec<TxoRef>, outputs: Vec<TxoRef>) -> Self {
        Self {
            txid: txid.into(),
            inputs,
            outputs,
        }
    }

    /// Sum of input values.
    pub fn total_in(&self) -> u64 {
        self.inputs.iter().map(|t| t.value).sum()
    }

    /// Sum of output values.
    pub fn total_out(&self) -> u64 {
        self.outputs.iter().map(|t| t.value).sum()
    }

    /// Value consumed but not reproduced. Saturates at zero for coinbase-like
    /// transactions whose inputs carry no value.
    pub fn fees(&self) -> u64 {
        self.total_in().saturating_sub(self.total_out())
    }
}

/// Check that a string is a well-formed txid (64 hex characters).
pub fn is_valid_txid(txid: &str) -> bool {
    txid.len() == TXID_BYTES * 2
        && hex::decode(txid).map(|b| b.len() == TXID_BYTES).unwrap_or(false)
}
