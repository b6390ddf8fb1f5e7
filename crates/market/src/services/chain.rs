//! Chain verifier: resolves a transaction hash to a settlement status.
//!
//! The chain node is an authoritative but untrusted oracle: the verifier
//! asks it for the transaction's receipt and derives a status from what
//! comes back. Verification is receipt-status-only — the transferred
//! value and destination address are NOT matched against the quoted
//! amount or the sellers' payout addresses. That is an accepted trust
//! boundary of the current design, not an oversight; closing it would
//! require inspecting per-transfer logs for every payable seller.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use librum_core::ChainStatus;

/// Errors that can occur when querying the chain.
#[derive(Debug, Error)]
pub enum ChainError {
    /// The RPC provider could not be reached or answered with an error.
    ///
    /// Deliberately not a [`ChainStatus`]: a verifier outage says nothing
    /// about the payment and must never be conflated with a failed
    /// transaction.
    #[error("chain provider unavailable: {0}")]
    ProviderUnavailable(String),
}

/// Resolves a transaction hash to a settlement status.
#[async_trait]
pub trait ChainVerifier: Send + Sync {
    /// Query the transaction's receipt and derive a status.
    ///
    /// Safe to call repeatedly: querying has no side effect, so a caller
    /// may retry the same hash after [`ChainStatus::Unconfirmed`].
    async fn verify_transaction(&self, tx_hash: &str) -> Result<ChainStatus, ChainError>;
}

/// Chain verifier backed by an Ethereum-style JSON-RPC provider.
#[derive(Debug, Clone)]
pub struct EthRpcVerifier {
    client: reqwest::Client,
    url: SecretString,
}

impl EthRpcVerifier {
    /// Create a new verifier with a bounded per-call timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::ProviderUnavailable`] if the HTTP client
    /// fails to build.
    pub fn new(url: SecretString, timeout: Duration) -> Result<Self, ChainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChainError::ProviderUnavailable(e.to_string()))?;
        Ok(Self { client, url })
    }
}

/// JSON-RPC envelope for `eth_getTransactionReceipt`.
#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<Receipt>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct Receipt {
    /// "0x1" for success, "0x0" for a reverted transaction.
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

/// Map a receipt (or its absence) to a settlement status.
fn receipt_status(receipt: Option<&Receipt>) -> ChainStatus {
    match receipt {
        // No receipt yet: still in the mempool or unknown to the node.
        None => ChainStatus::Unconfirmed,
        // Anything but an explicit success marker is a failure.
        Some(r) => match r.status.as_deref() {
            Some("0x1") => ChainStatus::Confirmed,
            _ => ChainStatus::Failed,
        },
    }
}

#[async_trait]
impl ChainVerifier for EthRpcVerifier {
    async fn verify_transaction(&self, tx_hash: &str) -> Result<ChainStatus, ChainError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_getTransactionReceipt",
            "params": [tx_hash],
        });

        let response = self
            .client
            .post(self.url.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| ChainError::ProviderUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChainError::ProviderUnavailable(format!(
                "provider returned status {status}"
            )));
        }

        let rpc: RpcResponse = response
            .json()
            .await
            .map_err(|e| ChainError::ProviderUnavailable(e.to_string()))?;

        if let Some(err) = rpc.error {
            return Err(ChainError::ProviderUnavailable(format!(
                "RPC error {}: {}",
                err.code, err.message
            )));
        }

        let chain_status = receipt_status(rpc.result.as_ref());
        tracing::debug!(tx_hash, ?chain_status, "transaction receipt resolved");
        Ok(chain_status)
    }
}
