use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::ChainError;
use crate::evm::{is_evm_address, parse_hex_quantity};
use crate::rpc_config::normalize_rpc_url;

/// Reads the native balance of an address.
#[async_trait]
pub trait BalanceSource: Send + Sync {
    /// Balance in the smallest unit (wei for 18-decimal tokens).
    async fn balance_of(&self, rpc_url: &str, address: &str) -> Result<u128, ChainError>;
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// Minimal JSON-RPC client for EVM nodes.
///
/// The RPC URL is passed per call since the wizard switches endpoints as the
/// operator edits the network step.
pub struct JsonRpcClient {
    client: Client,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(timeout: Duration) -> Result<Self, ChainError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChainError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            next_id: AtomicU64::new(1),
        })
    }

    /// Issue a single JSON-RPC call and return its `result` value.
    pub async fn call(&self, rpc_url: &str, method: &str, params: Value) -> Result<Value, ChainError> {
        let url = normalize_rpc_url(rpc_url)?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        debug!(url = %url, method, "JSON-RPC request");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChainError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChainError::Transport(format!("RPC endpoint returned {status}")));
        }

        let parsed: RpcResponse = response
            .json()
            .await
            .map_err(|e| ChainError::Decode(e.to_string()))?;

        if let Some(err) = parsed.error {
            return Err(ChainError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        parsed
            .result
            .ok_or_else(|| ChainError::Decode("response has neither result nor error".into()))
    }
}

#[async_trait]
impl BalanceSource for JsonRpcClient {
    async fn balance_of(&self, rpc_url: &str, address: &str) -> Result<u128, ChainError> {
        if !is_evm_address(address) {
            return Err(ChainError::InvalidAddress(address.to_string()));
        }
        let result = self
            .call(rpc_url, "eth_getBalance", json!([address, "latest"]))
            .await?;
        let quantity = result
            .as_str()
            .ok_or_else(|| ChainError::Decode(format!("balance is not a string: {result}")))?;
        parse_hex_quantity(quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> JsonRpcClient {
        JsonRpcClient::new(Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn rpc_response_parses_result() {
        let parsed: RpcResponse =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":1,"result":"0x10"}"#).unwrap();
        assert_eq!(parsed.result.unwrap(), json!("0x10"));
        assert!(parsed.error.is_none());
    }

    #[test]
    fn rpc_response_parses_error() {
        let parsed: RpcResponse = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32602,"message":"invalid argument"}}"#,
        )
        .unwrap();
        let err = parsed.error.unwrap();
        assert_eq!(err.code, -32602);
        assert_eq!(err.message, "invalid argument");
    }

    #[tokio::test]
    async fn balance_of_rejects_bad_address_without_network() {
        let err = client()
            .balance_of("http://127.0.0.1:1", "0x1234")
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::InvalidAddress(_)));
    }

    #[tokio::test]
    async fn call_rejects_invalid_url() {
        let err = client()
            .call("not a url", "eth_chainId", json!([]))
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::InvalidRpcUrl(_)));
    }
}
