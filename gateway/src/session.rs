//! Downstream node session.
//!
//! A [`Session`] is the gateway's handle to one blockchain node for the
//! duration of a client request. Pipelines use the typed helpers for the
//! calls they need while defaulting and submitting transactions; everything
//! the gateway does not intercept goes through [`Session::forward`].
//!
//! [`HttpSession`] speaks JSON-RPC over HTTP. Every call carries a fresh id
//! so responses can be correlated in logs. Dropping the future of a call
//! aborts the HTTP request.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{hex, Address, B256, U256, U64};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::PRIVACY_MANAGER_STORE_RAW_PATH;
use crate::error::{GatewayError, Result};
use crate::ethereum::CallMsg;
use crate::jsonrpc::{JsonRpcRequest, JsonRpcResponse};

/// Typed access to a downstream node.
#[async_trait]
pub trait Session: Send + Sync {
    /// `eth_chainId`.
    async fn chain_id(&self) -> Result<u64>;

    /// `eth_gasPrice`.
    async fn gas_price(&self) -> Result<U256>;

    /// `eth_maxPriorityFeePerGas`.
    async fn max_priority_fee_per_gas(&self) -> Result<U256>;

    /// `eth_estimateGas`.
    async fn estimate_gas(&self, call: &CallMsg) -> Result<u64>;

    /// `eth_getTransactionCount(address, "pending")`.
    async fn pending_nonce(&self, address: Address) -> Result<u64>;

    /// `priv_getTransactionCount(address, privacyGroupId)`.
    async fn private_nonce(&self, address: Address, privacy_group_id: &str) -> Result<u64>;

    /// `priv_getEeaTransactionCount(address, privateFrom, privateFor)`.
    async fn eea_nonce(
        &self,
        address: Address,
        private_from: &str,
        private_for: &[String],
    ) -> Result<u64>;

    /// `eth_sendRawTransaction`.
    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256>;

    /// `eth_sendRawPrivateTransaction(raw, {privateFor})` (GoQuorum).
    async fn send_raw_private_transaction(&self, raw: &[u8], private_for: &[String])
        -> Result<B256>;

    /// `eea_sendRawTransaction` (Besu).
    async fn eea_send_raw_transaction(&self, raw: &[u8]) -> Result<B256>;

    /// Stores a private payload in the node's privacy manager and returns
    /// the key that replaces the payload inside the transaction.
    async fn store_raw(&self, payload: &[u8], private_from: Option<&str>) -> Result<Vec<u8>>;

    /// Forwards a request verbatim and returns the node's response.
    async fn forward(&self, request: &JsonRpcRequest) -> Result<JsonRpcResponse>;
}

/// Where a node can be reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeEndpoint {
    /// JSON-RPC URL of the node.
    pub rpc_url: String,
    /// Base URL of the Tessera third-party API, for Quorum private
    /// transactions.
    #[serde(default)]
    pub privacy_manager_url: Option<String>,
}

/// Builds the shared HTTP client used by every session.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(5))
        .build()
        .map_err(|e| GatewayError::internal(format!("failed to build node client: {}", e)))
}

fn request_error(target: &str, err: &reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::blockchain_node(format!("timeout calling {}", target))
    } else if err.is_connect() {
        GatewayError::blockchain_node(format!("connection to node failed for {}", target))
    } else {
        GatewayError::blockchain_node(format!("request failed for {}: {}", target, err))
    }
}

fn raw_hex(raw: &[u8]) -> String {
    hex::encode_prefixed(raw)
}

#[derive(Serialize)]
struct StoreRawRequest<'a> {
    payload: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    from: Option<&'a str>,
}

#[derive(Deserialize)]
struct StoreRawResponse {
    key: String,
}

/// JSON-RPC over HTTP session.
pub struct HttpSession {
    client: reqwest::Client,
    endpoint: Arc<NodeEndpoint>,
    next_id: AtomicU64,
}

impl HttpSession {
    /// Cheap: the client's connection pool is shared.
    pub fn new(client: reqwest::Client, endpoint: Arc<NodeEndpoint>) -> Self {
        Self {
            client,
            endpoint,
            next_id: AtomicU64::new(1),
        }
    }

    async fn post(&self, request: &JsonRpcRequest) -> Result<JsonRpcResponse> {
        let response = self
            .client
            .post(&self.endpoint.rpc_url)
            .json(request)
            .send()
            .await
            .map_err(|e| request_error(&request.method, &e))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| request_error(&request.method, &e))?;
        serde_json::from_slice::<JsonRpcResponse>(&body).map_err(|_| {
            GatewayError::blockchain_node(format!(
                "invalid response for {} (HTTP {})",
                request.method, status
            ))
        })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest::new(id, method, params);
        tracing::trace!(method, id, "calling node");
        self.post(&request)
            .await?
            .decode_result()
            .map_err(|e| e.with_context(method))
    }
}

#[async_trait]
impl Session for HttpSession {
    async fn chain_id(&self) -> Result<u64> {
        let id: U64 = self.call("eth_chainId", json!([])).await?;
        Ok(id.to::<u64>())
    }

    async fn gas_price(&self) -> Result<U256> {
        self.call("eth_gasPrice", json!([])).await
    }

    async fn max_priority_fee_per_gas(&self) -> Result<U256> {
        self.call("eth_maxPriorityFeePerGas", json!([])).await
    }

    async fn estimate_gas(&self, call: &CallMsg) -> Result<u64> {
        let gas: U64 = self.call("eth_estimateGas", json!([call])).await?;
        Ok(gas.to::<u64>())
    }

    async fn pending_nonce(&self, address: Address) -> Result<u64> {
        let nonce: U64 = self
            .call("eth_getTransactionCount", json!([address, "pending"]))
            .await?;
        Ok(nonce.to::<u64>())
    }

    async fn private_nonce(&self, address: Address, privacy_group_id: &str) -> Result<u64> {
        let nonce: U64 = self
            .call("priv_getTransactionCount", json!([address, privacy_group_id]))
            .await?;
        Ok(nonce.to::<u64>())
    }

    async fn eea_nonce(
        &self,
        address: Address,
        private_from: &str,
        private_for: &[String],
    ) -> Result<u64> {
        let nonce: U64 = self
            .call(
                "priv_getEeaTransactionCount",
                json!([address, private_from, private_for]),
            )
            .await?;
        Ok(nonce.to::<u64>())
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256> {
        self.call("eth_sendRawTransaction", json!([raw_hex(raw)]))
            .await
    }

    async fn send_raw_private_transaction(
        &self,
        raw: &[u8],
        private_for: &[String],
    ) -> Result<B256> {
        self.call(
            "eth_sendRawPrivateTransaction",
            json!([raw_hex(raw), { "privateFor": private_for }]),
        )
        .await
    }

    async fn eea_send_raw_transaction(&self, raw: &[u8]) -> Result<B256> {
        self.call("eea_sendRawTransaction", json!([raw_hex(raw)]))
            .await
    }

    async fn store_raw(&self, payload: &[u8], private_from: Option<&str>) -> Result<Vec<u8>> {
        let base = self.endpoint.privacy_manager_url.as_deref().ok_or_else(|| {
            GatewayError::blockchain_node("no privacy manager configured for this node")
        })?;
        let url = format!(
            "{}/{}",
            base.trim_end_matches('/'),
            PRIVACY_MANAGER_STORE_RAW_PATH
        );
        let body = StoreRawRequest {
            payload: BASE64.encode(payload),
            from: private_from,
        };
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| request_error(PRIVACY_MANAGER_STORE_RAW_PATH, &e))?;
        if !response.status().is_success() {
            return Err(GatewayError::blockchain_node(format!(
                "privacy manager answered HTTP {}",
                response.status()
            )));
        }
        let stored: StoreRawResponse = response
            .json()
            .await
            .map_err(|e| request_error(PRIVACY_MANAGER_STORE_RAW_PATH, &e))?;
        BASE64.decode(stored.key.as_bytes()).map_err(|e| {
            GatewayError::blockchain_node(format!("privacy manager returned a bad key: {}", e))
        })
    }

    async fn forward(&self, request: &JsonRpcRequest) -> Result<JsonRpcResponse> {
        self.post(request).await
    }
}
