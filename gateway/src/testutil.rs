//! Test doubles shared by the unit tests.

use alloy_primitives::{hex, Address, B256, U256};
use async_trait::async_trait;
use k256::ecdsa::VerifyingKey;
use parking_lot::Mutex;
use serde_json::json;

use crate::accounts::{KeySigner, SigningAlgorithm};
use crate::error::{GatewayError, Result};
use crate::ethereum::{public_key_to_address, CallMsg};
use crate::jsonrpc::{JsonRpcRequest, JsonRpcResponse};
use crate::session::Session;

/// Address of an uncompressed hex public key.
pub fn address_of(pubkey_hex: &str) -> Address {
    let bytes = hex::decode(pubkey_hex).unwrap();
    public_key_to_address(&VerifyingKey::from_sec1_bytes(&bytes).unwrap())
}

/// A signer answering every digest with the same canned signature.
pub struct StaticSigner {
    pub address: Address,
    pub signature: [u8; 64],
    pub algorithm: SigningAlgorithm,
}

impl StaticSigner {
    pub fn new(address: Address, signature_hex: &str) -> Self {
        let mut signature = [0u8; 64];
        signature.copy_from_slice(&hex::decode(signature_hex).unwrap());
        Self {
            address,
            signature,
            algorithm: SigningAlgorithm::EcdsaSecp256k1,
        }
    }
}

#[async_trait]
impl KeySigner for StaticSigner {
    fn address(&self) -> Address {
        self.address
    }

    fn algorithm(&self) -> SigningAlgorithm {
        self.algorithm
    }

    async fn sign_digest(&self, _digest: B256) -> Result<[u8; 64]> {
        Ok(self.signature)
    }
}

/// Canned node answers plus a log of every call made.
#[derive(Default)]
pub struct MockSession {
    pub chain_id: u64,
    pub gas_price: U256,
    pub tip: U256,
    pub estimate: u64,
    pub pending_nonce: u64,
    pub private_nonce: u64,
    pub eea_nonce: u64,
    pub tx_hash: B256,
    pub stored_key: Vec<u8>,
    pub fail_with: Option<GatewayError>,
    pub calls: Mutex<Vec<String>>,
    pub estimates: Mutex<Vec<CallMsg>>,
    pub submitted: Mutex<Vec<Vec<u8>>>,
    pub stored: Mutex<Vec<Vec<u8>>>,
}

impl MockSession {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, call: impl Into<String>) -> Result<()> {
        self.calls.lock().push(call.into());
        match &self.fail_with {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Session for MockSession {
    async fn chain_id(&self) -> Result<u64> {
        self.record("eth_chainId")?;
        Ok(self.chain_id)
    }

    async fn gas_price(&self) -> Result<U256> {
        self.record("eth_gasPrice")?;
        Ok(self.gas_price)
    }

    async fn max_priority_fee_per_gas(&self) -> Result<U256> {
        self.record("eth_maxPriorityFeePerGas")?;
        Ok(self.tip)
    }

    async fn estimate_gas(&self, call: &CallMsg) -> Result<u64> {
        self.record("eth_estimateGas")?;
        self.estimates.lock().push(call.clone());
        Ok(self.estimate)
    }

    async fn pending_nonce(&self, _address: Address) -> Result<u64> {
        self.record("eth_getTransactionCount")?;
        Ok(self.pending_nonce)
    }

    async fn private_nonce(&self, _address: Address, group: &str) -> Result<u64> {
        self.record(format!("priv_getTransactionCount:{}", group))?;
        Ok(self.private_nonce)
    }

    async fn eea_nonce(&self, _address: Address, _from: &str, for_: &[String]) -> Result<u64> {
        self.record(format!("priv_getEeaTransactionCount:{}", for_.join(",")))?;
        Ok(self.eea_nonce)
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256> {
        self.record("eth_sendRawTransaction")?;
        self.submitted.lock().push(raw.to_vec());
        Ok(self.tx_hash)
    }

    async fn send_raw_private_transaction(&self, raw: &[u8], for_: &[String]) -> Result<B256> {
        self.record(format!("eth_sendRawPrivateTransaction:{}", for_.join(",")))?;
        self.submitted.lock().push(raw.to_vec());
        Ok(self.tx_hash)
    }

    async fn eea_send_raw_transaction(&self, raw: &[u8]) -> Result<B256> {
        self.record("eea_sendRawTransaction")?;
        self.submitted.lock().push(raw.to_vec());
        Ok(self.tx_hash)
    }

    async fn store_raw(&self, payload: &[u8], _from: Option<&str>) -> Result<Vec<u8>> {
        self.record("storeraw")?;
        self.stored.lock().push(payload.to_vec());
        Ok(self.stored_key.clone())
    }

    async fn forward(&self, request: &JsonRpcRequest) -> Result<JsonRpcResponse> {
        self.record(format!("forward:{}", request.method))?;
        Ok(JsonRpcResponse::success(request.id.clone(), json!("0x10")))
    }
}
