//! Signing engine.
//!
//! Turns a digest into a signature a node will accept. The key signer only
//! produces `R || S`; the engine normalizes it to low-S, finds the recovery
//! id that yields the account address, and encodes the result for the
//! requested family.

use alloy_primitives::{keccak256, B256};

use crate::accounts::{KeySigner, SigningAlgorithm};
use crate::config::{HOMESTEAD_V_OFFSET, SIGNED_MESSAGE_PREFIX};
use crate::error::{GatewayError, Result};
use crate::ethereum::{normalize, RecoverableSignature, TxFamily, TypedTransaction};

/// `keccak256("\x19Ethereum Signed Message:\n" + len(data) + data)`.
pub fn message_hash(data: &[u8]) -> B256 {
    let mut prefixed = Vec::with_capacity(SIGNED_MESSAGE_PREFIX.len() + 20 + data.len());
    prefixed.extend_from_slice(SIGNED_MESSAGE_PREFIX.as_bytes());
    prefixed.extend_from_slice(data.len().to_string().as_bytes());
    prefixed.extend_from_slice(data);
    keccak256(prefixed)
}

/// Stateless; one instance is shared by every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct SigningEngine;

impl SigningEngine {
    pub fn new() -> Self {
        Self
    }

    /// Signs `data` the way `eth_sign` does. Returns `R || S || recId + 27`.
    pub async fn sign_message(&self, signer: &dyn KeySigner, data: &[u8]) -> Result<[u8; 65]> {
        let signature = self.sign_digest(signer, message_hash(data)).await?;
        let v = u8::try_from(u64::from(signature.rec_id) + HOMESTEAD_V_OFFSET)
            .map_err(|_| GatewayError::internal("recovery id out of range"))?;
        tracing::info!(address = %signer.address(), "message signed");
        Ok(signature.to_bytes_with_v(v))
    }

    /// Signs a legacy, access-list or dynamic-fee transaction.
    pub async fn sign_transaction(
        &self,
        signer: &dyn KeySigner,
        tx: &TypedTransaction,
    ) -> Result<Vec<u8>> {
        match tx.family() {
            TxFamily::Legacy | TxFamily::AccessList | TxFamily::DynamicFee => {
                self.sign_typed(signer, tx).await
            }
            other => Err(wrong_family("public", other)),
        }
    }

    /// Signs a Quorum private transaction (`v = recId + 37`).
    pub async fn sign_private(
        &self,
        signer: &dyn KeySigner,
        tx: &TypedTransaction,
    ) -> Result<Vec<u8>> {
        match tx.family() {
            TxFamily::QuorumPrivate => self.sign_typed(signer, tx).await,
            other => Err(wrong_family("quorum-private", other)),
        }
    }

    /// Signs an EEA private transaction.
    pub async fn sign_eea(&self, signer: &dyn KeySigner, tx: &TypedTransaction) -> Result<Vec<u8>> {
        match tx.family() {
            TxFamily::EeaPrivate => self.sign_typed(signer, tx).await,
            other => Err(wrong_family("eea-private", other)),
        }
    }

    async fn sign_typed(&self, signer: &dyn KeySigner, tx: &TypedTransaction) -> Result<Vec<u8>> {
        let signature = self.sign_digest(signer, tx.signing_hash()).await?;
        let raw = tx.encode_signed(&signature)?;
        tracing::info!(
            address = %signer.address(),
            family = tx.family().as_str(),
            "transaction signed"
        );
        Ok(raw)
    }

    async fn sign_digest(
        &self,
        signer: &dyn KeySigner,
        digest: B256,
    ) -> Result<RecoverableSignature> {
        let address = signer.address();
        if signer.algorithm() != SigningAlgorithm::EcdsaSecp256k1 {
            return Err(GatewayError::not_supported(format!(
                "account {} does not use ecdsa/secp256k1",
                address
            )));
        }
        let raw = signer.sign_digest(digest).await.map_err(|e| {
            tracing::warn!(%address, error = %e, "signing backend failed");
            e
        })?;
        normalize(&digest, &raw, address).map_err(|e| {
            tracing::warn!(%address, error = %e, "signature rejected");
            e
        })
    }
}

fn wrong_family(expected: &str, got: TxFamily) -> GatewayError {
    GatewayError::internal(format!(
        "expected a {} transaction, got {}",
        expected,
        got.as_str()
    ))
}
