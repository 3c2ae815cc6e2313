//! # Accounts
//!
//! Where custodial keys live. The gateway never handles private key bytes
//! outside a [`KeySigner`]: it asks the [`AccountDirectory`] for the signer
//! owning an address and hands it 32-byte digests.
//!
//! ```text
//! mod.rs    KeySigner / AccountDirectory traits
//! local.rs  LocalKeySigner (k256 key in memory), LocalAccounts directory
//! ```

pub mod local;

use std::sync::Arc;

use alloy_primitives::{Address, B256};
use async_trait::async_trait;

use crate::auth::UserInfo;
use crate::config::RAW_SIGNATURE_LEN;
use crate::error::Result;

pub use local::{LocalAccounts, LocalKeySigner};

/// Curve and scheme of a signing key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningAlgorithm {
    EcdsaSecp256k1,
    EddsaBabyJubJub,
}

/// A signing capability bound to one address.
#[async_trait]
pub trait KeySigner: Send + Sync {
    /// The Ethereum address of the key.
    fn address(&self) -> Address;

    fn algorithm(&self) -> SigningAlgorithm {
        SigningAlgorithm::EcdsaSecp256k1
    }

    /// Signs a 32-byte digest, returning `R || S` without a recovery id.
    ///
    /// `S` may be high; callers normalize.
    async fn sign_digest(&self, digest: B256) -> Result<[u8; RAW_SIGNATURE_LEN]>;
}

/// Maps addresses to signers for a caller.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// Returns the signer owning `address`, or a not-found error if the
    /// account does not exist or is not visible to `user`.
    async fn resolve(&self, address: Address, user: &UserInfo) -> Result<Arc<dyn KeySigner>>;

    /// Addresses `user` may sign with.
    async fn list(&self, user: &UserInfo) -> Result<Vec<Address>>;
}
