//! In-memory accounts backed by local secp256k1 keys.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use k256::ecdsa::signature::hazmat::PrehashSigner;
use k256::ecdsa::{Signature, SigningKey};
use parking_lot::RwLock;

use super::{AccountDirectory, KeySigner};
use crate::auth::{Action, Authorizator, Resource, UserInfo};
use crate::config::RAW_SIGNATURE_LEN;
use crate::error::{GatewayError, Result};
use crate::ethereum::public_key_to_address;

/// A secp256k1 key held in process memory.
pub struct LocalKeySigner {
    key: SigningKey,
    address: Address,
}

impl LocalKeySigner {
    pub fn new(key: SigningKey) -> Self {
        let address = public_key_to_address(key.verifying_key());
        Self { key, address }
    }

    /// Parses a hex private key, with or without `0x`.
    pub fn from_hex(private_key: &str) -> Result<Self> {
        let bytes = hex::decode(private_key.trim().trim_start_matches("0x"))
            .map_err(|e| GatewayError::invalid_format(format!("invalid private key hex: {}", e)))?;
        let key = SigningKey::from_slice(&bytes)
            .map_err(|_| GatewayError::invalid_format("invalid secp256k1 private key"))?;
        Ok(Self::new(key))
    }
}

impl fmt::Debug for LocalKeySigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalKeySigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl KeySigner for LocalKeySigner {
    fn address(&self) -> Address {
        self.address
    }

    async fn sign_digest(&self, digest: B256) -> Result<[u8; RAW_SIGNATURE_LEN]> {
        let signature: Signature = self
            .key
            .sign_prehash(digest.as_slice())
            .map_err(|e| GatewayError::signing_backend(e.to_string()))?;
        let mut out = [0u8; RAW_SIGNATURE_LEN];
        out.copy_from_slice(&signature.to_bytes());
        Ok(out)
    }
}

struct AccountEntry {
    signer: Arc<dyn KeySigner>,
    allowed_tenants: Vec<String>,
}

/// Directory of signers registered at start-up.
pub struct LocalAccounts {
    accounts: RwLock<HashMap<Address, AccountEntry>>,
    authorizator: Arc<dyn Authorizator>,
}

impl LocalAccounts {
    pub fn new(authorizator: Arc<dyn Authorizator>) -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            authorizator,
        }
    }

    /// Registers `signer` for `allowed_tenants` (empty means every tenant).
    /// Returns the signer's address.
    pub fn insert(&self, signer: Arc<dyn KeySigner>, allowed_tenants: Vec<String>) -> Address {
        let address = signer.address();
        self.accounts.write().insert(
            address,
            AccountEntry {
                signer,
                allowed_tenants,
            },
        );
        tracing::debug!(%address, "account registered");
        address
    }

    pub fn len(&self) -> usize {
        self.accounts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.read().is_empty()
    }
}

#[async_trait]
impl AccountDirectory for LocalAccounts {
    async fn resolve(&self, address: Address, user: &UserInfo) -> Result<Arc<dyn KeySigner>> {
        self.authorizator
            .check_permission(user, Action::Sign, Resource::Ethereum)?;
        self.accounts
            .read()
            .get(&address)
            .filter(|entry| user.can_access_tenant(&entry.allowed_tenants))
            .map(|entry| Arc::clone(&entry.signer))
            .ok_or_else(|| GatewayError::not_found(format!("account not found: {}", address)))
    }

    async fn list(&self, user: &UserInfo) -> Result<Vec<Address>> {
        self.authorizator
            .check_permission(user, Action::Read, Resource::Ethereum)?;
        let mut addresses: Vec<Address> = self
            .accounts
            .read()
            .iter()
            .filter(|(_, entry)| user.can_access_tenant(&entry.allowed_tenants))
            .map(|(address, _)| *address)
            .collect();
        addresses.sort();
        Ok(addresses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AllowAll, PermissionAuthorizator};
    use crate::error::ErrorKind;
    use crate::ethereum::normalize;
    use alloy_primitives::keccak256;

    const KEY: &str = "0x56202652fdffd802b7252a456dbd8f3ecc0352bbde76c23b40afe8aebd714e2e";

    #[tokio::test]
    async fn local_signature_recovers_to_address() {
        let signer = LocalKeySigner::from_hex(KEY).unwrap();
        assert_eq!(
            signer.address(),
            "0x7e654d251da770a068413677967f6d3ea2fea9e4".parse::<Address>().unwrap()
        );
        let digest = keccak256(b"hello");
        let raw = signer.sign_digest(digest).await.unwrap();
        assert!(normalize(&digest, &raw, signer.address()).is_ok());
    }

    #[test]
    fn debug_hides_key_material() {
        let signer = LocalKeySigner::from_hex(KEY).unwrap();
        let debug = format!("{:?}", signer);
        assert!(!debug.contains("56202652"));
    }

    #[test]
    fn rejects_bad_keys() {
        assert!(LocalKeySigner::from_hex("zz").is_err());
        assert!(LocalKeySigner::from_hex(&"00".repeat(32)).is_err());
    }

    #[tokio::test]
    async fn tenant_scoping() {
        let accounts = LocalAccounts::new(Arc::new(AllowAll));
        let address = accounts.insert(
            Arc::new(LocalKeySigner::from_hex(KEY).unwrap()),
            vec!["acme".into()],
        );

        let acme = UserInfo::new("a", "acme");
        let other = UserInfo::new("b", "globex");

        assert!(accounts.resolve(address, &acme).await.is_ok());
        let err = match accounts.resolve(address, &other).await {
            Err(e) => e,
            Ok(_) => panic!("account leaked across tenants"),
        };
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(accounts.list(&acme).await.unwrap(), vec![address]);
        assert!(accounts.list(&other).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn signing_requires_permission() {
        let accounts = LocalAccounts::new(Arc::new(PermissionAuthorizator));
        let address = accounts.insert(Arc::new(LocalKeySigner::from_hex(KEY).unwrap()), vec![]);
        let reader = UserInfo::new("r", "t").with_permissions(["read:ethereum"]);

        assert_eq!(accounts.list(&reader).await.unwrap().len(), 1);
        let err = match accounts.resolve(address, &reader).await {
            Err(e) => e,
            Ok(_) => panic!("signing allowed without permission"),
        };
        assert_eq!(err.kind, ErrorKind::PermissionDenied);
    }
}
