//! # Gateway Configuration File
//!
//! The server is configured by a single JSON document declaring the
//! downstream nodes, the custodial accounts, the alias registries and the
//! API keys clients authenticate with.
//!
//! ```json
//! {
//!   "nodes": [{ "name": "besu", "rpc_url": "http://127.0.0.1:8545",
//!               "privacy_manager_url": null, "allowed_tenants": [] }],
//!   "accounts": [{ "env_var": "CUSTOS_KEY_0", "allowed_tenants": ["acme"] }],
//!   "registries": [{ "name": "parties", "allowed_tenants": [],
//!                    "aliases": [{ "key": "bank", "kind": "string", "value": "..." }] }],
//!   "api_keys": [{ "key": "secret", "username": "ops", "tenant": "acme",
//!                  "permissions": ["*:*"] }]
//! }
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use custos_gateway::accounts::{LocalAccounts, LocalKeySigner};
use custos_gateway::aliases::{InMemoryAliasStore, Registry};
use custos_gateway::auth::{Authorizator, UserInfo};
use custos_gateway::session::NodeEndpoint;

/// Top-level configuration document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub nodes: Vec<NodeConfig>,
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
    #[serde(default)]
    pub registries: Vec<Registry>,
    #[serde(default)]
    pub api_keys: Vec<ApiKeyConfig>,
}

/// A downstream node clients can address as `/nodes/{name}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeConfig {
    pub name: String,
    pub rpc_url: String,
    #[serde(default)]
    pub privacy_manager_url: Option<String>,
    /// Tenants that may use the node. Empty means every tenant.
    #[serde(default)]
    pub allowed_tenants: Vec<String>,
}

/// A custodial key. Exactly one of `private_key_hex` or `env_var` is set.
#[derive(Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountConfig {
    #[serde(default)]
    pub private_key_hex: Option<String>,
    /// Environment variable holding the hex private key.
    #[serde(default)]
    pub env_var: Option<String>,
    #[serde(default)]
    pub allowed_tenants: Vec<String>,
}

impl std::fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountConfig")
            .field("env_var", &self.env_var)
            .field("allowed_tenants", &self.allowed_tenants)
            .finish_non_exhaustive()
    }
}

/// An API key and the identity it authenticates.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiKeyConfig {
    pub key: String,
    pub username: String,
    pub tenant: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// A configured node, ready to open sessions against.
#[derive(Debug, Clone)]
pub struct NodeRoute {
    pub endpoint: Arc<NodeEndpoint>,
    pub allowed_tenants: Vec<String>,
}

impl GatewayConfig {
    /// Reads and validates the configuration file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config = Self::from_json(&raw)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        Ok(config)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.nodes.is_empty() {
            bail!("at least one node must be configured");
        }

        let mut names = HashSet::new();
        for node in &self.nodes {
            if node.name.is_empty() {
                bail!("node name cannot be empty");
            }
            if !names.insert(node.name.as_str()) {
                bail!("duplicate node name: {}", node.name);
            }
            if !node.rpc_url.starts_with("http://") && !node.rpc_url.starts_with("https://") {
                bail!("node {}: rpc_url must be an http(s) URL", node.name);
            }
        }

        for (index, account) in self.accounts.iter().enumerate() {
            match (&account.private_key_hex, &account.env_var) {
                (Some(_), None) | (None, Some(_)) => {}
                _ => bail!(
                    "account #{}: set exactly one of private_key_hex or env_var",
                    index
                ),
            }
        }

        let mut keys = HashSet::new();
        for api_key in &self.api_keys {
            if api_key.key.is_empty() {
                bail!("api key for user {} is empty", api_key.username);
            }
            if !keys.insert(api_key.key.as_str()) {
                bail!("duplicate api key for user {}", api_key.username);
            }
        }
        Ok(())
    }

    /// Loads every account key into a directory guarded by `authorizator`.
    pub fn build_accounts(&self, authorizator: Arc<dyn Authorizator>) -> Result<LocalAccounts> {
        let accounts = LocalAccounts::new(authorizator);
        for (index, account) in self.accounts.iter().enumerate() {
            let key = match (&account.private_key_hex, &account.env_var) {
                (Some(hex), _) => hex.clone(),
                (None, Some(var)) => std::env::var(var)
                    .with_context(|| format!("account #{}: {} is not set", index, var))?,
                (None, None) => bail!("account #{} has no key source", index),
            };
            let signer = LocalKeySigner::from_hex(&key)
                .map_err(|e| anyhow::anyhow!("account #{}: {}", index, e.message))?;
            let address = accounts.insert(Arc::new(signer), account.allowed_tenants.clone());
            tracing::info!(%address, "custodial account loaded");
        }
        Ok(accounts)
    }

    pub fn build_alias_store(&self) -> InMemoryAliasStore {
        let store = InMemoryAliasStore::new();
        for registry in &self.registries {
            store.put_registry(registry.clone());
        }
        store
    }

    pub fn node_routes(&self) -> HashMap<String, NodeRoute> {
        self.nodes
            .iter()
            .map(|node| {
                let endpoint = NodeEndpoint {
                    rpc_url: node.rpc_url.clone(),
                    privacy_manager_url: node.privacy_manager_url.clone(),
                };
                let route = NodeRoute {
                    endpoint: Arc::new(endpoint),
                    allowed_tenants: node.allowed_tenants.clone(),
                };
                (node.name.clone(), route)
            })
            .collect()
    }

    /// API key to caller identity.
    pub fn users(&self) -> HashMap<String, UserInfo> {
        self.api_keys
            .iter()
            .map(|k| {
                let user = UserInfo::new(&k.username, &k.tenant)
                    .with_permissions(k.permissions.iter().cloned());
                (k.key.clone(), user)
            })
            .collect()
    }
}
