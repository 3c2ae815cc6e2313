//! Alias registries and their storage.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::UserInfo;
use crate::error::{GatewayError, Result};

/// Declared kind of an alias value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AliasKind {
    String,
    Array,
    /// Any kind this gateway does not understand.
    #[serde(other)]
    Unknown,
}

/// A named value inside a registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alias {
    #[serde(default)]
    pub registry: String,
    pub key: String,
    pub kind: AliasKind,
    pub value: Value,
}

impl Alias {
    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            registry: String::new(),
            key: key.into(),
            kind: AliasKind::String,
            value: Value::String(value.into()),
        }
    }

    pub fn array<I, S>(key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            registry: String::new(),
            key: key.into(),
            kind: AliasKind::Array,
            value: Value::Array(values.into_iter().map(|v| Value::String(v.into())).collect()),
        }
    }
}

/// A tenant-scoped collection of aliases.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Registry {
    pub name: String,
    /// Tenants allowed to read the registry. Empty means every tenant.
    #[serde(default)]
    pub allowed_tenants: Vec<String>,
    #[serde(default)]
    pub aliases: Vec<Alias>,
}

/// Read access to alias registries.
#[async_trait]
pub trait AliasStore: Send + Sync {
    /// Fetches `key` from `registry`, as visible to `user`'s tenant.
    async fn get_alias(&self, registry: &str, key: &str, user: &UserInfo) -> Result<Alias>;
}

/// Registries held in memory, typically loaded from the gateway config.
#[derive(Debug, Default)]
pub struct InMemoryAliasStore {
    registries: RwLock<HashMap<String, Registry>>,
}

impl InMemoryAliasStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a registry. Aliases inherit the registry name.
    pub fn put_registry(&self, mut registry: Registry) {
        for alias in &mut registry.aliases {
            alias.registry = registry.name.clone();
        }
        self.registries.write().insert(registry.name.clone(), registry);
    }
}

#[async_trait]
impl AliasStore for InMemoryAliasStore {
    async fn get_alias(&self, registry: &str, key: &str, user: &UserInfo) -> Result<Alias> {
        let registries = self.registries.read();
        let found = registries
            .get(registry)
            .filter(|r| user.can_access_tenant(&r.allowed_tenants))
            .ok_or_else(|| GatewayError::not_found(format!("registry not found: {}", registry)))?;
        found
            .aliases
            .iter()
            .find(|a| a.key == key)
            .cloned()
            .ok_or_else(|| GatewayError::not_found(format!("alias not found: {}:{}", registry, key)))
    }
}
