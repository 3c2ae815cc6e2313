//! `{{registry:key}}` token resolution.

use std::sync::Arc;

use serde_json::Value;

use super::store::{Alias, AliasKind, AliasStore};
use crate::auth::{Action, Authorizator, Resource, UserInfo};
use crate::error::{GatewayError, Result};

/// Resolves alias tokens against an [`AliasStore`].
///
/// The authorizator is injected at construction; every lookup requires
/// `read:alias`.
#[derive(Clone)]
pub struct AliasResolver {
    store: Arc<dyn AliasStore>,
    authorizator: Arc<dyn Authorizator>,
}

impl AliasResolver {
    pub fn new(store: Arc<dyn AliasStore>, authorizator: Arc<dyn Authorizator>) -> Self {
        Self {
            store,
            authorizator,
        }
    }

    /// Splits `{{registry:key}}` into its parts.
    ///
    /// Returns `None` for anything that is not exactly one alias token, so
    /// plain base64 keys pass through untouched.
    pub fn parse(token: &str) -> Option<(&str, &str)> {
        let inner = token.strip_prefix("{{")?.strip_suffix("}}")?;
        let (registry, key) = inner.split_once(':')?;
        let valid = |s: &str| {
            !s.is_empty()
                && s
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+'))
        };
        (valid(registry) && valid(key)).then_some((registry, key))
    }

    /// Fetches a single alias after checking the read permission.
    pub async fn get(&self, registry: &str, key: &str, user: &UserInfo) -> Result<Alias> {
        self.authorizator
            .check_permission(user, Action::Read, Resource::Alias)?;
        self.store.get_alias(registry, key, user).await
    }

    /// Replaces every alias token in `tokens` by its value(s).
    ///
    /// Array aliases are spliced in place, string aliases replace the token,
    /// non-alias tokens are kept verbatim. Order is preserved.
    pub async fn replace(&self, tokens: &[String], user: &UserInfo) -> Result<Vec<String>> {
        self.authorizator
            .check_permission(user, Action::Read, Resource::Alias)?;

        let mut out = Vec::with_capacity(tokens.len());
        for token in tokens {
            match Self::parse(token) {
                Some((registry, key)) => {
                    let alias = self.store.get_alias(registry, key, user).await?;
                    out.extend(alias_values(&alias)?);
                }
                None => out.push(token.clone()),
            }
        }
        Ok(out)
    }

    /// Replaces a single token that must resolve to exactly one value.
    pub async fn replace_simple(&self, token: &str, user: &UserInfo) -> Result<String> {
        let mut values = self.replace(&[token.to_string()], user).await?;
        if values.len() != 1 {
            return Err(GatewayError::encoding(
                "alias should only have exactly 1 value",
            ));
        }
        Ok(values.remove(0))
    }
}

/// The values an alias expands to, validating its declared kind.
pub fn alias_values(alias: &Alias) -> Result<Vec<String>> {
    match alias.kind {
        AliasKind::String => match &alias.value {
            Value::String(s) => Ok(vec![s.clone()]),
            _ => Err(GatewayError::encoding("bad string format")),
        },
        AliasKind::Array => match &alias.value {
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| GatewayError::encoding("bad array format"))
                })
                .collect(),
            _ => Err(GatewayError::encoding("bad array format")),
        },
        AliasKind::Unknown => Err(GatewayError::encoding("bad value kind")),
    }
}
