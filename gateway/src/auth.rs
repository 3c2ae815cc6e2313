//! Caller identity and permission checks.
//!
//! Permissions are `action:resource` strings where either side may be `*`.
//! The gateway only ever asks two questions: may this caller read aliases,
//! and may this caller use (sign with or list) Ethereum accounts.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, Result};

/// Identity of the caller, threaded explicitly through every pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// Authenticated user name.
    pub username: String,
    /// Tenant the user belongs to. Resources are scoped by tenant.
    pub tenant: String,
    /// Granted permissions, e.g. `"sign:ethereum"` or `"*:*"`.
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl UserInfo {
    pub fn new(username: impl Into<String>, tenant: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            tenant: tenant.into(),
            permissions: Vec::new(),
        }
    }

    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions = permissions.into_iter().map(Into::into).collect();
        self
    }

    /// True when `tenants` is empty or contains this user's tenant.
    pub fn can_access_tenant(&self, tenants: &[String]) -> bool {
        tenants.is_empty() || tenants.iter().any(|t| *t == self.tenant)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Sign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Alias,
    Ethereum,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Read => "read",
            Action::Sign => "sign",
        })
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Resource::Alias => "alias",
            Resource::Ethereum => "ethereum",
        })
    }
}

/// Answers permission questions for a caller.
pub trait Authorizator: Send + Sync {
    /// Fails with a permission-denied error when `user` may not perform
    /// `action` on `resource`.
    fn check_permission(&self, user: &UserInfo, action: Action, resource: Resource) -> Result<()>;
}

/// Matches the caller's `action:resource` permission strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionAuthorizator;

impl PermissionAuthorizator {
    fn grants(permission: &str, action: Action, resource: Resource) -> bool {
        let Some((granted_action, granted_resource)) = permission.split_once(':') else {
            return false;
        };
        let action_ok = granted_action == "*" || granted_action == action.to_string();
        let resource_ok = granted_resource == "*" || granted_resource == resource.to_string();
        action_ok && resource_ok
    }
}

impl Authorizator for PermissionAuthorizator {
    fn check_permission(&self, user: &UserInfo, action: Action, resource: Resource) -> Result<()> {
        if user
            .permissions
            .iter()
            .any(|p| Self::grants(p, action, resource))
        {
            return Ok(());
        }
        tracing::debug!(
            user = %user.username,
            tenant = %user.tenant,
            %action,
            %resource,
            "permission denied"
        );
        Err(GatewayError::permission_denied(format!(
            "missing permission {}:{}",
            action, resource
        )))
    }
}

/// Grants everything. Useful for single-tenant deployments and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl Authorizator for AllowAll {
    fn check_permission(&self, _: &UserInfo, _: Action, _: Resource) -> Result<()> {
        Ok(())
    }
}
