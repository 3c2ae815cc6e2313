//! `eth_accounts`.

use serde_json::Value;

use super::{to_value, NodeInterceptor};
use crate::auth::UserInfo;
use crate::error::Result;

impl NodeInterceptor {
    /// Addresses the caller may sign with.
    pub(super) async fn eth_accounts(&self, user: &UserInfo) -> Result<Value> {
        let addresses = self.accounts.list(user).await?;
        tracing::debug!(count = addresses.len(), "listed accounts");
        to_value(addresses)
    }
}
