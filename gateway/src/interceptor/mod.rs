//! # Node interceptor
//!
//! Entry point of the gateway. Every JSON-RPC request addressed to a node
//! goes through [`NodeInterceptor::serve_rpc`], which routes it through the
//! `(version, method)` table and either runs one of the signing pipelines or
//! forwards the request verbatim to the node.
//!
//! ```text
//! mod.rs                  routing, deadline, outcome logging
//! accounts.rs             eth_accounts
//! sign.rs                 eth_sign, eth_signTransaction
//! send_transaction.rs     eth_sendTransaction (public and Quorum private)
//! eea_send_transaction.rs eea_sendTransaction
//! privacy.rs              alias resolution of privacy fields
//! ```

mod accounts;
mod eea_send_transaction;
mod privacy;
mod send_transaction;
mod sign;

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::accounts::AccountDirectory;
use crate::aliases::AliasResolver;
use crate::auth::UserInfo;
use crate::error::{GatewayError, Result};
use crate::jsonrpc::{JsonRpcRequest, JsonRpcResponse, Route, Router};
use crate::session::Session;
use crate::signer::SigningEngine;

/// Tunables of the interceptor.
#[derive(Debug, Clone, Default)]
pub struct InterceptorConfig {
    /// Upper bound on the time spent serving one request, node calls
    /// included. `None` disables the deadline.
    pub request_timeout: Option<Duration>,
}

/// Routes JSON-RPC requests to the signing pipelines or the node.
pub struct NodeInterceptor {
    router: Router,
    accounts: Arc<dyn AccountDirectory>,
    aliases: AliasResolver,
    engine: SigningEngine,
    config: InterceptorConfig,
}

impl NodeInterceptor {
    pub fn new(
        accounts: Arc<dyn AccountDirectory>,
        aliases: AliasResolver,
        config: InterceptorConfig,
    ) -> Self {
        Self {
            router: Router::default(),
            accounts,
            aliases,
            engine: SigningEngine::new(),
            config,
        }
    }

    /// Serves one request on behalf of `user` against `session`.
    ///
    /// Never fails: every error becomes a JSON-RPC error object carrying the
    /// request id.
    pub async fn serve_rpc(
        &self,
        user: &UserInfo,
        session: &dyn Session,
        request: JsonRpcRequest,
    ) -> JsonRpcResponse {
        let id = request.id.clone();
        let outcome = match self.router.resolve(&request.jsonrpc, &request.method) {
            Ok(route) => self.with_deadline(self.handle(route, user, session, &request)).await,
            Err(err) => Err(err),
        };

        match outcome {
            Ok(response) => {
                tracing::debug!(method = %request.method, id = %id, "request served");
                response
            }
            Err(err) => {
                tracing::warn!(
                    method = %request.method,
                    id = %id,
                    account = request_account(&request).unwrap_or("-"),
                    code = err.code(),
                    error = %err.message,
                    "request failed"
                );
                JsonRpcResponse::failure(id, err.into())
            }
        }
    }

    async fn with_deadline<F>(&self, fut: F) -> Result<JsonRpcResponse>
    where
        F: std::future::Future<Output = Result<JsonRpcResponse>>,
    {
        match self.config.request_timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .unwrap_or_else(|_| Err(GatewayError::blockchain_node("request deadline exceeded"))),
            None => fut.await,
        }
    }

    async fn handle(
        &self,
        route: Route,
        user: &UserInfo,
        session: &dyn Session,
        request: &JsonRpcRequest,
    ) -> Result<JsonRpcResponse> {
        let result: Value = match route {
            Route::Proxy => return session.forward(request).await,
            Route::Silenced => return Err(GatewayError::method_not_found()),
            Route::EthAccounts => self.eth_accounts(user).await?,
            Route::EthSign => self.eth_sign(user, request).await?,
            Route::EthSignTransaction => self.eth_sign_transaction(user, session, request).await?,
            Route::EthSendTransaction => self.eth_send_transaction(user, session, request).await?,
            Route::EeaSendTransaction => self.eea_send_transaction(user, session, request).await?,
        };
        Ok(JsonRpcResponse::success(request.id.clone(), result))
    }
}

/// The account a request acts for: the first positional parameter, or its
/// `from` field.
fn request_account(request: &JsonRpcRequest) -> Option<&str> {
    let first = request.params.get(0)?;
    first
        .as_str()
        .or_else(|| first.get("from").and_then(Value::as_str))
}

/// Serializes a handler result.
fn to_value(value: impl serde::Serialize) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| GatewayError::internal(e.to_string()))
}
