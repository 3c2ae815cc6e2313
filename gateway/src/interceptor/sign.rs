//! `eth_sign` and `eth_signTransaction`.

use alloy_primitives::{Address, Bytes};
use serde_json::Value;

use super::{to_value, NodeInterceptor};
use crate::auth::UserInfo;
use crate::error::{GatewayError, Result, ResultExt};
use crate::ethereum::{SendTxMsg, TransactionBuilder, TxFamily};
use crate::jsonrpc::JsonRpcRequest;
use crate::session::Session;

impl NodeInterceptor {
    /// Signs arbitrary data with the `\x19Ethereum Signed Message` prefix.
    pub(super) async fn eth_sign(&self, user: &UserInfo, request: &JsonRpcRequest) -> Result<Value> {
        let (from, data): (Address, Bytes) = request.params()?;
        tracing::debug!(%from, "signing payload");

        let signer = self.accounts.resolve(from, user).await?;
        let signature = self.engine.sign_message(signer.as_ref(), &data).await?;
        to_value(Bytes::copy_from_slice(&signature))
    }

    /// Signs a transaction without submitting it.
    ///
    /// Nothing is defaulted except `data` and the chain id: the caller must
    /// supply nonce, gas and pricing. Private requests are signed as Quorum
    /// private transactions with their payload as given.
    pub(super) async fn eth_sign_transaction(
        &self,
        user: &UserInfo,
        session: &dyn Session,
        request: &JsonRpcRequest,
    ) -> Result<Value> {
        let (mut msg,): (SendTxMsg,) = request.params()?;
        if msg.gas.is_none() {
            return Err(GatewayError::invalid_parameter("gas not specified"));
        }
        if msg.nonce.is_none() {
            return Err(GatewayError::invalid_parameter("nonce not specified"));
        }
        if msg.data.is_none() {
            msg.data = Some(Bytes::new());
        }
        tracing::debug!(from = %msg.from, "signing transaction");

        let signer = self.accounts.resolve(msg.from, user).await?;
        let chain_id = session
            .chain_id()
            .await
            .context_with(|| "failed to fetch chain id")?;

        let family = msg.family()?;
        let tx = TransactionBuilder::new(family, chain_id).build(&msg)?;
        let raw = match family {
            TxFamily::QuorumPrivate => self.engine.sign_private(signer.as_ref(), &tx).await?,
            _ => self.engine.sign_transaction(signer.as_ref(), &tx).await?,
        };
        to_value(Bytes::from(raw))
    }
}
