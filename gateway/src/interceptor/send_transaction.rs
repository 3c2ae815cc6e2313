//! `eth_sendTransaction`.
//!
//! Public transactions are defaulted, signed and submitted with
//! `eth_sendRawTransaction`. A request carrying any privacy field is a
//! GoQuorum private transaction: its payload goes to the privacy manager
//! first, the transaction carries the returned key instead, and submission
//! goes through `eth_sendRawPrivateTransaction`.

use alloy_primitives::Bytes;
use serde_json::Value;

use super::{to_value, NodeInterceptor};
use crate::accounts::KeySigner;
use crate::auth::UserInfo;
use crate::defaulter::FieldDefaulter;
use crate::error::{GatewayError, Result, ResultExt};
use crate::ethereum::{SendTxMsg, TransactionBuilder, TxFamily};
use crate::jsonrpc::JsonRpcRequest;
use crate::session::Session;

impl NodeInterceptor {
    pub(super) async fn eth_send_transaction(
        &self,
        user: &UserInfo,
        session: &dyn Session,
        request: &JsonRpcRequest,
    ) -> Result<Value> {
        let (msg,): (SendTxMsg,) = request.params()?;
        let family = msg.family()?;
        tracing::debug!(from = %msg.from, family = family.as_str(), "sending transaction");

        let signer = self.accounts.resolve(msg.from, user).await?;
        match family {
            TxFamily::QuorumPrivate => self.send_private(user, session, signer.as_ref(), msg).await,
            _ => self.send_public(session, signer.as_ref(), msg, family).await,
        }
    }

    async fn send_public(
        &self,
        session: &dyn Session,
        signer: &dyn KeySigner,
        mut msg: SendTxMsg,
        family: TxFamily,
    ) -> Result<Value> {
        let defaulter = FieldDefaulter::new(session);
        defaulter.fill_transaction(&mut msg, family).await?;
        let chain_id = defaulter.chain_id().await?;

        let tx = TransactionBuilder::new(family, chain_id).build(&msg)?;
        let raw = self.engine.sign_transaction(signer, &tx).await?;
        let hash = session
            .send_raw_transaction(&raw)
            .await
            .context_with(|| "failed to send raw transaction")?;

        tracing::info!(from = %msg.from, tx_hash = %hash, "transaction sent");
        to_value(hash)
    }

    async fn send_private(
        &self,
        user: &UserInfo,
        session: &dyn Session,
        signer: &dyn KeySigner,
        mut msg: SendTxMsg,
    ) -> Result<Value> {
        self.resolve_privacy(&mut msg.private, user).await?;
        let private_for = msg
            .private
            .private_for
            .clone()
            .ok_or_else(|| GatewayError::invalid_format("missing privateFor"))?;
        if let Some(group) = &msg.private.privacy_group_id {
            return Err(GatewayError::invalid_parameter(format!(
                "privacyGroupId {} is not supported for private transactions, use privateFor",
                group
            )));
        }

        let defaulter = FieldDefaulter::new(session);
        defaulter
            .fill_transaction(&mut msg, TxFamily::QuorumPrivate)
            .await?;

        let payload = msg.data.clone().unwrap_or_default();
        let key = session
            .store_raw(&payload, msg.private.private_from.as_deref())
            .await
            .context_with(|| "failed to store private payload")?;
        msg.data = Some(Bytes::from(key));

        // Quorum private signatures carry no chain id.
        let tx = TransactionBuilder::new(TxFamily::QuorumPrivate, 0).build(&msg)?;
        let raw = self.engine.sign_private(signer, &tx).await?;
        let hash = session
            .send_raw_private_transaction(&raw, &private_for)
            .await
            .context_with(|| "failed to send raw private transaction")?;

        tracing::info!(from = %msg.from, tx_hash = %hash, "private transaction sent");
        to_value(hash)
    }
}
