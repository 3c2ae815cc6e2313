//! `eea_sendTransaction`.

use serde_json::Value;

use super::{to_value, NodeInterceptor};
use crate::auth::UserInfo;
use crate::defaulter::FieldDefaulter;
use crate::error::{Result, ResultExt};
use crate::ethereum::{SendEeaTxMsg, TransactionBuilder, TxFamily};
use crate::jsonrpc::JsonRpcRequest;
use crate::session::Session;

impl NodeInterceptor {
    /// Defaults, signs and submits a Besu private transaction.
    ///
    /// The nonce comes from the private counter of the privacy group, or of
    /// the `privateFrom`/`privateFor` pair when no group is given.
    pub(super) async fn eea_send_transaction(
        &self,
        user: &UserInfo,
        session: &dyn Session,
        request: &JsonRpcRequest,
    ) -> Result<Value> {
        let (mut msg,): (SendEeaTxMsg,) = request.params()?;
        tracing::debug!(from = %msg.from, "sending EEA transaction");

        let signer = self.accounts.resolve(msg.from, user).await?;
        self.resolve_privacy(&mut msg.private, user).await?;

        let defaulter = FieldDefaulter::new(session);
        defaulter.fill_eea(&mut msg).await?;
        let chain_id = defaulter.chain_id().await?;

        let tx = TransactionBuilder::new(TxFamily::EeaPrivate, chain_id).build_eea(&msg)?;
        let raw = self.engine.sign_eea(signer.as_ref(), &tx).await?;
        let hash = session
            .eea_send_raw_transaction(&raw)
            .await
            .context_with(|| "failed to send raw EEA transaction")?;

        tracing::info!(from = %msg.from, tx_hash = %hash, "EEA transaction sent");
        to_value(hash)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{call, session, setup, ALICE, BOB, CAROL, GROUP};
    use crate::error::codes;
    use alloy_primitives::hex;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;
    use serde_json::json;

    const HASH: &str = "0x6052dd2131667ef3e0a0666f2812db2defceaec91c470bb43de92268e8306778";

    #[tokio::test]
    async fn privacy_group_transaction() {
        let (interceptor, address) = setup();
        let session = session();
        let response = call(
            &interceptor,
            &session,
            json!({
                "jsonrpc": "2.0",
                "method": "eea_sendTransaction",
                "params": [{
                    "from": address,
                    "gas": "0x5208",
                    "gasPrice": "0x9184e72a000",
                    "privacyGroupId": GROUP
                }],
                "id": "abcd"
            }),
        )
        .await;

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"jsonrpc": "2.0", "result": HASH, "id": "abcd"})
        );
        assert_eq!(
            session.calls(),
            vec![
                format!("priv_getTransactionCount:{}", GROUP),
                "eth_chainId".to_string(),
                "eea_sendRawTransaction".to_string(),
            ]
        );

        // nonce 5, then the privacy group and the restriction close the list
        let raw = hex::encode(&session.submitted.lock()[0]);
        let group = hex::encode(BASE64.decode(GROUP).unwrap());
        assert!(raw.contains("058609184e72a000825208"));
        assert!(raw.ends_with(&format!("a0{}8a72657374726963746564", group)));
    }

    #[tokio::test]
    async fn private_for_transaction_uses_eea_nonce() {
        let (interceptor, address) = setup();
        let session = session();
        let response = call(
            &interceptor,
            &session,
            json!({
                "jsonrpc": "2.0",
                "method": "eea_sendTransaction",
                "params": [{
                    "from": address,
                    "gas": "0x5208",
                    "gasPrice": "0x9184e72a000",
                    "privateFrom": "{{parties:alice}}",
                    "privateFor": ["{{parties:consortium}}"]
                }],
                "id": "abcd"
            }),
        )
        .await;

        assert_eq!(response.result, Some(json!(HASH)));
        assert_eq!(
            session.calls()[0],
            format!("priv_getEeaTransactionCount:{},{}", BOB, CAROL)
        );
        assert_eq!(session.submitted.lock().len(), 1);
    }

    #[tokio::test]
    async fn group_alias_array_becomes_private_for() {
        let (interceptor, address) = setup();
        let session = session();
        let response = call(
            &interceptor,
            &session,
            json!({
                "jsonrpc": "2.0",
                "method": "eea_sendTransaction",
                "params": [{
                    "from": address,
                    "gas": "0x5208",
                    "gasPrice": "0x1",
                    "privacyGroupId": "{{parties:consortium}}"
                }],
                "id": 1
            }),
        )
        .await;

        assert!(response.error.is_none());
        assert_eq!(
            session.calls()[0],
            format!("priv_getEeaTransactionCount:{},{}", BOB, CAROL)
        );
    }

    #[tokio::test]
    async fn missing_recipients() {
        let (interceptor, address) = setup();
        let session = session();
        let response = call(
            &interceptor,
            &session,
            json!({
                "jsonrpc": "2.0",
                "method": "eea_sendTransaction",
                "params": [{"from": address, "privateFrom": ALICE}],
                "id": 1
            }),
        )
        .await;

        let error = response.error.unwrap();
        assert_eq!(error.code, codes::INVALID_PARAMS);
        assert_eq!(error.message, "missing privateFor");
    }
}
