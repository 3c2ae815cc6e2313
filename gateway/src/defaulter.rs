//! Field defaulting against the live node.
//!
//! Clients may omit nonce, gas and fee fields from `eth_sendTransaction` and
//! `eea_sendTransaction`. The [`FieldDefaulter`] fills each missing field
//! with a query to the downstream node and leaves present fields untouched.
//!
//! Nonces are read from the node on every request and never cached, so two
//! concurrent sends from the same address can observe the same pending
//! nonce. The node rejects the second one.

use alloy_primitives::{Address, Bytes, U256, U64};

use crate::config::GAS_ESTIMATE_PLACEHOLDER;
use crate::error::{GatewayError, Result, ResultExt};
use crate::ethereum::{CallMsg, PrivateArgs, SendEeaTxMsg, SendTxMsg, TxFamily};
use crate::session::Session;

pub struct FieldDefaulter<'a> {
    session: &'a dyn Session,
}

impl<'a> FieldDefaulter<'a> {
    pub fn new(session: &'a dyn Session) -> Self {
        Self { session }
    }

    /// Chain id, fetched fresh.
    pub async fn chain_id(&self) -> Result<u64> {
        self.session
            .chain_id()
            .await
            .context_with(|| "failed to fetch chain id")
    }

    /// Fills a public or Quorum private transaction.
    ///
    /// Quorum private transactions share the public account nonce.
    pub async fn fill_transaction(&self, msg: &mut SendTxMsg, family: TxFamily) -> Result<()> {
        if msg.nonce.is_none() {
            let nonce = self
                .session
                .pending_nonce(msg.from)
                .await
                .context_with(|| "failed to fetch nonce")?;
            msg.nonce = Some(U64::from(nonce));
        }

        match family {
            TxFamily::DynamicFee => self.fill_fee_caps(msg).await?,
            _ => {
                if msg.gas_price.is_none() {
                    msg.gas_price = Some(self.gas_price().await?);
                }
            }
        }

        if msg.data.is_none() {
            msg.data = Some(Bytes::new());
        }

        if msg.gas.is_none() {
            let data = msg.data.clone().unwrap_or_default();
            let gas = self.estimate_gas(msg.from, msg.to, msg.gas_price, data).await?;
            msg.gas = Some(U64::from(gas));
        }
        Ok(())
    }

    /// Fills an EEA private transaction.
    pub async fn fill_eea(&self, msg: &mut SendEeaTxMsg) -> Result<()> {
        if msg.nonce.is_none() {
            let nonce = self.private_nonce(msg.from, &msg.private).await?;
            msg.nonce = Some(U64::from(nonce));
        }

        if msg.gas_price.is_none() {
            msg.gas_price = Some(self.gas_price().await?);
        }

        if msg.data.is_none() {
            msg.data = Some(Bytes::new());
        }

        if msg.gas.is_none() {
            let data = msg.data.clone().unwrap_or_default();
            let gas = self.estimate_gas(msg.from, msg.to, msg.gas_price, data).await?;
            msg.gas = Some(U64::from(gas));
        }

        if msg.private.private_type.is_none() {
            msg.private.private_type = Some(Default::default());
        }
        Ok(())
    }

    async fn private_nonce(&self, from: Address, private: &PrivateArgs) -> Result<u64> {
        if let Some(group) = &private.privacy_group_id {
            return self
                .session
                .private_nonce(from, group)
                .await
                .context_with(|| "failed to fetch private nonce");
        }
        let private_for = private
            .private_for
            .as_deref()
            .ok_or_else(|| GatewayError::invalid_format("missing privateFor"))?;
        let private_from = private.private_from.as_deref().unwrap_or_default();
        self.session
            .eea_nonce(from, private_from, private_for)
            .await
            .context_with(|| "failed to fetch EEA nonce")
    }

    async fn gas_price(&self) -> Result<U256> {
        self.session
            .gas_price()
            .await
            .context_with(|| "failed to fetch gas price")
    }

    /// `maxFeePerGas` defaults to the node gas price and
    /// `maxPriorityFeePerGas` to the node's suggestion, capped by the fee cap.
    async fn fill_fee_caps(&self, msg: &mut SendTxMsg) -> Result<()> {
        let fee_cap = match msg.gas_fee_cap {
            Some(cap) => cap,
            None => self.gas_price().await?,
        };
        let tip = match msg.gas_tip_cap {
            Some(tip) => tip,
            None => self
                .session
                .max_priority_fee_per_gas()
                .await
                .context_with(|| "failed to fetch priority fee")?
                .min(fee_cap),
        };
        msg.gas_fee_cap = Some(fee_cap);
        msg.gas_tip_cap = Some(tip);
        Ok(())
    }

    async fn estimate_gas(
        &self,
        from: Address,
        to: Option<Address>,
        gas_price: Option<U256>,
        data: Bytes,
    ) -> Result<u64> {
        let data = match to {
            Some(_) => Bytes::copy_from_slice(&GAS_ESTIMATE_PLACEHOLDER),
            None => data,
        };
        let call = CallMsg {
            from,
            to,
            gas_price,
            value: None,
            data,
        };
        self.session
            .estimate_gas(&call)
            .await
            .context_with(|| "failed to estimate gas")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::testutil::MockSession;

    fn session() -> MockSession {
        MockSession {
            chain_id: 1998,
            gas_price: U256::from(100u64),
            tip: U256::from(500u64),
            estimate: 21000,
            pending_nonce: 4,
            private_nonce: 5,
            eea_nonce: 6,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn fills_legacy_fields() {
        let session = session();
        let mut msg = SendTxMsg {
            from: Address::repeat_byte(1),
            to: Some(Address::repeat_byte(2)),
            gas_price: None,
            ..Default::default()
        };
        FieldDefaulter::new(&session)
            .fill_transaction(&mut msg, TxFamily::Legacy)
            .await
            .unwrap();

        assert_eq!(msg.nonce, Some(U64::from(4u64)));
        assert_eq!(msg.gas_price, Some(U256::from(100u64)));
        assert_eq!(msg.gas, Some(U64::from(21000u64)));
        assert_eq!(msg.data, Some(Bytes::new()));

        let estimates = session.estimates.lock();
        assert_eq!(estimates[0].data.as_ref(), &GAS_ESTIMATE_PLACEHOLDER[..]);
    }

    #[tokio::test]
    async fn contract_creation_estimates_real_data() {
        let session = session();
        let mut msg = SendTxMsg {
            from: Address::repeat_byte(1),
            data: Some(Bytes::from_static(&[0x60, 0x80])),
            gas_price: Some(U256::from(1u64)),
            ..Default::default()
        };
        FieldDefaulter::new(&session)
            .fill_transaction(&mut msg, TxFamily::Legacy)
            .await
            .unwrap();
        assert_eq!(session.estimates.lock()[0].data.as_ref(), &[0x60, 0x80]);
        assert!(!session.calls().contains(&"eth_gasPrice".to_string()));
    }

    #[tokio::test]
    async fn present_fields_are_untouched() {
        let session = session();
        let mut msg = SendTxMsg {
            from: Address::repeat_byte(1),
            nonce: Some(U64::from(9u64)),
            gas: Some(U64::from(50000u64)),
            gas_price: Some(U256::from(3u64)),
            data: Some(Bytes::new()),
            ..Default::default()
        };
        FieldDefaulter::new(&session)
            .fill_transaction(&mut msg, TxFamily::Legacy)
            .await
            .unwrap();
        assert!(session.calls().is_empty());
        assert_eq!(msg.nonce, Some(U64::from(9u64)));
    }

    #[tokio::test]
    async fn tip_is_capped_by_fee_cap() {
        let session = session();
        let mut msg = SendTxMsg {
            from: Address::repeat_byte(1),
            ..Default::default()
        };
        FieldDefaulter::new(&session)
            .fill_transaction(&mut msg, TxFamily::DynamicFee)
            .await
            .unwrap();
        assert_eq!(msg.gas_fee_cap, Some(U256::from(100u64)));
        assert_eq!(msg.gas_tip_cap, Some(U256::from(100u64)));
        assert!(msg.gas_price.is_none());
    }

    #[tokio::test]
    async fn eea_nonce_source() {
        let session = session();
        let mut msg = SendEeaTxMsg {
            from: Address::repeat_byte(1),
            ..Default::default()
        };
        msg.private.privacy_group_id = Some("group".into());
        FieldDefaulter::new(&session).fill_eea(&mut msg).await.unwrap();
        assert_eq!(msg.nonce, Some(U64::from(5u64)));
        assert_eq!(msg.private.private_type, Some(Default::default()));
        assert_eq!(session.calls()[0], "priv_getTransactionCount:group");

        let session = self::session();
        let mut msg = SendEeaTxMsg {
            from: Address::repeat_byte(1),
            ..Default::default()
        };
        msg.private.private_for = Some(vec!["a".into(), "b".into()]);
        FieldDefaulter::new(&session).fill_eea(&mut msg).await.unwrap();
        assert_eq!(msg.nonce, Some(U64::from(6u64)));
        assert_eq!(session.calls()[0], "priv_getEeaTransactionCount:a,b");
    }

    #[tokio::test]
    async fn eea_without_recipients_is_rejected() {
        let session = session();
        let mut msg = SendEeaTxMsg {
            from: Address::repeat_byte(1),
            ..Default::default()
        };
        let err = FieldDefaulter::new(&session)
            .fill_eea(&mut msg)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidFormat);
        assert_eq!(err.message, "missing privateFor");
    }

    #[tokio::test]
    async fn node_failures_carry_context() {
        let session = MockSession {
            fail_with: Some(GatewayError::blockchain_node("boom")),
            ..Default::default()
        };
        let mut msg = SendTxMsg::default();
        let err = FieldDefaulter::new(&session)
            .fill_transaction(&mut msg, TxFamily::Legacy)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::BlockchainNode);
        assert_eq!(err.message, "failed to fetch nonce: boom");
    }
}
