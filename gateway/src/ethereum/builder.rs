//! Unsigned transaction assembly.
//!
//! The [`TransactionBuilder`] turns a fully defaulted request into a
//! [`TypedTransaction`] of the requested family. It never talks to the node:
//! every mandatory field must already be present, and a missing one is an
//! invalid-format error naming the field.

use alloy_primitives::{Bytes, U256};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use super::transaction::{
    AccessListTx, DynamicFeeTx, EeaTx, LegacyTx, PrivateRecipients, TypedTransaction,
};
use super::types::{PrivateArgs, SendEeaTxMsg, SendTxMsg, TxFamily};
use crate::error::{GatewayError, Result};

/// Builds unsigned transactions for one family and chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionBuilder {
    family: TxFamily,
    chain_id: u64,
}

fn required<T>(value: Option<T>, field: &str) -> Result<T> {
    value.ok_or_else(|| GatewayError::invalid_format(format!("{} cannot be empty", field)))
}

/// Decodes a base64 enclave key (Tessera/Orion public key or privacy group).
pub fn decode_enclave_key(key: &str, field: &str) -> Result<Vec<u8>> {
    BASE64
        .decode(key)
        .map_err(|e| GatewayError::invalid_format(format!("invalid {} {:?}: {}", field, key, e)))
}

fn private_recipients(private: &PrivateArgs) -> Result<PrivateRecipients> {
    match (&private.private_for, &private.privacy_group_id) {
        (Some(_), Some(_)) => Err(GatewayError::invalid_format(
            "privateFor and privacyGroupId are mutually exclusive",
        )),
        (Some(keys), None) => keys
            .iter()
            .map(|k| decode_enclave_key(k, "privateFor"))
            .collect::<Result<Vec<_>>>()
            .map(PrivateRecipients::PrivateFor),
        (None, Some(group)) => {
            decode_enclave_key(group, "privacyGroupId").map(PrivateRecipients::PrivacyGroup)
        }
        (None, None) => Err(GatewayError::invalid_format(
            "privateFor or privacyGroupId must be set",
        )),
    }
}

impl TransactionBuilder {
    pub fn new(family: TxFamily, chain_id: u64) -> Self {
        Self { family, chain_id }
    }

    /// Builds a public or Quorum private transaction.
    pub fn build(&self, msg: &SendTxMsg) -> Result<TypedTransaction> {
        let nonce = required(msg.nonce, "nonce")?.to::<u64>();
        let gas = required(msg.gas, "gas")?.to::<u64>();
        let value = msg.value.unwrap_or(U256::ZERO);
        let data = msg.data.clone().unwrap_or_default();
        let access_list = msg.access_list.clone().unwrap_or_default();

        let legacy = |gas_price: U256| LegacyTx {
            nonce,
            gas_price,
            gas,
            to: msg.to,
            value,
            data: data.clone(),
        };

        match self.family {
            TxFamily::Legacy => Ok(TypedTransaction::Legacy {
                tx: legacy(required(msg.gas_price, "gasPrice")?),
                chain_id: self.chain_id,
            }),
            TxFamily::QuorumPrivate => Ok(TypedTransaction::QuorumPrivate(legacy(required(
                msg.gas_price,
                "gasPrice",
            )?))),
            TxFamily::AccessList => Ok(TypedTransaction::AccessList(AccessListTx {
                chain_id: self.chain_id,
                nonce,
                gas_price: required(msg.gas_price, "gasPrice")?,
                gas,
                to: msg.to,
                value,
                data: data.clone(),
                access_list,
            })),
            TxFamily::DynamicFee => Ok(TypedTransaction::DynamicFee(DynamicFeeTx {
                chain_id: self.chain_id,
                nonce,
                max_fee_per_gas: required(msg.gas_fee_cap, "maxFeePerGas")?,
                max_priority_fee_per_gas: required(msg.gas_tip_cap, "maxPriorityFeePerGas")?,
                gas,
                to: msg.to,
                value,
                data: data.clone(),
                access_list,
            })),
            TxFamily::EeaPrivate => Err(GatewayError::invalid_parameter(
                "EEA transactions are built from eea_sendTransaction requests",
            )),
        }
    }

    /// Builds an EEA private transaction.
    pub fn build_eea(&self, msg: &SendEeaTxMsg) -> Result<TypedTransaction> {
        if self.family != TxFamily::EeaPrivate {
            return Err(GatewayError::invalid_parameter(format!(
                "cannot build a {} transaction from an EEA request",
                self.family.as_str()
            )));
        }
        let tx = LegacyTx {
            nonce: required(msg.nonce, "nonce")?.to::<u64>(),
            gas_price: required(msg.gas_price, "gasPrice")?,
            gas: required(msg.gas, "gas")?.to::<u64>(),
            to: msg.to,
            value: msg.value.unwrap_or(U256::ZERO),
            data: msg.data.clone().unwrap_or_else(Bytes::new),
        };
        let private_from = match &msg.private.private_from {
            Some(key) => decode_enclave_key(key, "privateFrom")?,
            None => Vec::new(),
        };
        Ok(TypedTransaction::Eea(EeaTx {
            tx,
            chain_id: self.chain_id,
            private_from,
            recipients: private_recipients(&msg.private)?,
            private_type: msg.private.private_type.unwrap_or_default(),
        }))
    }
}
