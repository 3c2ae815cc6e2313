//! Request-side transaction types.
//!
//! Every field a client may omit is an `Option`. Absent means "let the
//! gateway fill it in", which is distinct from an explicit zero.

use alloy_primitives::{Address, Bytes, B256, U256, U64};
use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, Result};

/// Privacy restriction of an EEA/Quorum private transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivateType {
    #[default]
    Restricted,
}

impl PrivateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrivateType::Restricted => crate::config::EEA_RESTRICTED,
        }
    }
}

/// Privacy addressing carried by private transactions.
///
/// Keys are base64 strings or `{{registry:key}}` alias tokens until alias
/// resolution has run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateArgs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_for: Option<Vec<String>>,
    #[serde(
        default,
        rename = "privacyGroupId",
        alias = "privacyGroupID",
        skip_serializing_if = "Option::is_none"
    )]
    pub privacy_group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_type: Option<PrivateType>,
}

impl PrivateArgs {
    /// True when any privacy field is present.
    pub fn is_private(&self) -> bool {
        self.private_from.is_some() || self.private_for.is_some() || self.privacy_group_id.is_some()
    }
}

/// One EIP-2930 access list entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessListItem {
    pub address: Address,
    #[serde(default)]
    pub storage_keys: Vec<B256>,
}

/// Parameter of `eth_signTransaction` and `eth_sendTransaction`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendTxMsg {
    pub from: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas: Option<U64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<U256>,
    #[serde(
        default,
        rename = "maxFeePerGas",
        skip_serializing_if = "Option::is_none"
    )]
    pub gas_fee_cap: Option<U256>,
    #[serde(
        default,
        rename = "maxPriorityFeePerGas",
        skip_serializing_if = "Option::is_none"
    )]
    pub gas_tip_cap: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<U64>,
    #[serde(default, alias = "input", skip_serializing_if = "Option::is_none")]
    pub data: Option<Bytes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_list: Option<Vec<AccessListItem>>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub tx_type: Option<U64>,
    #[serde(flatten)]
    pub private: PrivateArgs,
}

/// Parameter of `eea_sendTransaction`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEeaTxMsg {
    pub from: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas: Option<U64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<U64>,
    #[serde(default, alias = "input", skip_serializing_if = "Option::is_none")]
    pub data: Option<Bytes>,
    #[serde(flatten)]
    pub private: PrivateArgs,
}

/// Transaction encodings the gateway can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxFamily {
    Legacy,
    AccessList,
    DynamicFee,
    QuorumPrivate,
    EeaPrivate,
}

impl TxFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxFamily::Legacy => "legacy",
            TxFamily::AccessList => "access-list",
            TxFamily::DynamicFee => "dynamic-fee",
            TxFamily::QuorumPrivate => "quorum-private",
            TxFamily::EeaPrivate => "eea-private",
        }
    }
}

impl SendTxMsg {
    /// Picks the encoding for this request.
    ///
    /// Any privacy field selects a Quorum private transaction. Otherwise an
    /// explicit `type` wins; without one, a `gasPrice` selects legacy (or
    /// access-list when an access list is given) and its absence selects
    /// dynamic-fee.
    pub fn family(&self) -> Result<TxFamily> {
        if self.private.is_private() {
            return Ok(TxFamily::QuorumPrivate);
        }
        match self.tx_type.map(|t| t.to::<u64>()) {
            Some(0) => Ok(TxFamily::Legacy),
            Some(1) => Ok(TxFamily::AccessList),
            Some(2) => Ok(TxFamily::DynamicFee),
            Some(other) => Err(GatewayError::invalid_parameter(format!(
                "unsupported transaction type {:#x}",
                other
            ))),
            None if self.gas_price.is_some() && self.access_list.is_some() => {
                Ok(TxFamily::AccessList)
            }
            None if self.gas_price.is_some() => Ok(TxFamily::Legacy),
            None => Ok(TxFamily::DynamicFee),
        }
    }
}

/// Arguments of `eth_estimateGas`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallMsg {
    pub from: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<U256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    pub data: Bytes,
}
