//! Unsigned transactions and their wire encodings.
//!
//! Each family defines two byte strings: the signing payload whose keccak256
//! is signed, and the signed encoding submitted to the node. The layouts are:
//!
//! ```text
//! legacy (EIP-155)  rlp[nonce, gasPrice, gas, to, value, data, chainId, 0, 0]
//! legacy (chain 0)  rlp[nonce, gasPrice, gas, to, value, data]
//! access-list       0x01 || rlp[chainId, nonce, gasPrice, gas, to, value, data, accessList]
//! dynamic-fee       0x02 || rlp[chainId, nonce, tip, feeCap, gas, to, value, data, accessList]
//! quorum-private    rlp[nonce, gasPrice, gas, to, value, data]
//! eea-private       rlp[nonce, gasPrice, gas, to, value, data, chainId, 0, 0,
//!                       privateFrom, privateFor[] | privacyGroupId, "restricted"]
//! ```
//!
//! Signed encodings replace the trailing `chainId, 0, 0` (or append, for the
//! families without it) with `v, r, s`. Typed transactions carry the bare
//! recovery id as `v`.

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};

use super::rlp::{bytes_list, RlpList};
use super::signature::RecoverableSignature;
use super::types::{AccessListItem, PrivateType, TxFamily};
use crate::config::{
    ACCESS_LIST_TX_TYPE, DYNAMIC_FEE_TX_TYPE, EIP155_V_OFFSET, HOMESTEAD_V_OFFSET,
    QUORUM_PRIVATE_V_OFFSET,
};
use crate::error::{GatewayError, Result};

/// Fields shared by legacy, Quorum private and EEA transactions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegacyTx {
    pub nonce: u64,
    pub gas_price: U256,
    pub gas: u64,
    pub to: Option<Address>,
    pub value: U256,
    pub data: Bytes,
}

impl LegacyTx {
    fn append(&self, list: RlpList) -> RlpList {
        list.uint(self.nonce)
            .u256(self.gas_price)
            .uint(self.gas)
            .to(self.to)
            .u256(self.value)
            .bytes(&self.data)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessListTx {
    pub chain_id: u64,
    pub nonce: u64,
    pub gas_price: U256,
    pub gas: u64,
    pub to: Option<Address>,
    pub value: U256,
    pub data: Bytes,
    pub access_list: Vec<AccessListItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DynamicFeeTx {
    pub chain_id: u64,
    pub nonce: u64,
    pub max_priority_fee_per_gas: U256,
    pub max_fee_per_gas: U256,
    pub gas: u64,
    pub to: Option<Address>,
    pub value: U256,
    pub data: Bytes,
    pub access_list: Vec<AccessListItem>,
}

/// Who receives a private payload. Keys are decoded 32-byte enclave keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrivateRecipients {
    PrivateFor(Vec<Vec<u8>>),
    PrivacyGroup(Vec<u8>),
}

/// A Besu/EEA private transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EeaTx {
    pub tx: LegacyTx,
    pub chain_id: u64,
    /// Decoded sender enclave key; empty when the node should pick its own.
    pub private_from: Vec<u8>,
    pub recipients: PrivateRecipients,
    pub private_type: PrivateType,
}

impl EeaTx {
    fn append_privacy(&self, list: RlpList) -> RlpList {
        let list = list.bytes(&self.private_from);
        let list = match &self.recipients {
            PrivateRecipients::PrivateFor(keys) => list.raw(&bytes_list(keys)),
            PrivateRecipients::PrivacyGroup(id) => list.bytes(id),
        };
        list.str(self.private_type.as_str())
    }
}

/// An unsigned transaction of one of the supported families.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypedTransaction {
    /// `chain_id == 0` signs without replay protection.
    Legacy { tx: LegacyTx, chain_id: u64 },
    AccessList(AccessListTx),
    DynamicFee(DynamicFeeTx),
    QuorumPrivate(LegacyTx),
    Eea(EeaTx),
}

fn encode_access_list(items: &[AccessListItem]) -> Vec<u8> {
    items
        .iter()
        .fold(RlpList::new(), |list, item| {
            let keys = bytes_list(&item.storage_keys);
            let entry = RlpList::new()
                .bytes(item.address.as_slice())
                .raw(&keys)
                .finish();
            list.raw(&entry)
        })
        .finish()
}

fn typed(tx_type: u8, list: Vec<u8>) -> Vec<u8> {
    let mut out = Vec::with_capacity(list.len() + 1);
    out.push(tx_type);
    out.extend_from_slice(&list);
    out
}

impl TypedTransaction {
    pub fn family(&self) -> TxFamily {
        match self {
            TypedTransaction::Legacy { .. } => TxFamily::Legacy,
            TypedTransaction::AccessList(_) => TxFamily::AccessList,
            TypedTransaction::DynamicFee(_) => TxFamily::DynamicFee,
            TypedTransaction::QuorumPrivate(_) => TxFamily::QuorumPrivate,
            TypedTransaction::Eea(_) => TxFamily::EeaPrivate,
        }
    }

    /// The bytes whose keccak256 is signed.
    pub fn signing_payload(&self) -> Vec<u8> {
        match self {
            TypedTransaction::Legacy { tx, chain_id: 0 } | TypedTransaction::QuorumPrivate(tx) => {
                tx.append(RlpList::new()).finish()
            }
            TypedTransaction::Legacy { tx, chain_id } => tx
                .append(RlpList::new())
                .uint(*chain_id)
                .uint(0)
                .uint(0)
                .finish(),
            TypedTransaction::AccessList(tx) => typed(
                ACCESS_LIST_TX_TYPE,
                Self::access_list_fields(tx).finish(),
            ),
            TypedTransaction::DynamicFee(tx) => typed(
                DYNAMIC_FEE_TX_TYPE,
                Self::dynamic_fee_fields(tx).finish(),
            ),
            TypedTransaction::Eea(eea) => {
                let list = eea
                    .tx
                    .append(RlpList::new())
                    .uint(eea.chain_id)
                    .uint(0)
                    .uint(0);
                eea.append_privacy(list).finish()
            }
        }
    }

    pub fn signing_hash(&self) -> B256 {
        keccak256(self.signing_payload())
    }

    /// The `v` value embedded in the signed encoding.
    ///
    /// Fails when an EIP-155 chain id is too large for `v` to fit in 64 bits.
    pub fn v(&self, rec_id: u8) -> Result<u64> {
        let rec_id = u64::from(rec_id);
        match self {
            TypedTransaction::Legacy { chain_id: 0, .. } => Ok(rec_id + HOMESTEAD_V_OFFSET),
            TypedTransaction::Legacy { chain_id, .. } => eip155_v(rec_id, *chain_id),
            TypedTransaction::Eea(eea) => eip155_v(rec_id, eea.chain_id),
            TypedTransaction::AccessList(_) | TypedTransaction::DynamicFee(_) => Ok(rec_id),
            TypedTransaction::QuorumPrivate(_) => Ok(rec_id + QUORUM_PRIVATE_V_OFFSET),
        }
    }

    /// The signed transaction as submitted to the node.
    pub fn encode_signed(&self, signature: &RecoverableSignature) -> Result<Vec<u8>> {
        let v = self.v(signature.rec_id)?;
        let with_sig =
            |list: RlpList| list.uint(v).u256(signature.r).u256(signature.s);
        let raw = match self {
            TypedTransaction::Legacy { tx, .. } | TypedTransaction::QuorumPrivate(tx) => {
                with_sig(tx.append(RlpList::new())).finish()
            }
            TypedTransaction::AccessList(tx) => typed(
                ACCESS_LIST_TX_TYPE,
                with_sig(Self::access_list_fields(tx)).finish(),
            ),
            TypedTransaction::DynamicFee(tx) => typed(
                DYNAMIC_FEE_TX_TYPE,
                with_sig(Self::dynamic_fee_fields(tx)).finish(),
            ),
            TypedTransaction::Eea(eea) => {
                let list = with_sig(eea.tx.append(RlpList::new()));
                eea.append_privacy(list).finish()
            }
        };
        Ok(raw)
    }

    fn access_list_fields(tx: &AccessListTx) -> RlpList {
        RlpList::new()
            .uint(tx.chain_id)
            .uint(tx.nonce)
            .u256(tx.gas_price)
            .uint(tx.gas)
            .to(tx.to)
            .u256(tx.value)
            .bytes(&tx.data)
            .raw(&encode_access_list(&tx.access_list))
    }

    fn dynamic_fee_fields(tx: &DynamicFeeTx) -> RlpList {
        RlpList::new()
            .uint(tx.chain_id)
            .uint(tx.nonce)
            .u256(tx.max_priority_fee_per_gas)
            .u256(tx.max_fee_per_gas)
            .uint(tx.gas)
            .to(tx.to)
            .u256(tx.value)
            .bytes(&tx.data)
            .raw(&encode_access_list(&tx.access_list))
    }
}

/// `recId + 35 + 2 * chainId`.
pub fn eip155_v(rec_id: u64, chain_id: u64) -> Result<u64> {
    chain_id
        .checked_mul(2)
        .and_then(|doubled| doubled.checked_add(EIP155_V_OFFSET + rec_id))
        .ok_or_else(|| {
            GatewayError::invalid_format(format!("chain id {} is out of range", chain_id))
        })
}
