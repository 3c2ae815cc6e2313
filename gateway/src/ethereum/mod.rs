//! # Ethereum Transactions
//!
//! Everything between a decoded JSON request and the raw bytes sent to the
//! node.
//!
//! ## Architecture
//!
//! ```text
//! types.rs        SendTxMsg / SendEeaTxMsg / PrivateArgs / CallMsg, family selection
//! builder.rs      TransactionBuilder: request -> unsigned TypedTransaction
//! transaction.rs  the five families, signing payloads and signed encodings
//! signature.rs    low-S normalization and recovery id search
//! rlp.rs          ordered RLP list assembly
//! ```
//!
//! ## Families
//!
//! | Family          | `v` in the signed encoding      |
//! |-----------------|---------------------------------|
//! | legacy          | `recId + 35 + 2 * chainId`      |
//! | access-list     | `recId`                         |
//! | dynamic-fee     | `recId`                         |
//! | quorum-private  | `recId + 37`                    |
//! | eea-private     | `recId + 35 + 2 * chainId`      |

pub mod builder;
pub mod rlp;
pub mod signature;
pub mod transaction;
pub mod types;

pub use builder::{decode_enclave_key, TransactionBuilder};
pub use signature::{normalize, public_key_to_address, RecoverableSignature};
pub use transaction::{
    AccessListTx, DynamicFeeTx, EeaTx, LegacyTx, PrivateRecipients, TypedTransaction,
};
pub use types::{
    AccessListItem, CallMsg, PrivateArgs, PrivateType, SendEeaTxMsg, SendTxMsg, TxFamily,
};
