//! # Protocol Constants
//!
//! Wire-level constants shared by the signing pipeline and the JSON-RPC
//! layer. Anything that ends up inside a signed payload is defined here.

use std::time::Duration;

// ---------------------------------------------------------------------------
// JSON-RPC
// ---------------------------------------------------------------------------

/// The only JSON-RPC version the interceptor registers handlers for.
pub const JSONRPC_VERSION: &str = "2.0";

/// Method prefix that is silenced with "Method not found".
pub const PERSONAL_METHOD_PREFIX: &str = "personal_";

// ---------------------------------------------------------------------------
// Signatures
// ---------------------------------------------------------------------------

/// Byte length of a raw `R || S` signature as returned by key signers.
pub const RAW_SIGNATURE_LEN: usize = 64;

/// `V` offset for signatures without replay protection (`eth_sign`,
/// pre-EIP-155 transactions).
pub const HOMESTEAD_V_OFFSET: u64 = 27;

/// `V` offset for EIP-155 signatures: `V = recId + 35 + 2 * chainId`.
pub const EIP155_V_OFFSET: u64 = 35;

/// `V` offset marking a GoQuorum private transaction: `V = recId + 37`.
pub const QUORUM_PRIVATE_V_OFFSET: u64 = 37;

/// Prefix of the personal message digest used by `eth_sign`.
pub const SIGNED_MESSAGE_PREFIX: &str = "\x19Ethereum Signed Message:\n";

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

/// EIP-2718 type byte of an EIP-2930 access-list transaction.
pub const ACCESS_LIST_TX_TYPE: u8 = 0x01;

/// EIP-2718 type byte of an EIP-1559 dynamic-fee transaction.
pub const DYNAMIC_FEE_TX_TYPE: u8 = 0x02;

/// Privacy restriction embedded in EEA transactions.
pub const EEA_RESTRICTED: &str = "restricted";

/// Stand-in calldata used for gas estimation when the destination is set,
/// so the estimate covers the worst case for a 32-byte payload.
pub const GAS_ESTIMATE_PLACEHOLDER: [u8; 32] = [0xff; 32];

// ---------------------------------------------------------------------------
// Downstream
// ---------------------------------------------------------------------------

/// Default timeout applied to a single HTTP call to the node.
pub const DEFAULT_NODE_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Path of the privacy manager endpoint storing a raw private payload.
pub const PRIVACY_MANAGER_STORE_RAW_PATH: &str = "storeraw";
