// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Custos Gateway
//!
//! A custodial signing gateway that sits between JSON-RPC clients and an
//! Ethereum-compatible node (public Ethereum, GoQuorum, Besu/EEA). Most calls
//! pass straight through to the node. The handful of methods that need a
//! private key (`eth_sign`, `eth_signTransaction`, `eth_sendTransaction`,
//! `eea_sendTransaction`, plus `eth_accounts`) are intercepted and served
//! with custodial keys the client never sees.
//!
//! ## Architecture
//!
//! - **jsonrpc**: Envelope types and the `(version, method)` dispatch table.
//! - **interceptor**: The per-method pipelines and the proxy fallback.
//! - **aliases**: `{{registry:key}}` token resolution for privacy addressing.
//! - **accounts**: Account directory and the key signer capability.
//! - **defaulter**: Fills missing transaction fields from the live node.
//! - **ethereum**: Request types, RLP payloads for the five transaction
//!   families, signature recovery.
//! - **signer**: The signing engine: normalization and V encoding.
//! - **session**: Downstream node connection (HTTP JSON-RPC).
//! - **auth**: Caller identity and permission checks.
//! - **error**: The gateway error taxonomy and its JSON-RPC mapping.
//! - **config**: Protocol constants.
//!
//! ## Flow
//!
//! ```text
//! client ──► NodeInterceptor ──► Router ──► handler
//!                                             │
//!              AccountDirectory ◄─────────────┤ locate key
//!              AliasResolver    ◄─────────────┤ resolve privacy tokens
//!              FieldDefaulter   ◄── Session ──┤ nonce / gas / fees / chain id
//!              SigningEngine    ◄─────────────┤ sign + normalize + encode
//!              Session          ◄─────────────┘ submit raw transaction
//! ```

pub mod accounts;
pub mod aliases;
pub mod auth;
pub mod config;
pub mod defaulter;
pub mod error;
pub mod ethereum;
pub mod interceptor;
pub mod jsonrpc;
pub mod session;
pub mod signer;

#[cfg(test)]
pub(crate) mod testutil;

pub use error::{ErrorKind, GatewayError, Result};
pub use interceptor::{InterceptorConfig, NodeInterceptor};
