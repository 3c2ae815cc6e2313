//! # JSON-RPC
//!
//! Envelope types and request routing.
//!
//! ```text
//! message.rs  JsonRpcRequest / JsonRpcResponse / JsonRpcError
//! router.rs   (version, method) -> Route dispatch table
//! ```

pub mod message;
pub mod router;

pub use message::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use router::{MethodTable, Route, Router};
