//! # Aliases
//!
//! Human-readable names for privacy keys. A client may write
//! `{{registry:key}}` anywhere a Tessera/Orion public key is expected and the
//! gateway substitutes the registered value before signing.
//!
//! ```text
//! store.rs     Alias / Registry types, AliasStore trait, in-memory store
//! resolver.rs  AliasResolver: parse, get, replace, replace_simple
//! ```

pub mod resolver;
pub mod store;

pub use resolver::{alias_values, AliasResolver};
pub use store::{Alias, AliasKind, AliasStore, InMemoryAliasStore, Registry};
