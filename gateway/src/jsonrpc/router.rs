//! `(version, method)` dispatch table.
//!
//! Routing is data, not a chain of wrappers: a [`Router`] maps each supported
//! JSON-RPC version to a [`MethodTable`], and a method table maps exact method
//! names and method prefixes to a [`Route`]. Anything a table does not name
//! falls through to its fallback route.

use std::collections::HashMap;

use crate::config::{JSONRPC_VERSION, PERSONAL_METHOD_PREFIX};
use crate::error::{GatewayError, Result};

/// Where a request goes once routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    EthAccounts,
    EthSign,
    EthSignTransaction,
    EthSendTransaction,
    EeaSendTransaction,
    /// Answer with "Method not found" without touching the node.
    Silenced,
    /// Forward verbatim to the downstream node.
    Proxy,
}

/// Routes for a single protocol version.
#[derive(Debug, Clone)]
pub struct MethodTable {
    exact: HashMap<String, Route>,
    prefixes: Vec<(String, Route)>,
    fallback: Route,
}

impl MethodTable {
    /// An empty table sending every method to `fallback`.
    pub fn new(fallback: Route) -> Self {
        Self {
            exact: HashMap::new(),
            prefixes: Vec::new(),
            fallback,
        }
    }

    /// Registers an exact method name.
    pub fn method(mut self, name: impl Into<String>, route: Route) -> Self {
        self.exact.insert(name.into(), route);
        self
    }

    /// Registers a method prefix. Prefixes are tried in registration order
    /// after exact names.
    pub fn prefix(mut self, prefix: impl Into<String>, route: Route) -> Self {
        self.prefixes.push((prefix.into(), route));
        self
    }

    fn resolve(&self, method: &str) -> Route {
        if let Some(route) = self.exact.get(method) {
            return *route;
        }
        self.prefixes
            .iter()
            .find(|(prefix, _)| method.starts_with(prefix.as_str()))
            .map(|(_, route)| *route)
            .unwrap_or(self.fallback)
    }
}

/// Version-keyed dispatch table.
#[derive(Debug, Clone)]
pub struct Router {
    versions: HashMap<String, MethodTable>,
}

impl Router {
    /// A router with no versions registered; every request is rejected.
    pub fn empty() -> Self {
        Self {
            versions: HashMap::new(),
        }
    }

    /// Registers the method table for `version`.
    pub fn version(mut self, version: impl Into<String>, table: MethodTable) -> Self {
        self.versions.insert(version.into(), table);
        self
    }

    /// Resolves a request to its route.
    ///
    /// Fails with a "not supported version" error when no table exists for
    /// `version`.
    pub fn resolve(&self, version: &str, method: &str) -> Result<Route> {
        self.versions
            .get(version)
            .map(|table| table.resolve(method))
            .ok_or_else(GatewayError::not_supported_version)
    }
}

impl Default for Router {
    /// The gateway's routing: JSON-RPC 2.0 only, five intercepted methods,
    /// `personal_*` silenced, everything else proxied.
    fn default() -> Self {
        let v2 = MethodTable::new(Route::Proxy)
            .method("eth_accounts", Route::EthAccounts)
            .method("eth_sign", Route::EthSign)
            .method("eth_signTransaction", Route::EthSignTransaction)
            .method("eth_sendTransaction", Route::EthSendTransaction)
            .method("eea_sendTransaction", Route::EeaSendTransaction)
            .prefix(PERSONAL_METHOD_PREFIX, Route::Silenced);
        Router::empty().version(JSONRPC_VERSION, v2)
    }
}
