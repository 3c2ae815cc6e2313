//! JSON-RPC 2.0 envelopes.
//!
//! Requests keep `params` as an opaque JSON value; each handler decodes the
//! positional parameters it expects through [`JsonRpcRequest::params`].
//! Responses preserve an explicit `"result": null` so that proxied replies
//! survive a decode/encode cycle unchanged.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::config::JSONRPC_VERSION;
use crate::error::{GatewayError, Result};

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// A JSON-RPC request.
///
/// `jsonrpc` is accepted as-is; the router decides whether the version is
/// supported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol version claimed by the caller.
    #[serde(default)]
    pub jsonrpc: String,
    /// The method to invoke.
    pub method: String,
    /// Method parameters, usually a positional array.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub params: Value,
    /// Request identifier, echoed in the response.
    #[serde(default)]
    pub id: Value,
}

impl JsonRpcRequest {
    /// Builds a version 2.0 request.
    pub fn new(id: impl Into<Value>, method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
            id: id.into(),
        }
    }

    /// Decodes a request from raw bytes, mapping failures to a parse error.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| GatewayError::parse(format!("Parse error: {}", e)))
    }

    /// Decodes the positional parameters into `T`.
    ///
    /// `T` is typically a tuple such as `(Address, Bytes)`. A missing or
    /// `null` params field decodes as an empty array.
    pub fn params<T: DeserializeOwned>(&self) -> Result<T> {
        let params = match &self.params {
            Value::Null => Value::Array(Vec::new()),
            other => other.clone(),
        };
        serde_json::from_value(params)
            .map_err(|e| GatewayError::invalid_parameter(format!("invalid method parameters: {}", e)))
    }
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

/// A JSON-RPC response. Exactly one of `result` or `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Protocol version.
    #[serde(default)]
    pub jsonrpc: String,
    /// The successful result, possibly an explicit `null`.
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub result: Option<Value>,
    /// The error, if the call failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    /// The id of the request this answers.
    #[serde(default)]
    pub id: Value,
}

fn present_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

impl JsonRpcResponse {
    /// Creates a successful response.
    pub fn success(id: Value, result: impl Serialize) -> Self {
        let result = match serde_json::to_value(result) {
            Ok(value) => value,
            Err(e) => {
                return Self::failure(id, JsonRpcError::from(GatewayError::internal(e.to_string())))
            }
        };
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    /// Creates an error response.
    pub fn failure(id: Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: None,
            error: Some(error),
            id,
        }
    }

    /// Decodes the result into `T`, turning an error object into a
    /// blockchain node error.
    pub fn decode_result<T: DeserializeOwned>(self) -> Result<T> {
        if let Some(err) = self.error {
            return Err(GatewayError::blockchain_node(format!(
                "{} (code {})",
                err.message, err.code
            )));
        }
        let value = self.result.unwrap_or(Value::Null);
        serde_json::from_value(value)
            .map_err(|e| GatewayError::blockchain_node(format!("unexpected node response: {}", e)))
    }
}

// ---------------------------------------------------------------------------
// Error object
// ---------------------------------------------------------------------------

/// A JSON-RPC error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Numeric error code.
    pub code: i32,
    /// Short human-readable description.
    pub message: String,
    /// Optional structured data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl From<GatewayError> for JsonRpcError {
    fn from(err: GatewayError) -> Self {
        Self {
            code: err.code(),
            message: err.message,
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_without_params_decodes_as_empty_array() {
        let req = JsonRpcRequest::from_slice(br#"{"jsonrpc":"2.0","method":"eth_accounts","id":1}"#)
            .unwrap();
        let params: Vec<Value> = req.params().unwrap();
        assert!(params.is_empty());
    }

    #[test]
    fn malformed_envelope_is_a_parse_error() {
        let err = JsonRpcRequest::from_slice(b"{\"jsonrpc\":").unwrap_err();
        assert_eq!(err.code(), -32700);
    }

    #[test]
    fn missing_version_is_kept_empty_for_routing() {
        let req = JsonRpcRequest::from_slice(br#"{"method":"eth_blockNumber","id":"a"}"#).unwrap();
        assert_eq!(req.jsonrpc, "");
        assert_eq!(req.id, json!("a"));
    }

    #[test]
    fn bad_params_are_invalid_params() {
        let req = JsonRpcRequest::new(1, "eth_sign", json!(["0x01"]));
        let err = req.params::<(String, String)>().unwrap_err();
        assert_eq!(err.code(), -32602);
    }

    #[test]
    fn explicit_null_result_survives() {
        let raw = r#"{"jsonrpc":"2.0","id":7,"result":null}"#;
        let resp: JsonRpcResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.result, Some(Value::Null));
        let encoded = serde_json::to_value(&resp).unwrap();
        assert_eq!(encoded, json!({"jsonrpc":"2.0","id":7,"result":null}));
    }

    #[test]
    fn error_response_maps_gateway_error() {
        let resp = JsonRpcResponse::failure(json!(3), GatewayError::method_not_found().into());
        let err = resp.error.unwrap();
        assert_eq!(err.code, -32601);
        assert_eq!(err.message, "Method not found");
        assert!(resp.result.is_none());
    }

    #[test]
    fn node_error_decodes_as_blockchain_node_error() {
        let resp = JsonRpcResponse::failure(
            json!(1),
            JsonRpcError {
                code: -32000,
                message: "nonce too low".into(),
                data: None,
            },
        );
        let err = resp.decode_result::<String>().unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::BlockchainNode);
        assert!(err.message.contains("nonce too low"));
    }
}
