//! Error types for the signing gateway.
//!
//! Every fallible operation in the crate returns a [`GatewayError`]: a
//! [`ErrorKind`] that drives the JSON-RPC error code, plus a human-readable
//! message that accumulates context as the error travels up the pipeline.

use std::fmt;

use thiserror::Error;

/// Convenience alias used across the crate.
pub type Result<T, E = GatewayError> = std::result::Result<T, E>;

/// JSON-RPC error codes emitted by the gateway.
pub mod codes {
    /// Invalid JSON was received.
    pub const PARSE_ERROR: i32 = -32700;
    /// The method does not exist or is not available.
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid method parameters.
    pub const INVALID_PARAMS: i32 = -32602;
    /// Internal error.
    pub const INTERNAL_ERROR: i32 = -32603;
    /// The downstream node failed or returned an error.
    pub const BLOCKCHAIN_NODE_ERROR: i32 = -32000;
    /// An account, alias or registry does not exist.
    pub const NOT_FOUND: i32 = -32001;
    /// The caller lacks a permission.
    pub const PERMISSION_DENIED: i32 = -32002;
    /// A value could not be decoded (alias kind, signature recovery).
    pub const ENCODING_ERROR: i32 = -32003;
    /// The signing backend cannot perform the requested operation.
    pub const NOT_SUPPORTED: i32 = -32004;
}

/// Classification of gateway failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Request envelope could not be parsed.
    Parse,
    /// Routing rejected the JSON-RPC version.
    NotSupportedVersion,
    /// Routing rejected the method.
    MethodNotFound,
    /// Parameters could not be decoded or a mandatory field is missing.
    InvalidParameter,
    /// A field is present but malformed or inconsistent.
    InvalidFormat,
    /// A value has the wrong kind or a signature is not recoverable.
    Encoding,
    /// Account, alias or registry lookup missed.
    NotFound,
    /// The authorizator denied the operation.
    PermissionDenied,
    /// The downstream node failed, timed out or answered with an error.
    BlockchainNode,
    /// The key signer failed.
    SigningBackend,
    /// The key signer does not support this operation.
    NotSupported,
    /// Anything else.
    Internal,
}

impl ErrorKind {
    /// The JSON-RPC error code for this kind.
    pub fn code(self) -> i32 {
        match self {
            ErrorKind::Parse => codes::PARSE_ERROR,
            ErrorKind::NotSupportedVersion | ErrorKind::MethodNotFound => codes::METHOD_NOT_FOUND,
            ErrorKind::InvalidParameter | ErrorKind::InvalidFormat => codes::INVALID_PARAMS,
            ErrorKind::Encoding => codes::ENCODING_ERROR,
            ErrorKind::NotFound => codes::NOT_FOUND,
            ErrorKind::PermissionDenied => codes::PERMISSION_DENIED,
            ErrorKind::BlockchainNode => codes::BLOCKCHAIN_NODE_ERROR,
            ErrorKind::NotSupported => codes::NOT_SUPPORTED,
            ErrorKind::SigningBackend | ErrorKind::Internal => codes::INTERNAL_ERROR,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Parse => "parse",
            ErrorKind::NotSupportedVersion => "not supported version",
            ErrorKind::MethodNotFound => "method not found",
            ErrorKind::InvalidParameter => "invalid parameter",
            ErrorKind::InvalidFormat => "invalid format",
            ErrorKind::Encoding => "encoding",
            ErrorKind::NotFound => "not found",
            ErrorKind::PermissionDenied => "permission denied",
            ErrorKind::BlockchainNode => "blockchain node",
            ErrorKind::SigningBackend => "signing backend",
            ErrorKind::NotSupported => "not supported",
            ErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified gateway failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} error: {message}")]
pub struct GatewayError {
    /// What went wrong, coarsely.
    pub kind: ErrorKind,
    /// What went wrong, precisely.
    pub message: String,
}

impl GatewayError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Parse, message)
    }

    pub fn not_supported_version() -> Self {
        Self::new(ErrorKind::NotSupportedVersion, "not supported version")
    }

    pub fn method_not_found() -> Self {
        Self::new(ErrorKind::MethodNotFound, "Method not found")
    }

    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidParameter, message)
    }

    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidFormat, message)
    }

    pub fn encoding(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Encoding, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PermissionDenied, message)
    }

    pub fn blockchain_node(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BlockchainNode, message)
    }

    pub fn signing_backend(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SigningBackend, message)
    }

    pub fn not_supported(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotSupported, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Prefixes the message with `context`, keeping the kind.
    pub fn with_context(self, context: impl fmt::Display) -> Self {
        Self {
            kind: self.kind,
            message: format!("{}: {}", context, self.message),
        }
    }

    /// JSON-RPC error code for this error.
    pub fn code(&self) -> i32 {
        self.kind.code()
    }
}

/// Extension trait adding context to `Result<T, GatewayError>`.
pub trait ResultExt<T> {
    /// Wraps the error message with lazily computed context.
    fn context_with<C, F>(self, f: F) -> Result<T>
    where
        C: fmt::Display,
        F: FnOnce() -> C;
}

impl<T> ResultExt<T> for Result<T> {
    fn context_with<C, F>(self, f: F) -> Result<T>
    where
        C: fmt::Display,
        F: FnOnce() -> C,
    {
        self.map_err(|e| e.with_context(f()))
    }
}
