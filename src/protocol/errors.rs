//! Protocol-level error types
//!
//! `ProtocolError` covers malformed wire data and invalid constructor
//! arguments (negative request ids, empty method names, and so on) — it sits
//! below [`crate::correlation::error::CorrelationError`] and
//! [`crate::transport::error::TransportError`], which handle session- and
//! connection-level failures respectively.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::transport::error::TransportError;

/// Errors arising from the JSON-RPC/MCP message layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub enum ProtocolError {
    /// A JSON-RPC envelope failed validation: wrong shape, bad id, empty
    /// method, or a malformed error object.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// MCP-level protocol violation (capability mismatch, bad handshake).
    #[error("MCP protocol error: {message}")]
    Mcp { message: String },

    /// The underlying transport failed while a protocol operation was
    /// in flight.
    #[error("transport error: {message}")]
    Transport { message: String },

    /// JSON (de)serialization failed.
    #[error("serialization error: {message}")]
    Serialization { message: String },

    /// Base64 payload in a `Content::Image`/`Content::Resource` is invalid.
    #[error("invalid base64 data")]
    InvalidBase64Data,

    /// Protocol version string does not match `YYYY-MM-DD`.
    #[error("invalid protocol version: {0}")]
    InvalidProtocolVersion(String),

    /// URI failed the minimal `scheme:` validation.
    #[error("invalid URI: {0}")]
    InvalidUri(String),

    /// MIME type is not of the form `type/subtype`.
    #[error("invalid MIME type: {0}")]
    InvalidMimeType(String),
}

/// Convenient result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<TransportError> for ProtocolError {
    fn from(err: TransportError) -> Self {
        Self::Transport {
            message: err.to_string(),
        }
    }
}

impl ProtocolError {
    /// Build an [`ProtocolError::Mcp`] error.
    pub fn mcp(message: impl Into<String>) -> Self {
        Self::Mcp {
            message: message.into(),
        }
    }

    /// Build a [`ProtocolError::Transport`] error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }
}

/// A JSON-RPC 2.0 error object, as carried in `JsonRpcResponse::error`.
///
/// Standard JSON-RPC codes live in [`crate::protocol::constants::error_codes`];
/// this type exists so callers build the wire object without hand-assembling
/// a `serde_json::Value` at every call site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("{message} (code {code})")]
pub struct JsonRpcErrorObject {
    /// Numeric error code, per the JSON-RPC / MCP error-code registry.
    pub code: i32,
    /// Human-readable error message.
    pub message: String,
    /// Optional structured error detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcErrorObject {
    /// Construct an error object without additional structured data.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Attach structured data to this error object.
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Render as the `serde_json::Value` the wire envelope expects.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_object_round_trips_through_value() {
        let obj = JsonRpcErrorObject::new(-32601, "method not found");
        let value = obj.to_value();
        assert_eq!(value["code"], -32601);
        assert_eq!(value["message"], "method not found");
    }
}
