//! JSON-RPC 2.0 message envelope
//!
//! Every byte frame a transport emits or accepts is exactly one of a request,
//! a response, or a notification, wrapped in the JSON-RPC 2.0 envelope. This
//! module owns that envelope: typed structs for each shape, a validated
//! [`RequestId`], and the shape-based decode pipeline used to tell them apart
//! on the wire.
//!
//! # Examples
//!
//! ```rust
//! use mcp_client::protocol::{JsonRpcRequest, JsonRpcMessageTrait, RequestId};
//! use serde_json::json;
//!
//! let request = JsonRpcRequest::new(
//!     "ping",
//!     Some(json!({"message": "hello"})),
//!     RequestId::new_number(1).unwrap(),
//! );
//!
//! let json = request.to_json().unwrap();
//! let parsed = JsonRpcRequest::from_json(&json).unwrap();
//! assert_eq!(request, parsed);
//! ```

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::protocol::errors::ProtocolError;

/// JSON-RPC message types supporting requests, responses, and notifications.
///
/// Untagged because the wire format distinguishes the three shapes by which
/// fields are present (`method`+`id`, `id`+`result`/`error`, `method` alone),
/// not by an explicit tag field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcMessage {
    /// JSON-RPC request message
    Request(JsonRpcRequest),
    /// JSON-RPC response message
    Response(JsonRpcResponse),
    /// JSON-RPC notification message
    Notification(JsonRpcNotification),
}

impl JsonRpcMessage {
    /// Classify and validate a freshly-decoded envelope by shape, per the
    /// decode pipeline: `method`+`id` is a request, `method` alone is a
    /// notification, `id`+`error` is an error response, `id`+`result` is a
    /// success response. Any other combination is `InvalidRequest`.
    pub fn classify(value: Value) -> Result<Self, ProtocolError> {
        let obj = value
            .as_object()
            .ok_or_else(|| ProtocolError::InvalidRequest("envelope is not a JSON object".into()))?;

        let has_method = obj.contains_key("method");
        let has_id = obj.contains_key("id") && !obj["id"].is_null();
        let has_result = obj.contains_key("result");
        let has_error = obj.contains_key("error");

        if has_method && has_id {
            let req: JsonRpcRequest = serde_json::from_value(value)
                .map_err(|e| ProtocolError::InvalidRequest(e.to_string()))?;
            req.validate()?;
            return Ok(JsonRpcMessage::Request(req));
        }
        if has_method && !has_id {
            let note: JsonRpcNotification = serde_json::from_value(value)
                .map_err(|e| ProtocolError::InvalidRequest(e.to_string()))?;
            note.validate()?;
            return Ok(JsonRpcMessage::Notification(note));
        }
        if has_id && (has_error || has_result) {
            let resp: JsonRpcResponse = serde_json::from_value(value)
                .map_err(|e| ProtocolError::InvalidRequest(e.to_string()))?;
            resp.validate()?;
            return Ok(JsonRpcMessage::Response(resp));
        }
        Err(ProtocolError::InvalidRequest(
            "envelope matches neither request, response, nor notification shape".into(),
        ))
    }
}

/// Common serialization behavior for every JSON-RPC message type.
///
/// Any type that implements `Serialize + Deserialize` gets the default
/// implementations for free, so each envelope struct below adds this trait
/// with an empty `impl` block instead of hand-writing the same four methods.
pub trait JsonRpcMessageTrait: Serialize + for<'de> Deserialize<'de> {
    /// Serialize this message to a JSON string.
    fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize this message to pretty-printed JSON, for debugging/logging.
    fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from a JSON string.
    fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize directly into a buffer, avoiding an intermediate `String`.
    fn serialize_to_buffer(&self, buffer: &mut BytesMut) -> Result<(), serde_json::Error> {
        serde_json::to_writer(buffer.writer(), self)
    }

    /// Serialize this message to bytes, ready for a transport's `send`.
    fn to_bytes(&self) -> Result<Bytes, serde_json::Error> {
        let mut buffer = BytesMut::with_capacity(256);
        self.serialize_to_buffer(&mut buffer)?;
        Ok(buffer.freeze())
    }

    /// Deserialize a message from JSON bytes read off a transport.
    fn from_json_bytes(json: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(json)
    }
}

/// A JSON-RPC request id: either a non-negative integer or a non-empty
/// string. Construction validates both arms — the wire-level `i64`/`String`
/// is never exposed unchecked, so a `RequestId` in hand is always a value
/// that satisfies the envelope invariant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// String-based request identifier (must be non-empty)
    String(String),
    /// Numeric request identifier (must be non-negative)
    Number(i64),
}

impl RequestId {
    /// Create a string-based request id.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidRequest`] if `id` is empty.
    pub fn new_string(id: impl Into<String>) -> Result<Self, ProtocolError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ProtocolError::InvalidRequest(
                "request id string must not be empty".into(),
            ));
        }
        Ok(RequestId::String(id))
    }

    /// Create a numeric request id.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidRequest`] if `id` is negative.
    pub fn new_number(id: i64) -> Result<Self, ProtocolError> {
        if id < 0 {
            return Err(ProtocolError::InvalidRequest(format!(
                "request id number must be non-negative, got {id}"
            )));
        }
        Ok(RequestId::Number(id))
    }

    /// Generate a fresh, connection-unique id from a random UUID. Used by the
    /// endpoint when the caller does not supply one.
    pub fn new_uuid() -> Self {
        RequestId::String(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestId::String(s) => write!(f, "{s}"),
            RequestId::Number(n) => write!(f, "{n}"),
        }
    }
}

/// A progress token: a distinct newtype over [`RequestId`] so a caller can
/// never accidentally treat a request id as a progress token or vice versa,
/// even though the wire representation is the raw id value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressToken(RequestId);

impl ProgressToken {
    /// Wrap a request id as its request's progress token.
    pub fn from_request_id(id: RequestId) -> Self {
        Self(id)
    }

    /// Borrow the underlying request id.
    pub fn as_request_id(&self) -> &RequestId {
        &self.0
    }
}

impl fmt::Display for ProgressToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// JSON-RPC 2.0 request: invokes a method and expects a correlated response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcRequest {
    /// Protocol version, always `"2.0"`.
    pub jsonrpc: String,
    /// Name of the method to invoke.
    pub method: String,
    /// Parameters for the method, omitted when empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// Unique identifier for this request.
    pub id: RequestId,
}

impl JsonRpcRequest {
    /// Create a new request envelope.
    pub fn new(method: impl Into<String>, params: Option<Value>, id: RequestId) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: method.into(),
            params,
            id,
        }
    }

    /// Attach a progress token under `params._meta.progressToken`, creating
    /// `params`/`_meta` objects as needed. Mirrors the wire shape the MCP
    /// spec requires for progress-tracked requests.
    pub fn with_progress_token(mut self, token: &ProgressToken) -> Self {
        let mut params = self.params.take().unwrap_or_else(|| Value::Object(Default::default()));
        if let Value::Object(ref mut map) = params {
            let meta = map
                .entry("_meta")
                .or_insert_with(|| Value::Object(Default::default()));
            if let Value::Object(ref mut meta_map) = meta {
                meta_map.insert(
                    "progressToken".to_string(),
                    serde_json::to_value(token.as_request_id()).unwrap_or(Value::Null),
                );
            }
        }
        self.params = Some(params);
        self
    }

    fn validate(&self) -> Result<(), ProtocolError> {
        if self.jsonrpc != "2.0" {
            return Err(ProtocolError::InvalidRequest(format!(
                "unsupported jsonrpc version {}",
                self.jsonrpc
            )));
        }
        if self.method.is_empty() {
            return Err(ProtocolError::InvalidRequest("method name must not be empty".into()));
        }
        Ok(())
    }
}

impl JsonRpcMessageTrait for JsonRpcRequest {}

/// JSON-RPC 2.0 response: exactly one of `result`/`error`, correlated by `id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcResponse {
    /// Protocol version, always `"2.0"`.
    pub jsonrpc: String,
    /// Result of a successful invocation (mutually exclusive with `error`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error of a failed invocation (mutually exclusive with `result`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
    /// Id from the original request (`None` only for top-level parse errors).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
}

impl JsonRpcResponse {
    /// Create a successful response.
    pub fn success(result: Value, id: RequestId) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: Some(result),
            error: None,
            id: Some(id),
        }
    }

    /// Create an error response. `error` should be a JSON-RPC error object
    /// (`{code, message, data?}`); see [`crate::protocol::errors::JsonRpcErrorObject`].
    pub fn error(error: Value, id: Option<RequestId>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(error),
            id,
        }
    }

    /// `true` when this response carries an error payload.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    fn validate(&self) -> Result<(), ProtocolError> {
        if self.jsonrpc != "2.0" {
            return Err(ProtocolError::InvalidRequest(format!(
                "unsupported jsonrpc version {}",
                self.jsonrpc
            )));
        }
        if self.result.is_some() == self.error.is_some() {
            return Err(ProtocolError::InvalidRequest(
                "response must carry exactly one of result/error".into(),
            ));
        }
        if let Some(err) = &self.error {
            let obj = err
                .as_object()
                .ok_or_else(|| ProtocolError::InvalidRequest("error must be an object".into()))?;
            let message_ok = obj.get("message").and_then(Value::as_str).is_some_and(|s| !s.is_empty());
            let code_ok = obj.get("code").and_then(Value::as_i64).is_some();
            if !message_ok || !code_ok {
                return Err(ProtocolError::InvalidRequest(
                    "error object must carry a non-empty message and an integer code".into(),
                ));
            }
        }
        Ok(())
    }
}

impl JsonRpcMessageTrait for JsonRpcResponse {}

/// JSON-RPC 2.0 notification: fire-and-forget, carries no `id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcNotification {
    /// Protocol version, always `"2.0"`.
    pub jsonrpc: String,
    /// Name of the notification method.
    pub method: String,
    /// Parameters for the notification, omitted when empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcNotification {
    /// Create a new notification envelope.
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: method.into(),
            params,
        }
    }

    fn validate(&self) -> Result<(), ProtocolError> {
        if self.jsonrpc != "2.0" {
            return Err(ProtocolError::InvalidRequest(format!(
                "unsupported jsonrpc version {}",
                self.jsonrpc
            )));
        }
        if self.method.is_empty() {
            return Err(ProtocolError::InvalidRequest("method name must not be empty".into()));
        }
        Ok(())
    }
}

impl JsonRpcMessageTrait for JsonRpcNotification {}
impl JsonRpcMessageTrait for JsonRpcMessage {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_id_rejects_negative_and_empty() {
        assert!(RequestId::new_number(-1).is_err());
        assert!(RequestId::new_number(0).is_ok());
        assert!(RequestId::new_string("").is_err());
        assert!(RequestId::new_string("ok").is_ok());
    }

    #[test]
    fn round_trip_request() {
        let id = RequestId::new_string("req-1").unwrap();
        let request = JsonRpcRequest::new("ping", Some(json!({"x": 1})), id);
        let json = request.to_json().unwrap();
        let parsed = JsonRpcRequest::from_json(&json).unwrap();
        assert_eq!(request, parsed);
    }

    #[test]
    fn classify_request_response_notification() {
        let req = json!({"jsonrpc": "2.0", "method": "ping", "id": 1});
        assert!(matches!(JsonRpcMessage::classify(req).unwrap(), JsonRpcMessage::Request(_)));

        let resp = json!({"jsonrpc": "2.0", "result": {"ok": true}, "id": 1});
        assert!(matches!(JsonRpcMessage::classify(resp).unwrap(), JsonRpcMessage::Response(_)));

        let note = json!({"jsonrpc": "2.0", "method": "notifications/initialized"});
        assert!(matches!(
            JsonRpcMessage::classify(note).unwrap(),
            JsonRpcMessage::Notification(_)
        ));
    }

    #[test]
    fn classify_rejects_malformed_shape() {
        let bad = json!({"jsonrpc": "2.0"});
        assert!(JsonRpcMessage::classify(bad).is_err());
    }

    #[test]
    fn error_response_requires_message_and_code() {
        let resp = JsonRpcResponse {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(json!({"code": -32600})),
            id: Some(RequestId::new_number(1).unwrap()),
        };
        assert!(resp.validate().is_err());
    }

    #[test]
    fn progress_token_attaches_meta() {
        let id = RequestId::new_string("req-progress").unwrap();
        let token = ProgressToken::from_request_id(id.clone());
        let request = JsonRpcRequest::new("tools/call", None, id).with_progress_token(&token);
        let params = request.params.unwrap();
        assert_eq!(params["_meta"]["progressToken"], json!("req-progress"));
    }
}
