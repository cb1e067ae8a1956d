//! A client-side Model Context Protocol (MCP) implementation.
//!
//! This crate provides a JSON-RPC 2.0 foundation, transport abstractions
//! (stdio child-process and SSE), request/response correlation, and a
//! high-level session API for speaking MCP to one or more servers.
//!
//! # Architecture
//!
//! - **Protocol layer** (`protocol`): JSON-RPC 2.0 envelope + MCP payload types.
//! - **Transport layer** (`transport`): pluggable wire carriers (stdio, SSE).
//! - **Correlation layer** (`correlation`): pending-request tracking with
//!   timeout-driven cleanup.
//! - **Endpoint layer** (`endpoint`): the `initialize` handshake, capability
//!   gating, and the high-level resource/tool/prompt/logging operations.
//! - **Host layer** (`host`): aggregates multiple named connections.
//!
//! # Quick Start
//!
//! ```rust
//! use mcp_client::{JsonRpcRequest, JsonRpcMessageTrait, RequestId};
//! use serde_json::json;
//!
//! let request = JsonRpcRequest::new(
//!     "ping",
//!     Some(json!({"message": "hello world"})),
//!     RequestId::new_string("req-001").unwrap(),
//! );
//!
//! let json = request.to_json().unwrap();
//! let parsed = JsonRpcRequest::from_json(&json).unwrap();
//! assert_eq!(request, parsed);
//! ```
//!
//! # Request IDs
//!
//! Request IDs are validated newtypes, not raw strings/numbers:
//!
//! ```rust
//! use mcp_client::RequestId;
//!
//! let string_id = RequestId::new_string("req-12345-abcdef").unwrap();
//! let numeric_id = RequestId::new_number(1234567890).unwrap();
//!
//! println!("String ID: {string_id}");
//! println!("Numeric ID: {numeric_id}");
//!
//! assert!(RequestId::new_number(-1).is_err());
//! assert!(RequestId::new_string("").is_err());
//! ```

pub mod correlation;
pub mod endpoint;
pub mod host;
pub mod protocol;
pub mod retry;
pub mod transport;

pub use protocol::{
    Base64Data,
    CallToolRequest,
    CallToolResult,
    ClientCapabilities,
    ClientInfo,
    Completion,
    CompleteRequest,
    CompleteResult,
    CompletionArgument,
    CompletionReference,
    Content,
    GetPromptRequest,
    GetPromptResult,
    InitializeRequest,
    InitializeResponse,
    JsonRpcErrorObject,
    JsonRpcMessage,
    JsonRpcMessageTrait,
    JsonRpcNotification,
    JsonRpcRequest,
    JsonRpcResponse,
    ListPromptsRequest,
    ListPromptsResult,
    ListResourcesRequest,
    ListResourcesResult,
    ListToolsRequest,
    ListToolsResult,
    LogLevel,
    LoggingConfig,
    MimeType,
    ProgressToken,
    Prompt,
    ProtocolError,
    ProtocolResult,
    ProtocolVersion,
    ReadResourceRequest,
    ReadResourceResult,
    RequestId,
    Resource,
    ResourceTemplate,
    Root,
    ServerCapabilities,
    ServerInfo,
    Tool,
    Uri,
};

pub use correlation::{CorrelationConfig, CorrelationError, CorrelationManager, CorrelationResult};

pub use endpoint::{
    Endpoint, EndpointConfig, EndpointError, EndpointResult, NotificationEvent, NullHandler,
    ServerRequestHandler, SessionState,
};

pub use host::{Host, HostConfig, HostError, HostResult};

pub use retry::{Backoff, RetryError, RetryPolicy};

pub use transport::sse::SseTransport;
pub use transport::stdio::StdioTransport;
pub use transport::{Transport, TransportError, TransportState};

/// This crate's version, as declared in `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns this crate's version string.
///
/// ```rust
/// println!("mcp-client version: {}", mcp_client::version());
/// ```
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn public_api_round_trips() {
        let request = JsonRpcRequest::new(
            "test_method",
            Some(json!({"param": "value"})),
            RequestId::new_string("test-123").unwrap(),
        );
        let response =
            JsonRpcResponse::success(json!({"result": "success"}), RequestId::new_number(456).unwrap());
        let notification =
            JsonRpcNotification::new("test_event", Some(json!({"event": "occurred"})));

        assert!(request.to_json().is_ok());
        assert!(response.to_json().is_ok());
        assert!(notification.to_json().is_ok());
    }

    #[test]
    fn request_ids_round_trip_through_json() {
        let string_request =
            JsonRpcRequest::new("test", None, RequestId::new_string("uuid-12345").unwrap());
        let numeric_request = JsonRpcRequest::new("test", None, RequestId::new_number(67890).unwrap());

        let string_json = string_request.to_json().unwrap();
        let numeric_json = numeric_request.to_json().unwrap();

        assert!(string_json.contains(r#""id":"uuid-12345""#));
        assert!(numeric_json.contains(r#""id":67890"#));
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!version().is_empty());
        assert_eq!(version(), VERSION);
    }

    #[test]
    fn json_rpc_envelopes_are_compliant() {
        let request = JsonRpcRequest::new("ping", None, RequestId::new_number(1).unwrap());
        let response = JsonRpcResponse::success(json!("pong"), RequestId::new_number(1).unwrap());
        let notification = JsonRpcNotification::new("heartbeat", None);

        let request_json = request.to_json().unwrap();
        let response_json = response.to_json().unwrap();
        let notification_json = notification.to_json().unwrap();

        assert!(request_json.contains(r#""jsonrpc":"2.0""#));
        assert!(response_json.contains(r#""jsonrpc":"2.0""#));
        assert!(notification_json.contains(r#""jsonrpc":"2.0""#));

        assert!(request_json.contains(r#""method":"ping""#));
        assert!(notification_json.contains(r#""method":"heartbeat""#));

        assert!(request_json.contains(r#""id":1"#));
        assert!(!notification_json.contains("id"));

        assert!(response_json.contains(r#""result":"pong""#));
        assert!(response_json.contains(r#""id":1"#));
        assert!(!response_json.contains("error"));
    }
}
