//! Dispatch for server-initiated requests
//!
//! Most MCP traffic is client-initiated, but the server can ask the client to
//! run an LLM completion (`sampling/createMessage`). A client that doesn't
//! implement it still has to answer with a JSON-RPC `Method not found`
//! rather than silently dropping the request, so the default
//! [`ServerRequestHandler`] impl does exactly that.
//!
//! `roots/list` is handled separately, directly by [`crate::endpoint::Endpoint`]
//! (see [`crate::endpoint::Endpoint::set_roots`]) rather than through this
//! trait: answering it correctly requires comparing the new root set against
//! the last-notified one to decide whether `notifications/roots/list_changed`
//! is due, and only the endpoint holds that history.

use async_trait::async_trait;
use serde_json::Value;

use crate::protocol::constants::error_codes;
use crate::protocol::JsonRpcErrorObject;

/// Either a successful result value or a JSON-RPC error object, the two
/// shapes a response to a server-initiated request can take.
pub type HandlerResult = Result<Value, JsonRpcErrorObject>;

/// Implemented by callers who want to answer server-initiated requests.
/// Defaults to `Method not found`, matching a client that advertised no
/// `sampling` capability during the handshake.
#[async_trait]
pub trait ServerRequestHandler: Send + Sync {
    /// Handle `sampling/createMessage`.
    async fn create_message(&self, _params: Value) -> HandlerResult {
        Err(method_not_found("sampling/createMessage"))
    }
}

fn method_not_found(method: &str) -> JsonRpcErrorObject {
    JsonRpcErrorObject::new(error_codes::METHOD_NOT_FOUND, format!("method not found: {method}"))
}

/// A handler that declines every server-initiated request. The endpoint's
/// default when the caller doesn't supply one.
#[derive(Debug, Default)]
pub struct NullHandler;

#[async_trait]
impl ServerRequestHandler for NullHandler {}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn null_handler_declines_sampling() {
        let handler = NullHandler;
        assert!(handler.create_message(Value::Null).await.is_err());
    }
}
