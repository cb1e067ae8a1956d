//! MCP method-name registry and error codes
//!
//! Centralizing these as `&str`/`i32` constants instead of scattering literal
//! strings through the endpoint keeps the router's method dispatch (§4.5.4)
//! and capability gating in sync with the wire names defined by the spec.

/// MCP protocol method and notification names.
pub mod methods {
    /// Client → server handshake request.
    pub const INITIALIZE: &str = "initialize";
    /// Client → server notification that the handshake is complete.
    pub const INITIALIZED: &str = "notifications/initialized";

    /// List available resources.
    pub const RESOURCES_LIST: &str = "resources/list";
    /// Read a single resource's contents.
    pub const RESOURCES_READ: &str = "resources/read";
    /// Subscribe to change notifications for a resource.
    pub const RESOURCES_SUBSCRIBE: &str = "resources/subscribe";
    /// Cancel a resource subscription.
    pub const RESOURCES_UNSUBSCRIBE: &str = "resources/unsubscribe";
    /// List resource templates.
    pub const RESOURCES_TEMPLATES_LIST: &str = "resources/templates/list";
    /// Server → client: the resource list changed, caches should refresh.
    pub const RESOURCES_LIST_CHANGED: &str = "notifications/resources/list_changed";
    /// Server → client: a subscribed resource was updated.
    pub const RESOURCES_UPDATED: &str = "notifications/resources/updated";

    /// List available tools.
    pub const TOOLS_LIST: &str = "tools/list";
    /// Invoke a tool.
    pub const TOOLS_CALL: &str = "tools/call";
    /// Server → client: the tool list changed.
    pub const TOOLS_LIST_CHANGED: &str = "notifications/tools/list_changed";

    /// List available prompts.
    pub const PROMPTS_LIST: &str = "prompts/list";
    /// Fetch a prompt's rendered messages.
    pub const PROMPTS_GET: &str = "prompts/get";
    /// Server → client: the prompt list changed.
    pub const PROMPTS_LIST_CHANGED: &str = "notifications/prompts/list_changed";

    /// Set the server's minimum logging level.
    pub const LOGGING_SET_LEVEL: &str = "logging/setLevel";
    /// Server → client: a log message at or above the configured level.
    pub const LOGGING_MESSAGE: &str = "notifications/message";

    /// Server → client: a sampling (LLM completion) request.
    pub const SAMPLING_CREATE_MESSAGE: &str = "sampling/createMessage";

    /// Server → client: list the client's configured filesystem roots.
    pub const ROOTS_LIST: &str = "roots/list";
    /// Client → server: the roots list changed.
    pub const ROOTS_LIST_CHANGED: &str = "notifications/roots/list_changed";

    /// Progress update for a long-running request.
    pub const PROGRESS: &str = "notifications/progress";
    /// Request cancellation, sent in either direction.
    pub const CANCELLED: &str = "notifications/cancelled";

    /// Liveness check.
    pub const PING: &str = "ping";

    /// Ask the server for completion suggestions for a prompt argument or
    /// resource template variable.
    pub const COMPLETION_COMPLETE: &str = "completion/complete";
}

/// Standard JSON-RPC 2.0 error codes.
pub mod error_codes {
    /// Invalid JSON was received.
    pub const PARSE_ERROR: i32 = -32700;
    /// The JSON sent is not a valid request object.
    pub const INVALID_REQUEST: i32 = -32600;
    /// The method does not exist or is not available.
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid method parameter(s).
    pub const INVALID_PARAMS: i32 = -32602;
    /// Internal JSON-RPC error.
    pub const INTERNAL_ERROR: i32 = -32603;
    /// Generic application-defined server error floor (servers may use any
    /// code in `-32000..=-32099`).
    pub const SERVER_ERROR: i32 = -32000;

    /// MCP extension: the request's capability is not in the negotiated
    /// server capabilities.
    pub const CAPABILITY_NOT_SUPPORTED: i32 = -32001;
    /// MCP extension: a resource URI was not found.
    pub const RESOURCE_NOT_FOUND: i32 = -32002;
    /// MCP extension: the request was cancelled before completion.
    pub const REQUEST_CANCELLED: i32 = -32800;
}

/// Default values used when a caller does not override them.
pub mod defaults {
    /// Default request timeout, in seconds.
    pub const TIMEOUT_SECONDS: u64 = 30;
    /// Default maximum retry attempts.
    pub const MAX_RETRIES: u32 = 3;
    /// Default read/write buffer size for framed transports.
    pub const BUFFER_SIZE: usize = 8192;
    /// Current MCP protocol version this client speaks by default.
    pub const PROTOCOL_VERSION: &str = "2024-11-05";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_distinct() {
        let codes = [
            error_codes::PARSE_ERROR,
            error_codes::INVALID_REQUEST,
            error_codes::METHOD_NOT_FOUND,
            error_codes::INVALID_PARAMS,
            error_codes::INTERNAL_ERROR,
            error_codes::SERVER_ERROR,
            error_codes::CAPABILITY_NOT_SUPPORTED,
            error_codes::RESOURCE_NOT_FOUND,
            error_codes::REQUEST_CANCELLED,
        ];
        let mut sorted = codes.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), codes.len());
    }
}
