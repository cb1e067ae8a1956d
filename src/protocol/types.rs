//! MCP payload types: validated newtypes, capabilities, content, handshake
//!
//! Types here follow one shared pattern: a private inner field plus a
//! validating constructor that returns `ProtocolResult<Self>`, with a
//! `new_unchecked` escape hatch for values already known to be valid (literal
//! constants, server-echoed data). That keeps invalid protocol values from
//! existing at all rather than being checked again at every use site.
//!
//! # Examples
//!
//! ```rust
//! use mcp_client::protocol::{Uri, ProtocolVersion, ClientInfo};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let uri = Uri::new("file:///path/to/resource")?;
//! let version = ProtocolVersion::current();
//! let client_info = ClientInfo {
//!     name: "example-client".to_string(),
//!     version: "1.0.0".to_string(),
//! };
//!
//! assert_eq!(uri.scheme(), Some("file"));
//! assert_eq!(version.as_str(), "2024-11-05");
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::protocol::constants::methods;
use crate::protocol::errors::{ProtocolError, ProtocolResult};
use crate::protocol::{JsonRpcRequest, RequestId};

/// MCP protocol version, validated as `YYYY-MM-DD`.
///
/// ```rust
/// use mcp_client::protocol::ProtocolVersion;
///
/// let version = ProtocolVersion::current();
/// assert_eq!(version.as_str(), "2024-11-05");
///
/// assert!(ProtocolVersion::new("invalid").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ProtocolVersion(String);

impl ProtocolVersion {
    /// Latest protocol version this client speaks.
    pub const CURRENT: &'static str = "2024-11-05";

    /// Validate and wrap a version string.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidProtocolVersion`] if `version` is not
    /// in `YYYY-MM-DD` form.
    pub fn new(version: impl Into<String>) -> ProtocolResult<Self> {
        let version = version.into();
        if Self::is_valid_version(&version) {
            Ok(Self(version))
        } else {
            Err(ProtocolError::InvalidProtocolVersion(version))
        }
    }

    /// The current version, guaranteed valid.
    pub fn current() -> Self {
        Self(Self::CURRENT.to_string())
    }

    /// Borrow the version string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Exact version match; the handshake does not attempt semver-style
    /// range negotiation.
    pub fn is_compatible_with(&self, other: &Self) -> bool {
        self.0 == other.0
    }

    fn is_valid_version(version: &str) -> bool {
        if version.len() != 10 {
            return false;
        }
        let chars: Vec<char> = version.chars().collect();
        chars.get(4) == Some(&'-')
            && chars.get(7) == Some(&'-')
            && chars[0..4].iter().all(|c| c.is_ascii_digit())
            && chars[5..7].iter().all(|c| c.is_ascii_digit())
            && chars[8..10].iter().all(|c| c.is_ascii_digit())
    }
}

impl Default for ProtocolVersion {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A URI, validated to carry a scheme.
///
/// ```rust
/// use mcp_client::protocol::Uri;
///
/// let uri = Uri::new("file:///path/to/file")?;
/// assert_eq!(uri.scheme(), Some("file"));
/// assert!(Uri::new("not-a-uri").is_err());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Uri(String);

impl Uri {
    /// Validate and wrap a URI string.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidUri`] if `uri` is empty, lacks a
    /// `:`, or starts with one.
    pub fn new(uri: impl Into<String>) -> ProtocolResult<Self> {
        let uri = uri.into();
        if Self::is_valid_uri(&uri) {
            Ok(Self(uri))
        } else {
            Err(ProtocolError::InvalidUri(uri))
        }
    }

    /// Wrap a URI without validating it — for values already known-good,
    /// such as ones just echoed back by the server.
    pub fn new_unchecked(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    /// Borrow the URI string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extract the scheme (text before the first `:`).
    pub fn scheme(&self) -> Option<&str> {
        self.0.split(':').next()
    }

    /// `true` for `file:` URIs.
    pub fn is_file_uri(&self) -> bool {
        self.scheme() == Some("file")
    }

    /// `true` for `http:`/`https:` URIs.
    pub fn is_http_uri(&self) -> bool {
        matches!(self.scheme(), Some("http") | Some("https"))
    }

    fn is_valid_uri(uri: &str) -> bool {
        !uri.is_empty() && uri.contains(':') && !uri.starts_with(':')
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A MIME type, validated as `type/subtype`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MimeType(String);

impl MimeType {
    /// Validate and wrap a MIME type string.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidMimeType`] if `mime_type` does not
    /// split into exactly two non-empty `/`-delimited parts.
    pub fn new(mime_type: impl Into<String>) -> ProtocolResult<Self> {
        let mime_type = mime_type.into();
        if Self::is_valid_mime_type(&mime_type) {
            Ok(Self(mime_type))
        } else {
            Err(ProtocolError::InvalidMimeType(mime_type))
        }
    }

    /// Borrow the MIME type string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part before `/`, e.g. `text` in `text/plain`.
    pub fn main_type(&self) -> &str {
        self.0.split('/').next().unwrap_or("")
    }

    /// The part after `/`, e.g. `plain` in `text/plain`.
    pub fn sub_type(&self) -> &str {
        self.0.split('/').nth(1).unwrap_or("")
    }

    /// `true` for `text/*` types.
    pub fn is_text(&self) -> bool {
        self.main_type() == "text"
    }

    /// `true` for `image/*` types.
    pub fn is_image(&self) -> bool {
        self.main_type() == "image"
    }

    fn is_valid_mime_type(mime_type: &str) -> bool {
        if !mime_type.contains('/') || mime_type.starts_with('/') || mime_type.ends_with('/') {
            return false;
        }
        let parts: Vec<&str> = mime_type.split('/').collect();
        parts.len() == 2 && !parts[0].is_empty() && !parts[1].is_empty()
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Base64-encoded binary payload, validated at construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Base64Data(String);

impl Base64Data {
    /// Validate and wrap a base64 string.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidBase64Data`] if `data` contains
    /// characters outside the base64 alphabet or has interior padding.
    pub fn new(data: impl Into<String>) -> ProtocolResult<Self> {
        let data = data.into();
        if Self::is_valid_base64(&data) {
            Ok(Self(data))
        } else {
            Err(ProtocolError::InvalidBase64Data)
        }
    }

    /// Borrow the base64 string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length of the encoded string, not the decoded payload.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` if the encoded string is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn is_valid_base64(data: &str) -> bool {
        if data.is_empty() {
            return false;
        }
        data.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '/' || c == '=')
            && !data.trim_end_matches('=').contains('=')
    }
}

impl fmt::Display for Base64Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies the client application during the initialize handshake.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientInfo {
    /// Application name.
    pub name: String,
    /// Application version.
    pub version: String,
}

/// Identifies the server application, as returned in `InitializeResponse`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerInfo {
    /// Application name.
    pub name: String,
    /// Application version.
    pub version: String,
}

/// Content carried in tool results, resource reads, and prompt messages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Content {
    /// Plain text, optionally tied to a source URI/MIME type.
    #[serde(rename = "text")]
    Text {
        /// The text itself.
        text: String,
        /// Source resource URI, if this text was read from one.
        #[serde(skip_serializing_if = "Option::is_none")]
        uri: Option<Uri>,
        /// MIME type of the text, if known.
        #[serde(rename = "mimeType", skip_serializing_if = "Option::is_none")]
        mime_type: Option<MimeType>,
    },

    /// Base64-encoded image.
    #[serde(rename = "image")]
    Image {
        /// Encoded image bytes.
        data: Base64Data,
        /// Image MIME type.
        #[serde(rename = "mimeType")]
        mime_type: MimeType,
        /// Source resource URI, if any.
        #[serde(skip_serializing_if = "Option::is_none")]
        uri: Option<Uri>,
    },

    /// A reference to a resource, with optional inlined text.
    #[serde(rename = "resource")]
    Resource {
        /// The resource's URI.
        #[serde(rename = "uri")]
        resource: Uri,
        /// Inlined text contents, if the caller chose to embed them.
        text: Option<String>,
        /// MIME type of the resource.
        #[serde(rename = "mimeType", skip_serializing_if = "Option::is_none")]
        mime_type: Option<MimeType>,
    },
}

impl Content {
    /// Plain text content with no source URI.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            uri: None,
            mime_type: None,
        }
    }

    /// Plain text content tied to a (trusted, already-valid) source URI.
    pub fn text_with_uri(text: impl Into<String>, uri: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            uri: Some(Uri::new_unchecked(uri)),
            mime_type: None,
        }
    }

    /// Extract inlined text, if this content carries any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Content::Text { text, .. } => Some(text),
            Content::Resource { text: Some(text), .. } => Some(text),
            _ => None,
        }
    }
}

/// A tool the server advertises as callable via `tools/call`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    /// Tool name, used as the `name` argument to `tools/call`.
    pub name: String,
    /// Human-readable description of what the tool does.
    pub description: Option<String>,
    /// JSON Schema describing the tool's `arguments` shape.
    #[serde(rename = "inputSchema")]
    pub input_schema: serde_json::Value,
}

/// Capabilities this client advertises during the handshake.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ClientCapabilities {
    /// Unstandardized, implementation-specific capabilities.
    pub experimental: Option<serde_json::Value>,
    /// Sampling (server-initiated LLM completion) support.
    pub sampling: Option<SamplingCapabilities>,
    /// Filesystem roots support.
    pub roots: Option<RootsCapabilities>,
}

/// Capabilities the server advertises in its `InitializeResponse`. The
/// endpoint's capability gate checks these before dispatching a
/// capability-scoped request (§4.5.7).
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ServerCapabilities {
    /// Unstandardized, implementation-specific capabilities.
    pub experimental: Option<serde_json::Value>,
    /// Logging control support.
    pub logging: Option<LoggingCapabilities>,
    /// Prompt listing/retrieval support.
    pub prompts: Option<PromptCapabilities>,
    /// Resource listing/reading/subscription support.
    pub resources: Option<ResourceCapabilities>,
    /// Tool listing/invocation support.
    pub tools: Option<ToolCapabilities>,
    /// Argument autocompletion support (`completion/complete`).
    pub completions: Option<CompletionCapabilities>,
}

/// Marker capability: the server accepts `sampling/createMessage` requests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SamplingCapabilities {}

/// Marker capability: the server accepts `completion/complete` requests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CompletionCapabilities {}

/// Roots capability flags.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RootsCapabilities {
    /// The server will send `notifications/roots/list_changed`.
    pub list_changed: Option<bool>,
}

/// Marker capability: the server accepts `logging/setLevel`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct LoggingCapabilities {}

/// A filesystem root the client exposes to the server, reported via
/// `roots/list`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Root {
    /// `file://` URI of the root.
    pub uri: String,
    /// Human-readable display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Root {
    /// Build a root from a URI and optional display name.
    pub fn new(uri: impl Into<String>, name: Option<impl Into<String>>) -> Self {
        Self {
            uri: uri.into(),
            name: name.map(Into::into),
        }
    }
}

/// Prompt capability flags.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromptCapabilities {
    /// The server will send `notifications/prompts/list_changed`.
    pub list_changed: Option<bool>,
}

impl Default for PromptCapabilities {
    fn default() -> Self {
        Self {
            list_changed: Some(false),
        }
    }
}

/// Resource capability flags.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceCapabilities {
    /// The server supports `resources/subscribe`.
    pub subscribe: Option<bool>,
    /// The server will send `notifications/resources/list_changed`.
    pub list_changed: Option<bool>,
}

impl Default for ResourceCapabilities {
    fn default() -> Self {
        Self {
            subscribe: Some(false),
            list_changed: Some(false),
        }
    }
}

/// Tool capability flags.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCapabilities {
    /// The server will send `notifications/tools/list_changed`.
    pub list_changed: Option<bool>,
}

impl Default for ToolCapabilities {
    fn default() -> Self {
        Self {
            list_changed: Some(false),
        }
    }
}

/// A prompt template the server exposes via `prompts/list`/`prompts/get`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prompt {
    /// Identifier passed to `prompts/get`.
    pub name: String,
    /// Human-readable display name.
    pub title: Option<String>,
    /// Description of the prompt's purpose.
    pub description: Option<String>,
    /// Arguments this prompt accepts.
    pub arguments: Vec<PromptArgument>,
}

/// An argument accepted by a [`Prompt`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromptArgument {
    /// Argument name.
    pub name: String,
    /// Human-readable description.
    pub description: Option<String>,
    /// Whether the server rejects `prompts/get` calls omitting this argument.
    pub required: bool,
}

impl PromptArgument {
    /// A required argument.
    pub fn required(name: impl Into<String>, description: Option<impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            description: description.map(Into::into),
            required: true,
        }
    }

    /// An optional argument.
    pub fn optional(name: impl Into<String>, description: Option<impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            description: description.map(Into::into),
            required: false,
        }
    }
}

/// One message in a rendered prompt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromptMessage {
    /// Message role, e.g. `"user"`/`"assistant"`/`"system"`.
    pub role: String,
    /// Message content.
    pub content: Content,
}

impl PromptMessage {
    /// A message from the user role.
    pub fn user(content: Content) -> Self {
        Self {
            role: "user".to_string(),
            content,
        }
    }

    /// A message from the assistant role.
    pub fn assistant(content: Content) -> Self {
        Self {
            role: "assistant".to_string(),
            content,
        }
    }

    /// A message from the system role.
    pub fn system(content: Content) -> Self {
        Self {
            role: "system".to_string(),
            content,
        }
    }
}

/// A resource the server exposes via `resources/list`/`resources/read`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Resource {
    /// The resource's URI, passed to `resources/read`.
    pub uri: Uri,
    /// Human-readable display name.
    pub name: String,
    /// Description of the resource.
    pub description: Option<String>,
    /// MIME type, if known ahead of reading.
    #[serde(rename = "mimeType", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<MimeType>,
}

/// A template describing a family of dynamically-addressed resources.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceTemplate {
    /// URI template, e.g. `file:///logs/{date}.log`.
    #[serde(rename = "uriTemplate")]
    pub uri_template: String,
    /// Human-readable display name.
    pub name: String,
    /// Description of the template.
    pub description: Option<String>,
    /// MIME type shared by resources matching this template.
    #[serde(rename = "mimeType")]
    pub mime_type: Option<String>,
}

/// Severity levels for `logging/setLevel` and `notifications/message`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Verbose diagnostic detail.
    Debug,
    /// Routine operational messages.
    Info,
    /// Recoverable anomalies.
    Warning,
    /// Failures that affected an operation.
    Error,
    /// Failures that affected the whole connection.
    Critical,
}

impl LogLevel {
    /// Lowercase wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
            LogLevel::Critical => "critical",
        }
    }
}

/// The minimum severity the server should forward as `notifications/message`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Minimum level to forward.
    pub level: LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: LogLevel::Info }
    }
}

impl LoggingConfig {
    /// Build a config at the given level.
    pub fn new(level: LogLevel) -> Self {
        Self { level }
    }
}

/// `initialize` request body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InitializeRequest {
    /// Protocol version this client speaks.
    #[serde(rename = "protocolVersion")]
    pub protocol_version: ProtocolVersion,
    /// Capabilities this client offers.
    pub capabilities: serde_json::Value,
    /// This client's identity.
    #[serde(rename = "clientInfo")]
    pub client_info: ClientInfo,
}

impl InitializeRequest {
    /// Build an initialize request for a specific protocol version.
    pub fn with_version(
        protocol_version: ProtocolVersion,
        capabilities: serde_json::Value,
        client_info: ClientInfo,
    ) -> Self {
        Self {
            protocol_version,
            capabilities,
            client_info,
        }
    }

    /// Wrap as a JSON-RPC request with the given id.
    pub fn to_jsonrpc_request(&self, id: RequestId) -> Result<JsonRpcRequest, ProtocolError> {
        let params = serde_json::to_value(self)?;
        Ok(JsonRpcRequest::new(methods::INITIALIZE, Some(params), id))
    }
}

/// `initialize` response body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InitializeResponse {
    /// Protocol version the server will speak for this session.
    #[serde(rename = "protocolVersion")]
    pub protocol_version: ProtocolVersion,
    /// Capabilities the server offers.
    pub capabilities: serde_json::Value,
    /// The server's identity.
    #[serde(rename = "serverInfo")]
    pub server_info: ServerInfo,
    /// Free-form usage instructions from the server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

impl InitializeResponse {
    /// Build a response (for tests/mocks; real responses are deserialized
    /// off the wire).
    pub fn new(
        protocol_version: ProtocolVersion,
        capabilities: serde_json::Value,
        server_info: ServerInfo,
        instructions: Option<String>,
    ) -> Self {
        Self {
            protocol_version,
            capabilities,
            server_info,
            instructions,
        }
    }
}

/// `logging/setLevel` request body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SetLoggingRequest {
    /// Minimum level the server should now forward.
    pub level: LogLevel,
}

impl SetLoggingRequest {
    /// Build a request for the given level.
    pub fn new(level: LogLevel) -> Self {
        Self { level }
    }
}

/// `prompts/get` request body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GetPromptRequest {
    /// Prompt name, as returned by `prompts/list`.
    pub name: String,
    /// Argument values keyed by [`PromptArgument::name`].
    pub arguments: HashMap<String, String>,
}

impl GetPromptRequest {
    /// Build a request for `name` with the given argument values.
    pub fn new(name: impl Into<String>, arguments: HashMap<String, String>) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// `resources/read` request body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReadResourceRequest {
    /// URI of the resource to read.
    pub uri: Uri,
}

impl ReadResourceRequest {
    /// Build a request, validating the URI.
    pub fn new(uri: impl Into<String>) -> ProtocolResult<Self> {
        Ok(Self { uri: Uri::new(uri)? })
    }
}

/// `resources/subscribe` request body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubscribeResourceRequest {
    /// URI of the resource to subscribe to.
    pub uri: Uri,
}

impl SubscribeResourceRequest {
    /// Build a request, validating the URI.
    pub fn new(uri: impl Into<String>) -> ProtocolResult<Self> {
        Ok(Self { uri: Uri::new(uri)? })
    }
}

/// `resources/unsubscribe` request body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnsubscribeResourceRequest {
    /// URI of the resource to stop watching.
    pub uri: Uri,
}

impl UnsubscribeResourceRequest {
    /// Build a request, validating the URI.
    pub fn new(uri: impl Into<String>) -> ProtocolResult<Self> {
        Ok(Self { uri: Uri::new(uri)? })
    }
}

/// `tools/call` request body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CallToolRequest {
    /// Tool name, as returned by `tools/list`.
    pub name: String,
    /// Arguments matching the tool's `inputSchema`.
    pub arguments: serde_json::Value,
}

impl CallToolRequest {
    /// Build a request for `name` with the given arguments.
    pub fn new(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// Shared shape for the three paginated list requests.
macro_rules! list_request {
    ($name:ident, $method:expr) => {
        /// Paginated list request.
        #[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
        pub struct $name {
            /// Opaque pagination cursor from a prior page's response.
            pub cursor: Option<String>,
        }

        impl $name {
            /// First page.
            pub fn new() -> Self {
                Self { cursor: None }
            }

            /// Continue from a prior page's cursor.
            pub fn with_cursor(cursor: impl Into<String>) -> Self {
                Self {
                    cursor: Some(cursor.into()),
                }
            }

            /// Wrap as a JSON-RPC request with the given id.
            pub fn to_jsonrpc_request(&self, id: RequestId) -> Result<JsonRpcRequest, ProtocolError> {
                let params = serde_json::to_value(self)?;
                Ok(JsonRpcRequest::new($method, Some(params), id))
            }
        }
    };
}

list_request!(ListResourcesRequest, methods::RESOURCES_LIST);
list_request!(ListPromptsRequest, methods::PROMPTS_LIST);
list_request!(ListToolsRequest, methods::TOOLS_LIST);
list_request!(ListResourceTemplatesRequest, methods::RESOURCES_TEMPLATES_LIST);

/// Result of `tools/call`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CallToolResult {
    /// Content produced by the tool.
    pub content: Vec<Content>,
    /// `true` if the tool reported a failure (distinct from a transport/
    /// protocol-level error response).
    #[serde(default, rename = "isError")]
    pub is_error: bool,
}

impl CallToolResult {
    /// A successful call.
    pub fn success(content: Vec<Content>) -> Self {
        Self {
            content,
            is_error: false,
        }
    }

    /// A call the tool itself reported as failed.
    pub fn error(content: Vec<Content>) -> Self {
        Self {
            content,
            is_error: true,
        }
    }

    /// Convenience: a failed call carrying a single text explanation.
    pub fn error_text(message: impl Into<String>) -> Self {
        Self::error(vec![Content::text(message)])
    }
}

/// Result of `resources/read`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReadResourceResult {
    /// The resource's contents, possibly split across multiple parts.
    pub contents: Vec<Content>,
}

impl ReadResourceResult {
    /// Wrap resource contents.
    pub fn new(contents: Vec<Content>) -> Self {
        Self { contents }
    }
}

/// Result of `prompts/get`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GetPromptResult {
    /// Description of the rendered prompt.
    pub description: Option<String>,
    /// Rendered messages.
    pub messages: Vec<PromptMessage>,
}

impl GetPromptResult {
    /// Build a result.
    pub fn new(description: Option<String>, messages: Vec<PromptMessage>) -> Self {
        Self { description, messages }
    }
}

/// Shared shape for the three paginated list results.
macro_rules! list_result {
    ($name:ident, $field:ident: $item:ty) => {
        /// Paginated list result.
        #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
        pub struct $name {
            /// Items on this page.
            pub $field: Vec<$item>,
            /// Cursor for the next page, `None` if this was the last page.
            #[serde(rename = "nextCursor", skip_serializing_if = "Option::is_none")]
            pub next_cursor: Option<String>,
        }

        impl $name {
            /// A single, final page.
            pub fn new($field: Vec<$item>) -> Self {
                Self {
                    $field,
                    next_cursor: None,
                }
            }

            /// A page with more to follow.
            pub fn with_cursor($field: Vec<$item>, next_cursor: Option<String>) -> Self {
                Self { $field, next_cursor }
            }
        }
    };
}

list_result!(ListResourcesResult, resources: Resource);
list_result!(ListToolsResult, tools: Tool);
list_result!(ListPromptsResult, prompts: Prompt);

/// Result of `resources/templates/list`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListResourceTemplatesResult {
    /// Templates on this page.
    #[serde(rename = "resourceTemplates")]
    pub resource_templates: Vec<ResourceTemplate>,
    /// Cursor for the next page.
    #[serde(rename = "nextCursor", skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// What a `completion/complete` request is completing an argument for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CompletionReference {
    /// Completing an argument of a prompt, by name.
    #[serde(rename = "ref/prompt")]
    Prompt {
        /// Prompt name, as returned by `prompts/list`.
        name: String,
    },
    /// Completing a variable in a resource template URI.
    #[serde(rename = "ref/resource")]
    Resource {
        /// Resource template URI being completed.
        uri: String,
    },
}

/// The argument being completed, and what's typed so far.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletionArgument {
    /// Argument name.
    pub name: String,
    /// Partial value typed so far.
    pub value: String,
}

/// `completion/complete` request body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompleteRequest {
    /// What's being completed.
    #[serde(rename = "ref")]
    pub reference: CompletionReference,
    /// The argument and its partial value.
    pub argument: CompletionArgument,
}

impl CompleteRequest {
    /// Build a request completing a prompt argument.
    pub fn for_prompt(prompt_name: impl Into<String>, argument: CompletionArgument) -> Self {
        Self {
            reference: CompletionReference::Prompt { name: prompt_name.into() },
            argument,
        }
    }

    /// Build a request completing a resource template variable.
    pub fn for_resource(template_uri: impl Into<String>, argument: CompletionArgument) -> Self {
        Self {
            reference: CompletionReference::Resource { uri: template_uri.into() },
            argument,
        }
    }
}

/// The suggested values for a `completion/complete` request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Completion {
    /// Suggested values, best match first.
    pub values: Vec<String>,
    /// Total number of matches, if the server knows it exceeds `values.len()`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<i64>,
    /// Whether more values exist beyond what was returned.
    #[serde(rename = "hasMore", skip_serializing_if = "Option::is_none")]
    pub has_more: Option<bool>,
}

/// Result of `completion/complete`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompleteResult {
    /// The suggestions themselves.
    pub completion: Completion,
}

/// Result of `logging/setLevel`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SetLoggingResult {
    /// Whether the server accepted the new level.
    pub success: bool,
    /// Optional human-readable detail.
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uri_validation() {
        assert!(Uri::new("file:///tmp/x").is_ok());
        assert!(Uri::new("not-a-uri").is_err());
        assert!(Uri::new("").is_err());
    }

    #[test]
    fn mime_type_validation() {
        assert!(MimeType::new("text/plain").is_ok());
        assert!(MimeType::new("text").is_err());
        assert!(MimeType::new("/plain").is_err());
    }

    #[test]
    fn protocol_version_validation() {
        assert!(ProtocolVersion::new("2024-11-05").is_ok());
        assert!(ProtocolVersion::new("2024-11-5").is_err());
        assert_eq!(ProtocolVersion::current().as_str(), ProtocolVersion::CURRENT);
    }

    #[test]
    fn list_result_pagination() {
        let page = ListToolsResult::with_cursor(vec![], Some("next".to_string()));
        assert_eq!(page.next_cursor.as_deref(), Some("next"));
    }

    #[test]
    fn call_tool_result_error_text() {
        let result = CallToolResult::error_text("boom");
        assert!(result.is_error);
        assert_eq!(result.content[0].as_text(), Some("boom"));
    }

    #[test]
    fn initialize_request_builds_jsonrpc_envelope() {
        let req = InitializeRequest::with_version(
            ProtocolVersion::current(),
            serde_json::json!({}),
            ClientInfo {
                name: "test".into(),
                version: "0.1.0".into(),
            },
        );
        let id = RequestId::new_string("init").unwrap();
        let jsonrpc = req.to_jsonrpc_request(id).unwrap();
        assert_eq!(jsonrpc.method, methods::INITIALIZE);
    }

    #[test]
    fn complete_request_for_prompt_tags_the_reference() {
        let request = CompleteRequest::for_prompt(
            "greeting",
            CompletionArgument {
                name: "name".into(),
                value: "Al".into(),
            },
        );
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["ref"]["type"], "ref/prompt");
        assert_eq!(json["ref"]["name"], "greeting");
        assert_eq!(json["argument"]["value"], "Al");
    }

    #[test]
    fn complete_request_for_resource_tags_the_reference() {
        let request = CompleteRequest::for_resource(
            "file:///{path}",
            CompletionArgument {
                name: "path".into(),
                value: "src/".into(),
            },
        );
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["ref"]["type"], "ref/resource");
        assert_eq!(json["ref"]["uri"], "file:///{path}");
    }

    #[test]
    fn completion_result_round_trips_without_optional_fields() {
        let result = CompleteResult {
            completion: Completion {
                values: vec!["a".into(), "b".into()],
                total: None,
                has_more: None,
            },
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(!json.contains("total"));
        assert!(!json.contains("hasMore"));
        let parsed: CompleteResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, result);
    }

    #[test]
    fn roots_with_equal_uris_and_names_compare_equal() {
        let a = Root::new("file:///tmp", Some("tmp"));
        let b = Root::new("file:///tmp", Some("tmp"));
        let c = Root::new("file:///home", Some("home"));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
