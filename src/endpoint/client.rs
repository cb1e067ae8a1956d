//! The client-side MCP session state machine
//!
//! [`Endpoint`] owns one [`Transport`], drives the `initialize` handshake,
//! and exposes the high-level MCP operations (resources/tools/prompts,
//! logging) on top of [`CorrelationManager`]-based request/response
//! correlation. A background task reads `transport.messages()` for the
//! lifetime of the connection, routing responses back to whichever call is
//! awaiting them, notifications onto a broadcast channel callers can
//! subscribe to (`crate::host::Host` uses this to refresh its connection
//! caches), and server-initiated requests to a [`ServerRequestHandler`] —
//! mirroring the single reader-task-plus-correlation-table shape the
//! teacher's client used, now generalized over [`crate::transport::Transport`]
//! instead of a transport-specific message-handler callback. Unlike the
//! teacher's client, this endpoint does not cache resource/tool/prompt
//! lists itself — that's connection state owned by the host aggregator.

use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use futures::StreamExt;
use serde_json::Value;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::correlation::{CorrelationConfig, CorrelationError, CorrelationManager};
use crate::endpoint::error::{EndpointError, EndpointResult};
use crate::endpoint::handler::{HandlerResult, NullHandler, ServerRequestHandler};
use crate::endpoint::progress::{ProgressRegistry, ProgressUpdate};
use crate::protocol::constants::{defaults, methods};
use crate::protocol::{
    CallToolRequest, CallToolResult, ClientCapabilities, ClientInfo, Content, GetPromptRequest,
    GetPromptResult, InitializeRequest, InitializeResponse, JsonRpcErrorObject, JsonRpcMessage,
    JsonRpcMessageTrait, JsonRpcNotification, JsonRpcRequest, ListPromptsRequest,
    ListPromptsResult, ListResourcesRequest, ListResourcesResult, ListToolsRequest,
    ListToolsResult, LoggingConfig, Prompt, ProgressToken, ProtocolVersion, ReadResourceRequest,
    ReadResourceResult, RequestId, Resource, Root, ServerCapabilities, ServerInfo,
    SetLoggingRequest, Tool,
};
use crate::transport::Transport;

/// The MCP session's lifecycle, distinct from the transport's own
/// connectivity state (`crate::transport::TransportState`): a transport can
/// be `Connected` before the handshake starts, and stays `Connected` while
/// the endpoint is `Initializing`.
#[derive(Debug, Clone)]
pub enum SessionState {
    /// No connection attempt in progress.
    Disconnected,
    /// Transport is starting.
    Connecting,
    /// Transport is up, `initialize` is in flight.
    Initializing,
    /// Handshake complete; carries the negotiated server capabilities.
    Running(ServerCapabilities),
    /// The handshake or an unrecoverable transport error failed the session.
    Failed(String),
}

impl SessionState {
    fn label(&self) -> String {
        match self {
            SessionState::Disconnected => "disconnected".to_string(),
            SessionState::Connecting => "connecting".to_string(),
            SessionState::Initializing => "initializing".to_string(),
            SessionState::Running(_) => "running".to_string(),
            SessionState::Failed(reason) => format!("failed ({reason})"),
        }
    }
}

/// A server-pushed event, broadcast to every subscriber. `crate::host::Host`
/// subscribes to this to know when to refresh a connection's cached
/// tools/resources/prompts; a caller that doesn't need that can ignore it.
#[derive(Debug, Clone)]
pub enum NotificationEvent {
    /// The server's tool list changed; a fresh `tools/list` is needed.
    ToolListChanged,
    /// The server's resource list changed; a fresh `resources/list` is needed.
    ResourceListChanged,
    /// A subscribed resource's contents changed.
    ResourceUpdated {
        /// URI of the updated resource, if the server included one.
        uri: Option<String>,
    },
    /// The server's prompt list changed; a fresh `prompts/list` is needed.
    PromptListChanged,
    /// A log message at or above the server's configured level.
    LogMessage(Value),
}

/// Configuration for an [`Endpoint`].
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// Identity sent in the `initialize` request.
    pub client_info: ClientInfo,
    /// Capabilities advertised during the handshake.
    pub capabilities: ClientCapabilities,
    /// Protocol version this client speaks.
    pub protocol_version: ProtocolVersion,
    /// Default per-request timeout.
    pub default_timeout: Duration,
    /// Correlation table configuration (capacity, cleanup cadence).
    pub correlation: CorrelationConfig,
    /// Capacity of the broadcast notification channel. Slow subscribers
    /// observe `RecvError::Lagged` rather than blocking the reader task.
    pub notification_channel_capacity: usize,
    /// Filesystem roots reported in response to `roots/list`, before any
    /// call to [`Endpoint::set_roots`].
    pub initial_roots: Vec<Root>,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            client_info: ClientInfo {
                name: "mcp-client".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            capabilities: ClientCapabilities::default(),
            protocol_version: ProtocolVersion::default(),
            default_timeout: Duration::from_secs(defaults::TIMEOUT_SECONDS),
            correlation: CorrelationConfig::default(),
            notification_channel_capacity: 256,
            initial_roots: Vec::new(),
        }
    }
}

fn to_time_delta(duration: Duration) -> TimeDelta {
    TimeDelta::from_std(duration).unwrap_or(TimeDelta::seconds(defaults::TIMEOUT_SECONDS as i64))
}

/// The client side of one MCP session.
pub struct Endpoint<T: Transport> {
    transport: Arc<Mutex<T>>,
    correlation: Arc<CorrelationManager>,
    state: Arc<RwLock<SessionState>>,
    server_info: Arc<RwLock<Option<ServerInfo>>>,
    config: EndpointConfig,
    notifications: broadcast::Sender<NotificationEvent>,
    progress: Arc<ProgressRegistry>,
    handler: Arc<dyn ServerRequestHandler>,
    roots: Arc<RwLock<Vec<Root>>>,
    reader_task: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Transport + 'static> Endpoint<T> {
    /// Build an endpoint over `transport` that declines every
    /// server-initiated request (no sampling, no roots).
    pub async fn new(transport: T, config: EndpointConfig) -> EndpointResult<Self> {
        Self::with_handler(transport, config, Arc::new(NullHandler)).await
    }

    /// Build an endpoint with a caller-supplied [`ServerRequestHandler`].
    pub async fn with_handler(
        transport: T,
        config: EndpointConfig,
        handler: Arc<dyn ServerRequestHandler>,
    ) -> EndpointResult<Self> {
        let correlation = CorrelationManager::new(config.correlation.clone()).await?;
        let (notifications, _) = broadcast::channel(config.notification_channel_capacity);
        let roots = Arc::new(RwLock::new(config.initial_roots.clone()));
        Ok(Self {
            transport: Arc::new(Mutex::new(transport)),
            correlation: Arc::new(correlation),
            state: Arc::new(RwLock::new(SessionState::Disconnected)),
            server_info: Arc::new(RwLock::new(None)),
            config,
            notifications,
            progress: Arc::new(ProgressRegistry::new()),
            handler,
            roots,
            reader_task: Mutex::new(None),
        })
    }

    /// Current session state.
    pub async fn state(&self) -> SessionState {
        self.state.read().await.clone()
    }

    /// `true` once the handshake completed and the session is usable.
    pub async fn is_ready(&self) -> bool {
        matches!(*self.state.read().await, SessionState::Running(_))
    }

    /// Negotiated server capabilities, once `Running`.
    pub async fn server_capabilities(&self) -> Option<ServerCapabilities> {
        match &*self.state.read().await {
            SessionState::Running(caps) => Some(caps.clone()),
            _ => None,
        }
    }

    /// The server's self-reported identity, captured during the handshake.
    pub async fn server_info(&self) -> Option<ServerInfo> {
        self.server_info.read().await.clone()
    }

    /// Subscribe to server-pushed notifications (list-changed, resource
    /// updates, log messages). Each subscriber gets its own lagging cursor;
    /// a slow one drops the oldest un-delivered events rather than stalling
    /// the reader task.
    pub fn subscribe_notifications(&self) -> broadcast::Receiver<NotificationEvent> {
        self.notifications.subscribe()
    }

    /// Replace the set of filesystem roots reported to `roots/list`. If the
    /// set actually changed and the client negotiated
    /// `capabilities.roots.list_changed`, emits `notifications/roots/list_changed`.
    pub async fn set_roots(&self, roots: Vec<Root>) -> EndpointResult<()> {
        {
            let mut current = self.roots.write().await;
            if *current == roots {
                return Ok(());
            }
            *current = roots;
        }

        let announces_changes = self
            .config
            .capabilities
            .roots
            .as_ref()
            .is_some_and(|r| r.list_changed.unwrap_or(false));
        if announces_changes {
            self.notify(methods::ROOTS_LIST_CHANGED, None).await?;
        }
        Ok(())
    }

    /// Cancel an in-flight request locally: tell the server via
    /// `notifications/cancelled` and resolve the caller's pending `call()`
    /// with a cancellation error. A no-op (returns the correlation lookup
    /// error) if the request already completed or was never issued.
    pub async fn cancel_request(&self, id: &RequestId, reason: Option<&str>) -> EndpointResult<()> {
        let params = serde_json::json!({ "requestId": id, "reason": reason });
        self.notify(methods::CANCELLED, Some(params)).await?;
        self.correlation.cancel_request(id).await?;
        Ok(())
    }

    /// Subscribe to progress updates for a request built with
    /// `JsonRpcRequest::with_progress_token(&token)`.
    pub fn subscribe_progress(&self, token: &ProgressToken) -> tokio::sync::mpsc::Receiver<ProgressUpdate> {
        self.progress.subscribe(token.as_request_id().clone())
    }

    /// Start the transport, run the `initialize` handshake, and bring the
    /// session to `Running`. Fails and moves to `Failed` on any handshake
    /// error; the transport itself is left however `start()` left it.
    pub async fn connect(&self) -> EndpointResult<ServerCapabilities> {
        {
            let state = self.state.read().await;
            if !matches!(*state, SessionState::Disconnected | SessionState::Failed(_)) {
                return Err(EndpointError::invalid_state(state.label()));
            }
        }
        *self.state.write().await = SessionState::Connecting;

        self.transport.lock().await.start().await?;
        self.spawn_reader().await;

        *self.state.write().await = SessionState::Initializing;

        match self.handshake().await {
            Ok(caps) => {
                *self.state.write().await = SessionState::Running(caps.clone());
                Ok(caps)
            }
            Err(err) => {
                *self.state.write().await = SessionState::Failed(err.to_string());
                Err(err)
            }
        }
    }

    async fn handshake(&self) -> EndpointResult<ServerCapabilities> {
        let request = InitializeRequest::with_version(
            self.config.protocol_version.clone(),
            serde_json::to_value(&self.config.capabilities)?,
            self.config.client_info.clone(),
        );
        let params = serde_json::to_value(&request)?;

        let result = self.call(methods::INITIALIZE, Some(params), None).await?;
        let response: InitializeResponse = serde_json::from_value(result)
            .map_err(|e| EndpointError::handshake_failed(format!("malformed initialize response: {e}")))?;

        if response.protocol_version != self.config.protocol_version {
            warn!(
                "server negotiated protocol version {} differs from requested {}",
                response.protocol_version, self.config.protocol_version
            );
        }

        let capabilities: ServerCapabilities = serde_json::from_value(response.capabilities)
            .map_err(|e| EndpointError::handshake_failed(format!("malformed server capabilities: {e}")))?;

        *self.server_info.write().await = Some(response.server_info);

        self.notify(methods::INITIALIZED, None).await?;

        Ok(capabilities)
    }

    async fn spawn_reader(&self) {
        let mut messages = self.transport.lock().await.messages();
        let correlation = self.correlation.clone();
        let progress = self.progress.clone();
        let notifications = self.notifications.clone();
        let handler = self.handler.clone();
        let transport = self.transport.clone();
        let roots = self.roots.clone();

        let task = tokio::spawn(async move {
            while let Some(frame) = messages.next().await {
                let bytes = match frame {
                    Ok(bytes) => bytes,
                    Err(err) => {
                        warn!("endpoint reader: transport error: {err}");
                        continue;
                    }
                };
                let value: Value = match serde_json::from_slice(&bytes) {
                    Ok(value) => value,
                    Err(err) => {
                        warn!("endpoint reader: malformed JSON: {err}");
                        continue;
                    }
                };
                let message = match JsonRpcMessage::classify(value) {
                    Ok(message) => message,
                    Err(err) => {
                        warn!("endpoint reader: {err}");
                        continue;
                    }
                };

                match message {
                    JsonRpcMessage::Response(response) => {
                        let Some(id) = response.id else { continue };
                        let outcome = match response.error {
                            Some(error) => Err(CorrelationError::Internal {
                                message: error.to_string(),
                            }),
                            None => Ok(response.result.unwrap_or(Value::Null)),
                        };
                        if let Err(err) = correlation.correlate_response(&id, outcome).await {
                            debug!("endpoint reader: {err}");
                        }
                    }
                    JsonRpcMessage::Notification(notification) => {
                        dispatch_notification(notification, &notifications, &progress);
                    }
                    JsonRpcMessage::Request(request) => {
                        let handler = handler.clone();
                        let transport = transport.clone();
                        let roots = roots.clone();
                        tokio::spawn(async move {
                            respond_to_server_request::<T>(request, &handler, &transport, &roots).await;
                        });
                    }
                }
            }
            debug!("endpoint reader: message stream ended");
        });

        *self.reader_task.lock().await = Some(task);
    }

    /// Send a request and wait for its correlated response.
    async fn call(&self, method: &str, params: Option<Value>, timeout: Option<Duration>) -> EndpointResult<Value> {
        let timeout = timeout.unwrap_or(self.config.default_timeout);
        let (id, receiver) = self
            .correlation
            .register_request(Some(to_time_delta(timeout)), params.clone().unwrap_or(Value::Null))
            .await?;

        let request = JsonRpcRequest::new(method, params, id.clone());
        let bytes = request.to_bytes()?;

        if let Err(err) = self.transport.lock().await.send(bytes, Some(timeout)).await {
            let _ = self.correlation.cancel_request(&id).await;
            return Err(err.into());
        }

        let outcome = receiver.await.map_err(|_| {
            EndpointError::Correlation(CorrelationError::ChannelClosed {
                id: id.clone(),
                details: "response channel dropped".to_string(),
            })
        })?;

        if let Err(CorrelationError::Timeout { id, .. }) = &outcome {
            let params = serde_json::json!({ "requestId": id, "reason": "timeout" });
            if let Err(err) = self.notify(methods::CANCELLED, Some(params)).await {
                debug!("endpoint: failed to notify cancellation for {id}: {err}");
            }
        }

        outcome.map_err(EndpointError::Correlation)
    }

    /// Send a fire-and-forget notification.
    async fn notify(&self, method: &str, params: Option<Value>) -> EndpointResult<()> {
        let notification = JsonRpcNotification::new(method, params);
        let bytes = notification.to_bytes()?;
        self.transport.lock().await.send(bytes, None).await?;
        Ok(())
    }

    async fn ensure_running(&self) -> EndpointResult<ServerCapabilities> {
        match &*self.state.read().await {
            SessionState::Running(caps) => Ok(caps.clone()),
            other => Err(EndpointError::invalid_state(other.label())),
        }
    }

    fn require_capability(present: bool, name: &str) -> EndpointResult<()> {
        if present {
            Ok(())
        } else {
            Err(EndpointError::unsupported_capability(name))
        }
    }

    /// List resources the server exposes. Not cached — repeated calls hit
    /// the wire; `crate::host::Host` is what caches this per connection.
    pub async fn list_resources(&self) -> EndpointResult<Vec<Resource>> {
        let caps = self.ensure_running().await?;
        Self::require_capability(caps.resources.is_some(), "resources")?;

        let request = ListResourcesRequest::new();
        let result = self.call(methods::RESOURCES_LIST, Some(serde_json::to_value(&request)?), None).await?;
        let parsed: ListResourcesResult = serde_json::from_value(result)?;
        Ok(parsed.resources)
    }

    /// Read a resource's contents.
    pub async fn read_resource(&self, uri: impl Into<String>) -> EndpointResult<Vec<Content>> {
        self.ensure_running().await?;
        let request = ReadResourceRequest::new(uri.into())?;
        let result = self.call(methods::RESOURCES_READ, Some(serde_json::to_value(&request)?), None).await?;
        let parsed: ReadResourceResult = serde_json::from_value(result)?;
        Ok(parsed.contents)
    }

    /// Subscribe to update notifications for a resource.
    pub async fn subscribe_resource(&self, uri: impl Into<String>) -> EndpointResult<()> {
        let caps = self.ensure_running().await?;
        Self::require_capability(
            caps.resources.as_ref().is_some_and(|r| r.subscribe.unwrap_or(false)),
            "resources.subscribe",
        )?;
        let request = crate::protocol::SubscribeResourceRequest::new(uri.into())?;
        self.call(methods::RESOURCES_SUBSCRIBE, Some(serde_json::to_value(&request)?), None).await?;
        Ok(())
    }

    /// Stop watching a previously-subscribed resource.
    pub async fn unsubscribe_resource(&self, uri: impl Into<String>) -> EndpointResult<()> {
        self.ensure_running().await?;
        let request = crate::protocol::UnsubscribeResourceRequest::new(uri.into())?;
        self.call(methods::RESOURCES_UNSUBSCRIBE, Some(serde_json::to_value(&request)?), None).await?;
        Ok(())
    }

    /// List resource templates the server exposes.
    pub async fn list_resource_templates(&self) -> EndpointResult<Vec<crate::protocol::ResourceTemplate>> {
        let caps = self.ensure_running().await?;
        Self::require_capability(caps.resources.is_some(), "resources")?;

        let request = crate::protocol::ListResourceTemplatesRequest::new();
        let result = self.call(methods::RESOURCES_TEMPLATES_LIST, Some(serde_json::to_value(&request)?), None).await?;
        let parsed: crate::protocol::ListResourceTemplatesResult = serde_json::from_value(result)?;
        Ok(parsed.resource_templates)
    }

    /// Ask the server to suggest completions for a prompt argument or
    /// resource template variable.
    pub async fn complete(
        &self,
        request: crate::protocol::CompleteRequest,
    ) -> EndpointResult<crate::protocol::Completion> {
        let caps = self.ensure_running().await?;
        Self::require_capability(caps.completions.is_some(), "completions")?;

        let result = self.call(methods::COMPLETION_COMPLETE, Some(serde_json::to_value(&request)?), None).await?;
        let parsed: crate::protocol::CompleteResult = serde_json::from_value(result)?;
        Ok(parsed.completion)
    }

    /// List available tools. Not cached; see [`Endpoint::list_resources`].
    pub async fn list_tools(&self) -> EndpointResult<Vec<Tool>> {
        let caps = self.ensure_running().await?;
        Self::require_capability(caps.tools.is_some(), "tools")?;

        let request = ListToolsRequest::new();
        let result = self.call(methods::TOOLS_LIST, Some(serde_json::to_value(&request)?), None).await?;
        let parsed: ListToolsResult = serde_json::from_value(result)?;
        Ok(parsed.tools)
    }

    /// Invoke a tool by name.
    pub async fn call_tool(&self, name: impl Into<String>, arguments: Option<Value>) -> EndpointResult<Vec<Content>> {
        self.ensure_running().await?;
        let name = name.into();
        let request = CallToolRequest::new(name.clone(), arguments.unwrap_or(Value::Null));
        let result = self.call(methods::TOOLS_CALL, Some(serde_json::to_value(&request)?), None).await?;
        let parsed: CallToolResult = serde_json::from_value(result)?;

        if parsed.is_error {
            let message = parsed
                .content
                .iter()
                .find_map(|c| c.as_text())
                .unwrap_or("tool execution failed")
                .to_string();
            return Err(EndpointError::server(format!("tool {name} failed: {message}")));
        }
        Ok(parsed.content)
    }

    /// List available prompts. Not cached; see [`Endpoint::list_resources`].
    pub async fn list_prompts(&self) -> EndpointResult<Vec<Prompt>> {
        let caps = self.ensure_running().await?;
        Self::require_capability(caps.prompts.is_some(), "prompts")?;

        let request = ListPromptsRequest::new();
        let result = self.call(methods::PROMPTS_LIST, Some(serde_json::to_value(&request)?), None).await?;
        let parsed: ListPromptsResult = serde_json::from_value(result)?;
        Ok(parsed.prompts)
    }

    /// Render a prompt with the given arguments.
    pub async fn get_prompt(
        &self,
        name: impl Into<String>,
        arguments: std::collections::HashMap<String, String>,
    ) -> EndpointResult<GetPromptResult> {
        self.ensure_running().await?;
        let request = GetPromptRequest::new(name, arguments);
        let result = self.call(methods::PROMPTS_GET, Some(serde_json::to_value(&request)?), None).await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Ask the server to change its minimum logging level.
    pub async fn set_logging_config(&self, config: LoggingConfig) -> EndpointResult<()> {
        let caps = self.ensure_running().await?;
        Self::require_capability(caps.logging.is_some(), "logging")?;
        let request = SetLoggingRequest::new(config.level);
        self.call(methods::LOGGING_SET_LEVEL, Some(serde_json::to_value(&request)?), None).await?;
        Ok(())
    }

    /// Send a liveness check and wait for the empty success response.
    pub async fn ping(&self) -> EndpointResult<()> {
        self.call(methods::PING, None, Some(Duration::from_secs(5))).await?;
        Ok(())
    }

    /// Tear down the session: stop the transport and cancel the reader task.
    pub async fn disconnect(&self) -> EndpointResult<()> {
        if let Some(task) = self.reader_task.lock().await.take() {
            task.abort();
        }
        self.transport.lock().await.stop().await?;
        *self.state.write().await = SessionState::Disconnected;
        Ok(())
    }
}

fn dispatch_notification(
    notification: JsonRpcNotification,
    notifications: &broadcast::Sender<NotificationEvent>,
    progress: &Arc<ProgressRegistry>,
) {
    match notification.method.as_str() {
        methods::RESOURCES_LIST_CHANGED => {
            let _ = notifications.send(NotificationEvent::ResourceListChanged);
        }
        methods::RESOURCES_UPDATED => {
            let uri = notification
                .params
                .as_ref()
                .and_then(|p| p.get("uri"))
                .and_then(Value::as_str)
                .map(str::to_string);
            let _ = notifications.send(NotificationEvent::ResourceUpdated { uri });
        }
        methods::TOOLS_LIST_CHANGED => {
            let _ = notifications.send(NotificationEvent::ToolListChanged);
        }
        methods::PROMPTS_LIST_CHANGED => {
            let _ = notifications.send(NotificationEvent::PromptListChanged);
        }
        methods::PROGRESS => {
            if let Some(params) = notification.params {
                progress.dispatch(params);
            }
        }
        methods::LOGGING_MESSAGE => {
            if let Some(params) = notification.params {
                let _ = notifications.send(NotificationEvent::LogMessage(params));
            }
        }
        other => {
            debug!("unhandled notification: {other}");
        }
    }
}

async fn respond_to_server_request<T: Transport>(
    request: JsonRpcRequest,
    handler: &Arc<dyn ServerRequestHandler>,
    transport: &Arc<Mutex<T>>,
    roots: &Arc<RwLock<Vec<Root>>>,
) {
    let params = request.params.clone().unwrap_or(Value::Null);
    let outcome = match request.method.as_str() {
        methods::SAMPLING_CREATE_MESSAGE => handler.create_message(params).await,
        methods::ROOTS_LIST => {
            let roots = roots.read().await.clone();
            roots_list_response(&roots)
        }
        other => Err(JsonRpcErrorObject::new(
            crate::protocol::constants::error_codes::METHOD_NOT_FOUND,
            format!("method not found: {other}"),
        )),
    };

    let response = match outcome {
        Ok(result) => crate::protocol::JsonRpcResponse::success(result, request.id),
        Err(error) => crate::protocol::JsonRpcResponse::error(error.to_value(), Some(request.id)),
    };

    let Ok(bytes) = response.to_bytes() else {
        warn!("failed to serialize response to server-initiated request");
        return;
    };
    if let Err(err) = transport.lock().await.send(bytes, None).await {
        warn!("failed to send response to server-initiated request: {err}");
    }
}

fn roots_list_response(roots: &[Root]) -> HandlerResult {
    serde_json::to_value(serde_json::json!({ "roots": roots }))
        .map_err(|e| JsonRpcErrorObject::new(crate::protocol::constants::error_codes::INTERNAL_ERROR, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_state_labels_are_stable() {
        assert_eq!(SessionState::Disconnected.label(), "disconnected");
        assert_eq!(SessionState::Failed("boom".into()).label(), "failed (boom)");
    }

    #[test]
    fn require_capability_rejects_absent() {
        assert!(Endpoint::<crate::transport::stdio::StdioTransport>::require_capability(false, "tools").is_err());
        assert!(Endpoint::<crate::transport::stdio::StdioTransport>::require_capability(true, "tools").is_ok());
    }

    #[test]
    fn dispatch_notification_routes_list_changed_events() {
        let (tx, mut rx) = broadcast::channel(8);
        let progress = Arc::new(ProgressRegistry::new());

        dispatch_notification(
            JsonRpcNotification::new(methods::TOOLS_LIST_CHANGED, None),
            &tx,
            &progress,
        );

        assert!(matches!(rx.try_recv().unwrap(), NotificationEvent::ToolListChanged));
    }

    #[test]
    fn dispatch_notification_extracts_updated_resource_uri() {
        let (tx, mut rx) = broadcast::channel(8);
        let progress = Arc::new(ProgressRegistry::new());

        dispatch_notification(
            JsonRpcNotification::new(methods::RESOURCES_UPDATED, Some(serde_json::json!({"uri": "file:///a"}))),
            &tx,
            &progress,
        );

        let event = rx.try_recv().unwrap();
        assert!(matches!(&event, NotificationEvent::ResourceUpdated { uri } if uri.as_deref() == Some("file:///a")));
    }

    #[test]
    fn roots_list_response_wraps_roots_under_a_roots_key() {
        let roots = vec![Root::new("file:///tmp", Some("tmp"))];
        let value = roots_list_response(&roots).unwrap();
        assert_eq!(value["roots"][0]["uri"], "file:///tmp");
        assert_eq!(value["roots"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn roots_list_response_handles_empty_roots() {
        let value = roots_list_response(&[]).unwrap();
        assert_eq!(value["roots"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn cancel_request_surfaces_transport_error_when_not_connected() {
        let transport = crate::transport::stdio::StdioTransport::new(
            crate::transport::stdio::StdioConfig::new("true"),
        );
        let endpoint = Endpoint::new(transport, EndpointConfig::default()).await.unwrap();

        let id = RequestId::new_number(1).unwrap();
        let err = endpoint.cancel_request(&id, Some("user requested")).await.unwrap_err();
        assert!(matches!(err, EndpointError::Transport(_)));
    }

    #[tokio::test]
    async fn set_roots_is_a_no_op_when_unchanged() {
        let transport = crate::transport::stdio::StdioTransport::new(
            crate::transport::stdio::StdioConfig::new("true"),
        );
        let endpoint = Endpoint::new(transport, EndpointConfig::default()).await.unwrap();

        let roots = vec![Root::new("file:///a", Some("a"))];
        endpoint.set_roots(roots.clone()).await.unwrap();
        // No server capability announcement was negotiated (never connected), so the
        // second call must short-circuit on the equality check rather than attempt a
        // notification over a transport that was never started.
        endpoint.set_roots(roots).await.unwrap();
    }
}
