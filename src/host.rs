//! The host aggregator: a named set of MCP connections
//!
//! Where [`crate::endpoint::Endpoint`] owns exactly one session, [`Host`]
//! owns a `name → connection` map and keeps each connection's tool/resource/
//! prompt lists refreshed by listening to its endpoint's notification
//! stream — the same DashMap-owned-shared-state shape
//! [`crate::correlation::manager::CorrelationManager`] uses for its pending-
//! request table, applied here to connections instead of in-flight requests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::warn;

use crate::endpoint::{
    Endpoint, EndpointConfig, EndpointError, NotificationEvent, NullHandler, ServerRequestHandler,
};
use crate::protocol::{Prompt, Resource, ServerCapabilities, ServerInfo, Tool};
use crate::transport::Transport;

/// Errors from host-level operations.
#[derive(Debug, Error)]
pub enum HostError {
    /// No connection is registered under this id.
    #[error("no connection named {0}")]
    UnknownConnection(String),
    /// A connection with this id already exists.
    #[error("connection {0} already exists")]
    DuplicateConnection(String),
    /// The underlying endpoint failed.
    #[error("endpoint error on connection {id}: {source}")]
    Endpoint {
        /// Connection id the failure occurred on.
        id: String,
        /// Underlying error.
        #[source]
        source: EndpointError,
    },
}

/// Convenient result type for host operations.
pub type HostResult<T> = Result<T, HostError>;

/// Configuration shared by every connection a [`Host`] manages.
#[derive(Debug, Clone, Default)]
pub struct HostConfig {
    /// Endpoint configuration applied to each new connection.
    pub endpoint: EndpointConfig,
}

/// A connection's observable status, independent of its cached lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// Handshake complete, endpoint ready.
    Connected,
    /// `disconnect` was called, or the endpoint reported one.
    Disconnected,
    /// The handshake or a subsequent operation failed.
    Failed(String),
}

/// A snapshot of one connection's cached state, returned from query methods.
#[derive(Debug, Clone)]
pub struct ConnectionState {
    /// The name this connection was registered under.
    pub id: String,
    /// The server's self-reported identity.
    pub server_info: ServerInfo,
    /// Capabilities negotiated during the handshake.
    pub server_capabilities: ServerCapabilities,
    /// Last refreshed tool list.
    pub tools: Vec<Tool>,
    /// Last refreshed resource list.
    pub resources: Vec<Resource>,
    /// Last refreshed prompt list.
    pub prompts: Vec<Prompt>,
    /// Time since the last successful request or refresh on this connection.
    pub idle_for: Duration,
    /// Current connectivity status.
    pub status: ConnectionStatus,
}

struct Connection<T: Transport + 'static> {
    endpoint: Arc<Endpoint<T>>,
    server_info: ServerInfo,
    capabilities: ServerCapabilities,
    tools: RwLock<Vec<Tool>>,
    resources: RwLock<Vec<Resource>>,
    prompts: RwLock<Vec<Prompt>>,
    last_activity: RwLock<Instant>,
    status: RwLock<ConnectionStatus>,
    refreshing_tools: AtomicBool,
    refreshing_resources: AtomicBool,
    refreshing_prompts: AtomicBool,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Transport + 'static> Connection<T> {
    fn touch(&self) {
        if let Ok(mut last_activity) = self.last_activity.try_write() {
            *last_activity = Instant::now();
        }
    }
}

/// Aggregates multiple named MCP connections over a single transport kind.
///
/// All connections share one `T: Transport` type (e.g. every connection is a
/// spawned stdio child, or every connection is an SSE session) — a host that
/// needs to mix transport kinds runs one `Host` per kind.
pub struct Host<T: Transport + 'static> {
    connections: DashMap<String, Arc<Connection<T>>>,
    config: HostConfig,
}

impl<T: Transport + 'static> Host<T> {
    /// Build an empty host.
    pub fn new(config: HostConfig) -> Self {
        Self {
            connections: DashMap::new(),
            config,
        }
    }

    /// Connect a new named endpoint, run its handshake, and start listening
    /// for notifications that invalidate its cached lists. Fails if `id` is
    /// already registered.
    pub async fn connect(&self, id: impl Into<String>, transport: T) -> HostResult<ServerCapabilities> {
        self.connect_with_handler(id, transport, Arc::new(NullHandler)).await
    }

    /// Like [`Host::connect`], but with a caller-supplied handler for
    /// server-initiated requests (sampling, roots).
    pub async fn connect_with_handler(
        &self,
        id: impl Into<String>,
        transport: T,
        handler: Arc<dyn ServerRequestHandler>,
    ) -> HostResult<ServerCapabilities> {
        let id = id.into();
        if self.connections.contains_key(&id) {
            return Err(HostError::DuplicateConnection(id));
        }

        let endpoint = Arc::new(
            Endpoint::with_handler(transport, self.config.endpoint.clone(), handler)
                .await
                .map_err(|source| HostError::Endpoint { id: id.clone(), source })?,
        );
        let capabilities = endpoint
            .connect()
            .await
            .map_err(|source| HostError::Endpoint { id: id.clone(), source })?;
        let server_info = endpoint.server_info().await.unwrap_or(ServerInfo {
            name: "unknown".to_string(),
            version: "0".to_string(),
        });

        let connection = Arc::new(Connection {
            endpoint: endpoint.clone(),
            server_info,
            capabilities: capabilities.clone(),
            tools: RwLock::new(Vec::new()),
            resources: RwLock::new(Vec::new()),
            prompts: RwLock::new(Vec::new()),
            last_activity: RwLock::new(Instant::now()),
            status: RwLock::new(ConnectionStatus::Connected),
            refreshing_tools: AtomicBool::new(false),
            refreshing_resources: AtomicBool::new(false),
            refreshing_prompts: AtomicBool::new(false),
            listener: Mutex::new(None),
        });

        if capabilities.tools.is_some() {
            refresh_tools(&connection).await;
        }
        if capabilities.resources.is_some() {
            refresh_resources(&connection).await;
        }
        if capabilities.prompts.is_some() {
            refresh_prompts(&connection).await;
        }

        let listener = spawn_listener(id.clone(), connection.clone());
        *connection.listener.lock().await = Some(listener);

        self.connections.insert(id, connection);
        Ok(capabilities)
    }

    /// Stop a connection's endpoint, cancel its listener, and forget it.
    pub async fn disconnect(&self, id: &str) -> HostResult<()> {
        let (_, connection) = self
            .connections
            .remove(id)
            .ok_or_else(|| HostError::UnknownConnection(id.to_string()))?;

        if let Some(task) = connection.listener.lock().await.take() {
            task.abort();
        }
        connection
            .endpoint
            .disconnect()
            .await
            .map_err(|source| HostError::Endpoint { id: id.to_string(), source })?;
        *connection.status.write().await = ConnectionStatus::Disconnected;
        Ok(())
    }

    /// Snapshot one connection's cached state.
    pub async fn connection_state(&self, id: &str) -> HostResult<ConnectionState> {
        let connection = self
            .connections
            .get(id)
            .ok_or_else(|| HostError::UnknownConnection(id.to_string()))?
            .clone();
        Ok(snapshot(id, &connection).await)
    }

    /// Snapshot every registered connection.
    pub async fn connections(&self) -> Vec<ConnectionState> {
        let entries: Vec<(String, Arc<Connection<T>>)> = self
            .connections
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        let mut snapshots = Vec::with_capacity(entries.len());
        for (id, connection) in entries {
            snapshots.push(snapshot(&id, &connection).await);
        }
        snapshots
    }

    /// Connections whose negotiated capabilities include `feature`
    /// (`"tools"`, `"resources"`, or `"prompts"`).
    pub async fn connections_supporting(&self, feature: &str) -> Vec<ConnectionState> {
        let mut matching = Vec::new();
        for state in self.connections().await {
            let supports = match feature {
                "tools" => state.server_capabilities.tools.is_some(),
                "resources" => state.server_capabilities.resources.is_some(),
                "prompts" => state.server_capabilities.prompts.is_some(),
                "logging" => state.server_capabilities.logging.is_some(),
                _ => false,
            };
            if supports {
                matching.push(state);
            }
        }
        matching
    }

    /// Union of every connection's tools, tagged with the owning connection
    /// id, deduplicated by `(connection id, tool name)`.
    pub async fn available_tools(&self) -> Vec<(String, Tool)> {
        let mut seen = HashSet::new();
        let mut tools = Vec::new();
        for state in self.connections().await {
            for tool in state.tools {
                let key = (state.id.clone(), tool.name.clone());
                if seen.insert(key) {
                    tools.push((state.id.clone(), tool));
                }
            }
        }
        tools
    }

    /// Connections idle (no successful request/refresh) for longer than `timeout`.
    pub async fn inactive_connections(&self, timeout: Duration) -> Vec<ConnectionState> {
        self.connections()
            .await
            .into_iter()
            .filter(|state| state.idle_for > timeout)
            .collect()
    }

    /// Connections currently in the `Failed` status.
    pub async fn failed_connections(&self) -> Vec<ConnectionState> {
        self.connections()
            .await
            .into_iter()
            .filter(|state| matches!(state.status, ConnectionStatus::Failed(_)))
            .collect()
    }
}

async fn snapshot<T: Transport + 'static>(id: &str, connection: &Connection<T>) -> ConnectionState {
    ConnectionState {
        id: id.to_string(),
        server_info: connection.server_info.clone(),
        server_capabilities: connection.capabilities.clone(),
        tools: connection.tools.read().await.clone(),
        resources: connection.resources.read().await.clone(),
        prompts: connection.prompts.read().await.clone(),
        idle_for: connection.last_activity.read().await.elapsed(),
        status: connection.status.read().await.clone(),
    }
}

async fn refresh_tools<T: Transport + 'static>(connection: &Arc<Connection<T>>) {
    if connection.refreshing_tools.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_err() {
        return;
    }
    match connection.endpoint.list_tools().await {
        Ok(tools) => {
            *connection.tools.write().await = tools;
            connection.touch();
        }
        Err(err) => warn!("tool refresh failed: {err}"),
    }
    connection.refreshing_tools.store(false, Ordering::Release);
}

async fn refresh_resources<T: Transport + 'static>(connection: &Arc<Connection<T>>) {
    if connection
        .refreshing_resources
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_err()
    {
        return;
    }
    match connection.endpoint.list_resources().await {
        Ok(resources) => {
            *connection.resources.write().await = resources;
            connection.touch();
        }
        Err(err) => warn!("resource refresh failed: {err}"),
    }
    connection.refreshing_resources.store(false, Ordering::Release);
}

async fn refresh_prompts<T: Transport + 'static>(connection: &Arc<Connection<T>>) {
    if connection
        .refreshing_prompts
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_err()
    {
        return;
    }
    match connection.endpoint.list_prompts().await {
        Ok(prompts) => {
            *connection.prompts.write().await = prompts;
            connection.touch();
        }
        Err(err) => warn!("prompt refresh failed: {err}"),
    }
    connection.refreshing_prompts.store(false, Ordering::Release);
}

fn spawn_listener<T: Transport + 'static>(id: String, connection: Arc<Connection<T>>) -> JoinHandle<()> {
    let mut notifications = connection.endpoint.subscribe_notifications();
    tokio::spawn(async move {
        loop {
            match notifications.recv().await {
                Ok(NotificationEvent::ToolListChanged) => refresh_tools(&connection).await,
                Ok(NotificationEvent::ResourceListChanged | NotificationEvent::ResourceUpdated { .. }) => {
                    refresh_resources(&connection).await;
                }
                Ok(NotificationEvent::PromptListChanged) => refresh_prompts(&connection).await,
                Ok(NotificationEvent::LogMessage(_)) => connection.touch(),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("connection {id}: notification listener lagged, skipped {skipped} events");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_status_equality() {
        assert_eq!(ConnectionStatus::Connected, ConnectionStatus::Connected);
        assert_ne!(ConnectionStatus::Connected, ConnectionStatus::Disconnected);
    }

    #[tokio::test]
    async fn unknown_connection_lookup_fails() {
        let host: Host<crate::transport::stdio::StdioTransport> = Host::new(HostConfig::default());
        assert!(matches!(
            host.connection_state("missing").await,
            Err(HostError::UnknownConnection(_))
        ));
    }

    #[tokio::test]
    async fn disconnect_unknown_connection_fails() {
        let host: Host<crate::transport::stdio::StdioTransport> = Host::new(HostConfig::default());
        assert!(matches!(host.disconnect("missing").await, Err(HostError::UnknownConnection(_))));
    }

    #[tokio::test]
    async fn empty_host_has_no_available_tools() {
        let host: Host<crate::transport::stdio::StdioTransport> = Host::new(HostConfig::default());
        assert!(host.available_tools().await.is_empty());
    }
}
