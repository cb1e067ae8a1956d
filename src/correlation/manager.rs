//! [`CorrelationManager`]: the request/response correlation table plus the
//! background task that reaps entries past their deadline.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use chrono::TimeDelta;
use dashmap::DashMap;
use serde_json::Value;
use tokio::{
    sync::{oneshot, RwLock},
    task::JoinHandle,
    time::{interval, Duration},
};
use tracing::{debug, trace};

use crate::correlation::{
    error::{CorrelationError, CorrelationResult, RequestId},
    types::{PendingRequest, RequestIdGenerator},
};

/// Tuning knobs for a [`CorrelationManager`].
#[derive(Debug, Clone)]
pub struct CorrelationConfig {
    /// Used when `register_request` is called with `timeout: None`.
    pub default_timeout: TimeDelta,
    /// How often the background task sweeps for expired entries.
    pub cleanup_interval: Duration,
    /// `register_request` fails once the table holds this many entries.
    /// `0` disables the limit.
    pub max_pending_requests: usize,
    /// Emit `debug!`/`trace!` for registration, correlation, and cleanup.
    pub enable_tracing: bool,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            default_timeout: TimeDelta::seconds(30),
            cleanup_interval: Duration::from_secs(5),
            max_pending_requests: 1000,
            enable_tracing: true,
        }
    }
}

/// The correlation table for one connection: outbound requests are
/// registered here under a fresh [`RequestId`] and resolved when a matching
/// response, a cancellation, or a timeout reaches them first.
///
/// ```rust
/// use mcp_client::correlation::manager::{CorrelationManager, CorrelationConfig};
/// use serde_json::json;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let manager = CorrelationManager::new(CorrelationConfig::default()).await?;
///
/// let (id, receiver) = manager.register_request(None, json!({"method": "test"})).await?;
/// manager.correlate_response(&id, Ok(json!({"result": "ok"}))).await?;
///
/// assert_eq!(receiver.await??, json!({"result": "ok"}));
/// manager.shutdown().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct CorrelationManager {
    requests: Arc<DashMap<RequestId, PendingRequest>>,
    id_generator: Arc<RequestIdGenerator>,
    config: CorrelationConfig,
    cleanup_task: Arc<RwLock<Option<JoinHandle<()>>>>,
    shutdown_signal: Arc<AtomicBool>,
}

impl CorrelationManager {
    /// Builds a table and starts its background cleanup task.
    pub async fn new(config: CorrelationConfig) -> CorrelationResult<Self> {
        let manager = Self::new_inner(config);
        let cleanup_handle = manager.spawn_cleanup_task();
        *manager.cleanup_task.write().await = Some(cleanup_handle);

        if manager.config.enable_tracing {
            debug!("correlation manager initialized: {:?}", manager.config);
        }
        Ok(manager)
    }

    /// Same as [`Self::new`] but without the background task, so a test can
    /// drive `cleanup_expired_requests` deterministically instead of racing
    /// a timer.
    #[doc(hidden)]
    pub async fn new_without_cleanup(config: CorrelationConfig) -> CorrelationResult<Self> {
        let manager = Self::new_inner(config);
        if manager.config.enable_tracing {
            debug!(
                "correlation manager initialized without cleanup task: {:?}",
                manager.config
            );
        }
        Ok(manager)
    }

    fn new_inner(config: CorrelationConfig) -> Self {
        Self {
            requests: Arc::new(DashMap::new()),
            id_generator: Arc::new(RequestIdGenerator::new()),
            config,
            cleanup_task: Arc::new(RwLock::new(None)),
            shutdown_signal: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Allocates a fresh id, stores `request_data` under it with a deadline
    /// of `timeout` (or `config.default_timeout`), and returns the id plus a
    /// receiver that resolves on response, cancellation, or timeout —
    /// whichever happens first.
    ///
    /// Fails with `CorrelationError::Internal` if `max_pending_requests` is
    /// already at capacity.
    pub async fn register_request(
        &self,
        timeout: Option<TimeDelta>,
        request_data: Value,
    ) -> CorrelationResult<(RequestId, oneshot::Receiver<CorrelationResult<Value>>)> {
        if self.config.max_pending_requests > 0
            && self.requests.len() >= self.config.max_pending_requests
        {
            return Err(CorrelationError::Internal {
                message: "maximum pending requests exceeded".to_string(),
            });
        }

        let (sender, receiver) = oneshot::channel();
        let request_id = self.id_generator.next_id();
        let timeout = timeout.unwrap_or(self.config.default_timeout);

        if self.config.enable_tracing {
            debug!("registering request {request_id} with timeout {timeout:?}");
            trace!("request data: {request_data}");
        }

        self.requests.insert(
            request_id.clone(),
            PendingRequest::new(sender, timeout, request_data),
        );

        Ok((request_id, receiver))
    }

    /// Removes `request_id` from the table and delivers `response` to its
    /// receiver.
    ///
    /// # Errors
    ///
    /// `RequestNotFound` if nothing is pending under that id (already
    /// resolved, or never registered); `ChannelClosed` if the caller dropped
    /// its receiver.
    pub async fn correlate_response(
        &self,
        request_id: &RequestId,
        response: CorrelationResult<Value>,
    ) -> CorrelationResult<()> {
        let (_, pending) = self
            .requests
            .remove(request_id)
            .ok_or_else(|| CorrelationError::RequestNotFound {
                id: request_id.clone(),
            })?;

        if self.config.enable_tracing {
            debug!("correlating response for request {request_id}");
            if let Ok(ref value) = response {
                trace!("response data: {value}");
            }
        }

        pending.sender.send(response).map_err(|_| CorrelationError::ChannelClosed {
            id: request_id.clone(),
            details: "response channel was closed".to_string(),
        })
    }

    /// Number of requests currently awaiting correlation.
    pub async fn pending_count(&self) -> usize {
        self.requests.len()
    }

    /// Removes `request_id` and resolves it with `CorrelationError::Cancelled`.
    pub async fn cancel_request(&self, request_id: &RequestId) -> CorrelationResult<()> {
        let (_, pending) = self
            .requests
            .remove(request_id)
            .ok_or_else(|| CorrelationError::RequestNotFound {
                id: request_id.clone(),
            })?;

        if self.config.enable_tracing {
            debug!("cancelling request {request_id}");
        }

        let _ = pending.sender.send(Err(CorrelationError::Cancelled {
            id: request_id.clone(),
        }));
        Ok(())
    }

    pub async fn is_pending(&self, request_id: &RequestId) -> bool {
        self.requests.contains_key(request_id)
    }

    /// Snapshot of every id currently in the table. Testing/debugging only.
    pub async fn get_pending_request_ids(&self) -> Vec<RequestId> {
        self.requests.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Removes every entry past its deadline and resolves each with
    /// `CorrelationError::Timeout`, returning how many were reaped. Called
    /// on a timer by the background task, but callable directly for a
    /// deterministic sweep in tests (see [`Self::new_without_cleanup`]).
    pub async fn cleanup_expired_requests(&self) -> usize {
        Self::sweep_expired(&self.requests, self.config.enable_tracing)
    }

    /// Removes and resolves every entry past its deadline. A free function
    /// (rather than a `&self` method) so the background task can call it
    /// without holding a reference to the whole manager, just the two
    /// fields it actually needs.
    fn sweep_expired(requests: &DashMap<RequestId, PendingRequest>, enable_tracing: bool) -> usize {
        let now = chrono::Utc::now();

        let expired_ids: Vec<RequestId> = requests
            .iter()
            .filter_map(|entry| entry.value().is_expired_at(&now).then(|| entry.key().clone()))
            .collect();

        if expired_ids.is_empty() {
            return 0;
        }

        if enable_tracing {
            debug!("cleaning up {} expired requests", expired_ids.len());
        }

        for request_id in &expired_ids {
            if let Some((_, pending)) = requests.remove(request_id) {
                let _ = pending.sender.send(Err(CorrelationError::Timeout {
                    id: request_id.clone(),
                    duration: pending.timeout,
                }));
                if enable_tracing {
                    trace!("request {request_id} timed out");
                }
            }
        }

        expired_ids.len()
    }

    fn spawn_cleanup_task(&self) -> JoinHandle<()> {
        let requests = Arc::clone(&self.requests);
        let cleanup_interval = self.config.cleanup_interval;
        let enable_tracing = self.config.enable_tracing;
        let shutdown_signal = Arc::clone(&self.shutdown_signal);

        tokio::spawn(async move {
            let mut ticker = interval(cleanup_interval);
            while !shutdown_signal.load(Ordering::Relaxed) {
                ticker.tick().await;
                Self::sweep_expired(&requests, enable_tracing);
            }
            if enable_tracing {
                debug!("background cleanup task shutting down");
            }
        })
    }

    /// Stops the background task and resolves every still-pending request
    /// with `CorrelationError::Cancelled`.
    pub async fn shutdown(self) -> CorrelationResult<()> {
        if self.config.enable_tracing {
            debug!("shutting down correlation manager");
        }

        self.shutdown_signal.store(true, Ordering::Relaxed);

        if let Some(cleanup_handle) = self.cleanup_task.write().await.take() {
            cleanup_handle.await.map_err(|e| CorrelationError::Internal {
                message: format!("failed to join cleanup task: {e}"),
            })?;
        }

        let pending_ids: Vec<_> = self.requests.iter().map(|entry| entry.key().clone()).collect();
        for request_id in pending_ids {
            if let Some((_, pending)) = self.requests.remove(&request_id) {
                let _ = pending.sender.send(Err(CorrelationError::Cancelled { id: request_id }));
            }
        }

        if self.config.enable_tracing {
            debug!("correlation manager shutdown complete");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::time::sleep;

    fn quiet_config() -> CorrelationConfig {
        CorrelationConfig {
            enable_tracing: false,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn new_manager_starts_empty() -> CorrelationResult<()> {
        let manager = CorrelationManager::new(quiet_config()).await?;
        assert_eq!(manager.pending_count().await, 0);
        manager.shutdown().await
    }

    #[tokio::test]
    async fn registered_request_resolves_on_correlation() -> CorrelationResult<()> {
        let manager = CorrelationManager::new(quiet_config()).await?;

        let (id, receiver) = manager
            .register_request(Some(TimeDelta::seconds(30)), json!({"method": "test"}))
            .await?;
        assert_eq!(manager.pending_count().await, 1);
        assert!(manager.is_pending(&id).await);

        let response = json!({"result": "success"});
        manager.correlate_response(&id, Ok(response.clone())).await?;

        assert_eq!(receiver.await.unwrap()?, response);
        assert_eq!(manager.pending_count().await, 0);
        assert!(!manager.is_pending(&id).await);

        manager.shutdown().await
    }

    #[tokio::test]
    async fn expired_request_resolves_with_timeout_error() -> CorrelationResult<()> {
        let config = CorrelationConfig {
            cleanup_interval: Duration::from_millis(50),
            ..quiet_config()
        };
        let manager = CorrelationManager::new(config).await?;

        let (id, receiver) = manager
            .register_request(Some(TimeDelta::milliseconds(50)), json!({"method": "test"}))
            .await?;

        sleep(Duration::from_millis(250)).await;
        assert_eq!(manager.pending_count().await, 0);

        let result = receiver.await.unwrap();
        assert!(matches!(&result, Err(CorrelationError::Timeout { id: got, .. }) if *got == id));

        manager.shutdown().await
    }

    #[tokio::test]
    async fn manual_cleanup_reaps_without_the_background_task() -> CorrelationResult<()> {
        let manager = CorrelationManager::new_without_cleanup(quiet_config()).await?;

        manager
            .register_request(Some(TimeDelta::milliseconds(1)), json!({"method": "test"}))
            .await?;
        sleep(Duration::from_millis(10)).await;

        assert_eq!(manager.cleanup_expired_requests().await, 1);
        assert_eq!(manager.pending_count().await, 0);
        Ok(())
    }

    #[tokio::test]
    async fn cancelling_a_request_resolves_it_as_cancelled() -> CorrelationResult<()> {
        let manager = CorrelationManager::new(quiet_config()).await?;

        let (id, receiver) = manager
            .register_request(Some(TimeDelta::seconds(30)), json!({"method": "test"}))
            .await?;
        manager.cancel_request(&id).await?;
        assert_eq!(manager.pending_count().await, 0);

        let result = receiver.await.unwrap();
        assert!(matches!(&result, Err(CorrelationError::Cancelled { id: got }) if *got == id));

        manager.shutdown().await
    }

    #[tokio::test]
    async fn concurrent_registrations_each_correlate_independently() -> CorrelationResult<()> {
        let manager = Arc::new(CorrelationManager::new(quiet_config()).await?);

        let handles: Vec<_> = (0..5)
            .map(|i| {
                let manager = Arc::clone(&manager);
                tokio::spawn(async move {
                    let (id, receiver) = manager
                        .register_request(Some(TimeDelta::seconds(30)), json!({"id": i}))
                        .await?;
                    sleep(Duration::from_millis(10)).await;
                    let response = json!({"result": format!("response_{i}")});
                    manager.correlate_response(&id, Ok(response.clone())).await?;
                    assert_eq!(receiver.await.unwrap()?, response);
                    CorrelationResult::Ok(())
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap()?;
        }
        assert_eq!(manager.pending_count().await, 0);

        Arc::try_unwrap(manager).unwrap().shutdown().await
    }

    #[tokio::test]
    async fn registration_past_capacity_is_rejected() -> CorrelationResult<()> {
        let config = CorrelationConfig {
            max_pending_requests: 2,
            ..quiet_config()
        };
        let manager = CorrelationManager::new(config).await?;

        let request_data = json!({"method": "test"});
        manager.register_request(Some(TimeDelta::seconds(30)), request_data.clone()).await?;
        manager.register_request(Some(TimeDelta::seconds(30)), request_data.clone()).await?;

        let result = manager.register_request(Some(TimeDelta::seconds(30)), request_data).await;
        assert!(matches!(
            &result,
            Err(CorrelationError::Internal { message }) if message.contains("maximum pending requests exceeded")
        ));

        manager.shutdown().await
    }

    #[tokio::test]
    async fn shutdown_cancels_everything_still_pending() -> CorrelationResult<()> {
        let manager = CorrelationManager::new(quiet_config()).await?;

        let request_data = json!({"method": "test"});
        let (_id1, receiver1) = manager
            .register_request(Some(TimeDelta::seconds(30)), request_data.clone())
            .await?;
        let (_id2, receiver2) = manager
            .register_request(Some(TimeDelta::seconds(30)), request_data)
            .await?;

        manager.shutdown().await?;

        assert!(matches!(receiver1.await.unwrap(), Err(CorrelationError::Cancelled { .. })));
        assert!(matches!(receiver2.await.unwrap(), Err(CorrelationError::Cancelled { .. })));
        Ok(())
    }
}
