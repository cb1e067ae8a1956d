//! Progress token bookkeeping for long-running requests
//!
//! A caller that wants progress updates attaches a [`ProgressToken`] to its
//! outgoing request (`JsonRpcRequest::with_progress_token`); the server
//! echoes that token on `notifications/progress` frames. This registry maps
//! a token back to a channel the caller is polling, the same
//! register-then-dispatch shape [`crate::correlation::CorrelationManager`]
//! uses for request/response correlation, just fire-and-forget instead of
//! single-shot.

use dashmap::DashMap;
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::protocol::RequestId;

/// One `notifications/progress` payload, after the server's `progressToken`
/// has been consumed to route it.
#[derive(Debug, Clone, Deserialize)]
pub struct ProgressUpdate {
    /// Work completed so far, in whatever unit the server chose.
    pub progress: f64,
    /// Total work, if the server knows it upfront.
    pub total: Option<f64>,
    /// Free-form status text.
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawProgressNotification {
    #[serde(rename = "progressToken")]
    progress_token: RequestId,
    progress: f64,
    total: Option<f64>,
    message: Option<String>,
}

/// Tracks live progress subscriptions by their token.
#[derive(Debug, Default)]
pub struct ProgressRegistry {
    subscribers: DashMap<RequestId, mpsc::Sender<ProgressUpdate>>,
}

impl ProgressRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to updates for `token`, returning the receiving half.
    /// Replaces any previous subscription for the same token.
    pub fn subscribe(&self, token: RequestId) -> mpsc::Receiver<ProgressUpdate> {
        let (tx, rx) = mpsc::channel(16);
        self.subscribers.insert(token, tx);
        rx
    }

    /// Drop a subscription, e.g. once the underlying request completes.
    pub fn unsubscribe(&self, token: &RequestId) {
        self.subscribers.remove(token);
    }

    /// Parse and route a `notifications/progress` payload. Silently drops
    /// updates for tokens nobody subscribed to (or whose receiver was
    /// dropped) — progress is best-effort, not a correctness requirement.
    pub fn dispatch(&self, params: serde_json::Value) {
        let Ok(raw) = serde_json::from_value::<RawProgressNotification>(params) else {
            return;
        };
        if let Some(sender) = self.subscribers.get(&raw.progress_token) {
            let _ = sender.try_send(ProgressUpdate {
                progress: raw.progress,
                total: raw.total,
                message: raw.message,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn dispatch_routes_to_subscriber() {
        let registry = ProgressRegistry::new();
        let token = RequestId::new_number(1).unwrap();
        let mut rx = registry.subscribe(token.clone());

        registry.dispatch(json!({
            "progressToken": 1,
            "progress": 50.0,
            "total": 100.0,
        }));

        let update = rx.recv().await.unwrap();
        assert_eq!(update.progress, 50.0);
        assert_eq!(update.total, Some(100.0));
    }

    #[test]
    fn dispatch_ignores_unknown_token() {
        let registry = ProgressRegistry::new();
        registry.dispatch(json!({"progressToken": 99, "progress": 1.0}));
    }
}
