//! Transport abstraction: the pull-style contract every wire carrier satisfies
//!
//! A [`Transport`] owns exactly one underlying connection (a child process's
//! stdio pipes, an SSE session) and exposes four operations: `start`/`stop`
//! for lifecycle, `send` for outbound bytes, and `messages` for a
//! restartable stream of inbound bytes. [`TransportState`] is observable
//! independently of any in-flight call, so the endpoint (`crate::endpoint`)
//! can react to a transport dying without having a request in flight at the
//! time.
//!
//! This single contract covers both transports this crate ships —
//! [`stdio::StdioTransport`] (spawns a child process) and
//! [`sse::SseTransport`] (an HTTP+SSE session) — rather than specializing the
//! trait per transport the way the two transport traits it replaces did.

pub mod error;
pub mod sse;
pub mod stdio;

pub use error::TransportError;

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use tokio::sync::watch;

/// Observable connectivity state of a [`Transport`].
///
/// Distinct from the endpoint's session state (`crate::endpoint::SessionState`):
/// a transport can be `Connected` while the MCP handshake hasn't happened yet,
/// and a transport going `Disconnected` doesn't by itself mean the endpoint
/// gives up — capability-gated retry policy decides that.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    /// Never started, or fully stopped.
    Idle,
    /// `start()` is in flight.
    Connecting,
    /// Ready to send and receive.
    Connected,
    /// The underlying connection dropped unexpectedly.
    Disconnected,
    /// Stopped deliberately via `stop()`.
    Stopped,
}

/// A stream of inbound message frames, or a transport-level error if the
/// connection died mid-stream.
pub type MessageStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// The contract a wire carrier must satisfy to back an [`crate::endpoint::Endpoint`].
///
/// # Restart semantics
///
/// Calling `start()` again after `stop()` (or after the transport moved to
/// `Disconnected` on its own) must re-establish a fresh connection and a
/// fresh `messages()` stream — this is what lets the endpoint's reconnect
/// policy (§4.6) recover a dropped stdio child or SSE session without
/// constructing a brand new `Transport` value. Calling `start()` while
/// already `Connected` is a no-op: it returns `Ok(())` without restarting
/// the connection.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Establish the underlying connection. No-op if already connected.
    async fn start(&mut self) -> Result<(), TransportError>;

    /// Tear down the connection. Idempotent — calling `stop()` on an
    /// already-stopped transport succeeds without error.
    async fn stop(&mut self) -> Result<(), TransportError>;

    /// Send one framed message. `timeout` bounds the write, not any reply —
    /// replies arrive asynchronously via `messages()`. `None` waits
    /// indefinitely for the underlying write to complete.
    async fn send(&mut self, message: Bytes, timeout: Option<Duration>) -> Result<(), TransportError>;

    /// A stream of inbound message frames. Each call to `start()` produces a
    /// stream that is valid until the next `stop()`/disconnect; callers
    /// should re-acquire it after a reconnect.
    fn messages(&mut self) -> MessageStream;

    /// The current connectivity state.
    fn state(&self) -> TransportState;

    /// Subscribe to state transitions without polling `state()`.
    fn state_changes(&self) -> watch::Receiver<TransportState>;

    /// Transport kind identifier, for logging (`"stdio"`, `"sse"`).
    fn transport_type(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_state_equality() {
        assert_eq!(TransportState::Idle, TransportState::Idle);
        assert_ne!(TransportState::Idle, TransportState::Connected);
    }
}
