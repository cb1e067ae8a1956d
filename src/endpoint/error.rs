//! Endpoint-level errors
//!
//! Sits above [`crate::transport::TransportError`], [`crate::protocol::ProtocolError`]
//! and [`crate::correlation::CorrelationError`] — the three things that can go
//! wrong below the handshake/request layer — and adds the handful of error
//! shapes that only make sense once a session exists (wrong state, server
//! said no, capability not negotiated).

use thiserror::Error;

use crate::correlation::CorrelationError;
use crate::protocol::ProtocolError;
use crate::transport::TransportError;

/// Errors from [`crate::endpoint::Endpoint`] operations.
#[derive(Debug, Error)]
pub enum EndpointError {
    /// The underlying transport failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A message failed to encode/decode, or violated the wire contract.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Request/response correlation failed (timeout, cancellation, capacity).
    #[error("correlation error: {0}")]
    Correlation(#[from] CorrelationError),

    /// The operation isn't valid in the endpoint's current session state,
    /// e.g. calling `initialize()` twice, or any request before it.
    #[error("endpoint is {state}, which does not permit this operation")]
    InvalidState {
        /// Human-readable description of the current state.
        state: String,
    },

    /// The negotiated server capabilities don't include the one this
    /// operation requires.
    #[error("server does not advertise capability: {0}")]
    UnsupportedCapability(String),

    /// The server returned a JSON-RPC error response.
    #[error("server error: {0}")]
    Server(String),

    /// The `initialize` handshake failed (bad response shape, incompatible
    /// protocol version, transport dropped mid-handshake).
    #[error("handshake failed: {0}")]
    HandshakeFailed(String),
}

/// Convenient result type for endpoint operations.
pub type EndpointResult<T> = Result<T, EndpointError>;

impl From<serde_json::Error> for EndpointError {
    fn from(err: serde_json::Error) -> Self {
        Self::Protocol(ProtocolError::from(err))
    }
}

impl EndpointError {
    /// Build an [`EndpointError::InvalidState`] describing the current state.
    pub fn invalid_state(state: impl Into<String>) -> Self {
        Self::InvalidState { state: state.into() }
    }

    /// Build an [`EndpointError::UnsupportedCapability`].
    pub fn unsupported_capability(name: impl Into<String>) -> Self {
        Self::UnsupportedCapability(name.into())
    }

    /// Build an [`EndpointError::Server`] from a JSON-RPC error payload.
    pub fn server(message: impl Into<String>) -> Self {
        Self::Server(message.into())
    }

    /// Build an [`EndpointError::HandshakeFailed`].
    pub fn handshake_failed(message: impl Into<String>) -> Self {
        Self::HandshakeFailed(message.into())
    }
}
