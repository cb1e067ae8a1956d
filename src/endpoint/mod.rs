//! The client-side MCP session: handshake, request/response correlation,
//! and the high-level resource/tool/prompt/logging operations built on top.
//!
//! [`Endpoint`] is the component that turns a bare [`crate::transport::Transport`]
//! into a usable MCP session — it owns the `initialize` handshake, the
//! background reader task that classifies inbound frames and routes them to
//! [`crate::correlation::CorrelationManager`] or a [`handler::ServerRequestHandler`],
//! and the capability-gated operations a caller actually wants to invoke.

pub mod client;
pub mod error;
pub mod handler;
pub mod progress;

pub use client::{Endpoint, EndpointConfig, NotificationEvent, SessionState};
pub use error::{EndpointError, EndpointResult};
pub use handler::{HandlerResult, NullHandler, ServerRequestHandler};
pub use progress::{ProgressRegistry, ProgressUpdate};
