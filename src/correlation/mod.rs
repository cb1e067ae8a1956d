//! Request/response correlation for a bidirectional JSON-RPC connection.
//!
//! A transport only moves bytes; it has no notion of which inbound response
//! belongs to which outbound request. [`CorrelationManager`] closes that gap:
//! every outbound request is registered under a fresh [`RequestId`] and handed
//! a `oneshot` receiver, the reader task resolves that receiver once a
//! matching response arrives, and a background task reaps anything left
//! pending past its deadline.
//!
//! - `error.rs` — [`CorrelationError`] and the [`CorrelationResult`] alias.
//! - `types.rs` — [`types::PendingRequest`] (one entry in the correlation table)
//!   and [`types::RequestIdGenerator`] (the manager's internal id source).
//! - `manager.rs` — [`CorrelationManager`] itself.
//!
//! ```rust
//! use mcp_client::correlation::{CorrelationManager, CorrelationConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = CorrelationManager::new(CorrelationConfig::default()).await?;
//!
//! let (id, receiver) = manager
//!     .register_request(None, serde_json::json!({"method": "ping"}))
//!     .await?;
//!
//! // The reader task calls this once a matching response frame decodes.
//! manager.correlate_response(&id, Ok(serde_json::json!({"result": "pong"}))).await?;
//!
//! assert_eq!(receiver.await??, serde_json::json!({"result": "pong"}));
//! manager.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod manager;
pub mod types;

pub use error::{CorrelationError, CorrelationResult, RequestId};
pub use manager::{CorrelationConfig, CorrelationManager};
pub use types::{PendingRequest, RequestIdGenerator};
