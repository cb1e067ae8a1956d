//! JSON-RPC 2.0 wire layer and MCP message types
//!
//! - [`message`]: the JSON-RPC envelope (`JsonRpcRequest`/`Response`/`Notification`)
//!   and the validated [`message::RequestId`].
//! - [`types`]: MCP-specific payload types (capabilities, content, handshake).
//! - [`errors`]: `ProtocolError` and the JSON-RPC error-object type.
//! - [`constants`]: method-name and error-code registries.
//!
//! The transport contract itself (start/stop/send/messages stream) lives in
//! [`crate::transport`], not here — this module only owns the wire format.

pub mod constants;
pub mod errors;
pub mod message;
pub mod types;

pub use constants::*;
pub use errors::*;
pub use message::*;
pub use types::*;
