//! Failure modes for the correlation table.

use chrono::TimeDelta;
use thiserror::Error;

/// Re-exported here so callers can write `correlation::RequestId` without
/// reaching into `protocol` for a type that's really about correlating a
/// request with its eventual response.
pub type RequestId = crate::protocol::RequestId;

/// Why a pending request never resolved with a response.
#[derive(Debug, Clone, Error)]
pub enum CorrelationError {
    /// No response arrived before the request's deadline.
    #[error("request {id} timed out after {duration}")]
    Timeout {
        id: RequestId,
        duration: TimeDelta,
    },

    /// `correlate_response`/`cancel_request` referenced an id with no entry
    /// in the table — already resolved, or never registered.
    #[error("request {id} not found (already completed or cancelled)")]
    RequestNotFound { id: RequestId },

    /// The id was resolved a second time before this attempt ran.
    #[error("request {id} was already completed")]
    AlreadyCompleted { id: RequestId },

    /// The caller's `oneshot::Receiver` was dropped before a result could be
    /// delivered to it.
    #[error("channel for request {id} closed before delivery: {details}")]
    ChannelClosed { id: RequestId, details: String },

    /// The caller cancelled the request before it resolved.
    #[error("request {id} was cancelled")]
    Cancelled { id: RequestId },

    /// Anything else (capacity exceeded, task join failure).
    #[error("correlation error: {message}")]
    Internal { message: String },
}

/// `Result` alias used throughout the correlation table.
pub type CorrelationResult<T> = std::result::Result<T, CorrelationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_error_display_names_the_request() {
        let err = CorrelationError::Timeout {
            id: RequestId::new_string("req-1").unwrap(),
            duration: TimeDelta::seconds(5),
        };
        let display = err.to_string();
        assert!(display.contains("req-1"));
        assert!(display.contains("timed out"));
    }

    #[test]
    fn request_not_found_carries_the_offending_id() {
        let err = CorrelationError::RequestNotFound {
            id: RequestId::new_number(42).unwrap(),
        };
        assert!(format!("{err:?}").contains("42"));
    }

    #[test]
    fn result_alias_composes_with_question_mark() {
        fn fallible() -> CorrelationResult<i32> {
            Err(CorrelationError::Internal {
                message: "boom".into(),
            })
        }
        assert!(fallible().is_err());
    }
}
