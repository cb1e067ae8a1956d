//! The correlation table's entry type and id source.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, TimeDelta, Utc};
use serde_json::Value;
use tokio::sync::oneshot;

use crate::correlation::error::RequestId;
pub use crate::correlation::error::CorrelationResult;

/// One row of [`crate::correlation::CorrelationManager`]'s table: a request
/// that's been sent and is waiting on a response, a cancellation, or its
/// deadline.
#[derive(Debug)]
pub struct PendingRequest {
    /// Resolved exactly once, by whichever of response/cancel/timeout fires
    /// first.
    pub sender: oneshot::Sender<CorrelationResult<Value>>,
    pub created_at: DateTime<Utc>,
    pub timeout: TimeDelta,
    /// Kept for debugging/tracing context, not consulted by correlation
    /// logic itself.
    pub request_data: Value,
}

impl PendingRequest {
    pub fn new(
        sender: oneshot::Sender<CorrelationResult<Value>>,
        timeout: TimeDelta,
        request_data: Value,
    ) -> Self {
        Self {
            sender,
            created_at: Utc::now(),
            timeout,
            request_data,
        }
    }

    /// `true` once `timeout` has elapsed since registration.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(&Utc::now())
    }

    /// Same check against a caller-supplied timestamp, so a cleanup sweep
    /// over many entries takes one `Utc::now()` rather than one per entry.
    pub fn is_expired_at(&self, now: &DateTime<Utc>) -> bool {
        now.signed_duration_since(self.created_at) > self.timeout
    }

    /// Time left before `is_expired` flips, or `None` if it already has.
    pub fn time_remaining(&self) -> Option<TimeDelta> {
        let elapsed = Utc::now().signed_duration_since(self.created_at);
        (elapsed < self.timeout).then(|| self.timeout - elapsed)
    }
}

/// Hands out numeric [`RequestId`]s from a monotonic counter, so a single
/// connection never reuses an id for two different in-flight requests.
#[derive(Debug)]
pub struct RequestIdGenerator {
    counter: AtomicU64,
}

impl RequestIdGenerator {
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(1),
        }
    }

    /// Thread-safe; concurrent callers never observe the same value.
    pub fn next_id(&self) -> RequestId {
        let id = self.counter.fetch_add(1, Ordering::SeqCst);
        // Starts at 1 and only grows, so this is always non-negative short of
        // wrapping an i64 — `new_number`'s validation is for caller-supplied
        // ids, not this internally-guaranteed sequence.
        RequestId::Number(id as i64)
    }

    /// The value `next_id` would return next. Testing/debugging only.
    pub fn current_count(&self) -> u64 {
        self.counter.load(Ordering::SeqCst)
    }
}

impl Default for RequestIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    fn pending_with_timeout(timeout: TimeDelta) -> PendingRequest {
        let (sender, _receiver) = oneshot::channel();
        PendingRequest::new(sender, timeout, serde_json::json!({"method": "test"}))
    }

    #[test]
    fn fresh_pending_request_is_not_expired() {
        let pending = pending_with_timeout(TimeDelta::seconds(30));
        assert!(!pending.is_expired());
        assert!(pending.time_remaining().is_some());
    }

    #[test]
    fn pending_request_expires_after_its_timeout() {
        let pending = pending_with_timeout(TimeDelta::milliseconds(1));
        thread::sleep(std::time::Duration::from_millis(10));
        assert!(pending.is_expired());
        assert!(pending.time_remaining().is_none());
    }

    #[test]
    fn is_expired_at_matches_is_expired_for_the_same_instant() {
        let pending = pending_with_timeout(TimeDelta::milliseconds(1));
        thread::sleep(std::time::Duration::from_millis(10));
        assert_eq!(pending.is_expired(), pending.is_expired_at(&Utc::now()));
    }

    #[test]
    fn generator_never_repeats_an_id() {
        let generator = RequestIdGenerator::new();
        let ids: Vec<_> = (0..3).map(|_| generator.next_id()).collect();
        assert_ne!(ids[0], ids[1]);
        assert_ne!(ids[1], ids[2]);
        assert_ne!(ids[0], ids[2]);
    }

    #[test]
    fn generator_counter_tracks_the_next_id() {
        let generator = RequestIdGenerator::new();
        assert_eq!(generator.current_count(), 1);
        generator.next_id();
        assert_eq!(generator.current_count(), 2);
    }

    #[test]
    fn generator_is_unique_across_threads() {
        let generator = Arc::new(RequestIdGenerator::new());
        let handles: Vec<_> = (0..5)
            .map(|_| {
                let generator = Arc::clone(&generator);
                thread::spawn(move || (0..10).map(|_| generator.next_id()).collect::<Vec<_>>())
            })
            .collect();

        let all_ids: HashSet<_> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        assert_eq!(all_ids.len(), 50);
    }
}
