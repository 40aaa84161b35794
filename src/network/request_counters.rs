//! Request lifecycle counters
//!
//! Tracks request volume, disconnects, and the HTTP status-code histogram
//! for a single server. Updated from the host's lifecycle notifications and
//! read as consistent point-in-time snapshots.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::constants::status;

/// Point-in-time copy of the request counters
///
/// Produced by [`NetworkMonitor::requests`](crate::NetworkMonitor::requests).
/// `active_requests` reflects current in-flight state and survives a reset;
/// the other fields are historical and zeroed by it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestCounters {
    /// Requests observed since the last reset
    pub total: u64,
    /// Subset of `total` whose connection closed before a response completed
    pub disconnects: u64,
    /// Count per HTTP status code seen; absent codes are implicitly zero
    pub status_codes: HashMap<u16, u64>,
    /// Requests received but not yet responded to
    pub active_requests: u64,
}

/// Shared mutable tally behind the counters
///
/// All fields live under a single mutex so each lifecycle event is one
/// logical update and a snapshot can never observe a half-applied event.
/// Lock hold times are a few field increments; there are no await points
/// while the lock is held.
#[derive(Debug, Default)]
pub(crate) struct RequestTracker {
    state: Mutex<RequestCounters>,
}

impl RequestTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record an inbound request: bumps the total and the in-flight count
    pub(crate) fn record_received(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.total += 1;
            state.active_requests += 1;
        }
    }

    /// Record a completed response
    ///
    /// Responses without a status code (e.g. connection aborted before
    /// headers) are still counted in-flight-wise but leave the histogram
    /// untouched, as do codes outside the valid HTTP range.
    pub(crate) fn record_response(&self, status: Option<u16>) {
        if let Ok(mut state) = self.state.lock() {
            state.active_requests = state.active_requests.saturating_sub(1);

            match status {
                Some(code) if (status::MIN_CODE..=status::MAX_CODE).contains(&code) => {
                    *state.status_codes.entry(code).or_insert(0) += 1;
                }
                Some(code) => {
                    debug!(code, "status code outside histogram range, not counted");
                }
                None => {}
            }
        }
    }

    /// Record a client disconnect for one request
    ///
    /// Only reachable through [`RequestToken::disconnected`], which consumes
    /// the token, so this fires at most once per request.
    fn record_disconnect(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.disconnects += 1;
        }
    }

    /// Consistent copy of the current counters
    pub(crate) fn snapshot(&self) -> RequestCounters {
        self.state
            .lock()
            .map(|state| state.clone())
            .unwrap_or_default()
    }

    /// Zero the historical counters, preserving the in-flight count
    pub(crate) fn reset(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.total = 0;
            state.disconnects = 0;
            state.status_codes.clear();
        }
    }
}

/// Per-request disconnect notifier
///
/// Returned by [`NetworkMonitor::on_request_received`](crate::NetworkMonitor::on_request_received).
/// Consuming it with [`disconnected`](Self::disconnected) records the
/// disconnect; because the token moves, a request is counted as disconnected
/// at most once even when the host also reports a completed response for it.
/// Dropping the token without calling `disconnected` records nothing.
#[derive(Debug)]
pub struct RequestToken {
    tracker: Arc<RequestTracker>,
}

impl RequestToken {
    pub(crate) fn new(tracker: Arc<RequestTracker>) -> Self {
        Self { tracker }
    }

    /// Record that this request's connection closed before completion
    pub fn disconnected(self) {
        self.tracker.record_disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tracker_is_zeroed() {
        let tracker = RequestTracker::new();
        let counters = tracker.snapshot();

        assert_eq!(counters.total, 0);
        assert_eq!(counters.disconnects, 0);
        assert_eq!(counters.active_requests, 0);
        assert!(counters.status_codes.is_empty());
    }

    #[test]
    fn test_record_received_bumps_total_and_active() {
        let tracker = RequestTracker::new();

        tracker.record_received();
        tracker.record_received();

        let counters = tracker.snapshot();
        assert_eq!(counters.total, 2);
        assert_eq!(counters.active_requests, 2);
    }

    #[test]
    fn test_record_response_decrements_active() {
        let tracker = RequestTracker::new();

        tracker.record_received();
        tracker.record_response(Some(200));

        let counters = tracker.snapshot();
        assert_eq!(counters.total, 1);
        assert_eq!(counters.active_requests, 0);
        assert_eq!(counters.status_codes.get(&200), Some(&1));
    }

    #[test]
    fn test_response_without_status_skips_histogram() {
        let tracker = RequestTracker::new();

        tracker.record_received();
        tracker.record_response(None);

        let counters = tracker.snapshot();
        assert_eq!(counters.total, 1);
        assert!(counters.status_codes.is_empty());
    }

    #[test]
    fn test_out_of_range_status_skips_histogram() {
        let tracker = RequestTracker::new();

        tracker.record_received();
        tracker.record_received();
        tracker.record_response(Some(42));
        tracker.record_response(Some(9999));

        let counters = tracker.snapshot();
        assert_eq!(counters.total, 2);
        assert!(counters.status_codes.is_empty());
    }

    #[test]
    fn test_active_decrement_saturates() {
        let tracker = RequestTracker::new();

        // Response without a matching receive must not underflow
        tracker.record_response(Some(200));

        assert_eq!(tracker.snapshot().active_requests, 0);
    }

    #[test]
    fn test_token_counts_disconnect_once() {
        let tracker = Arc::new(RequestTracker::new());

        tracker.record_received();
        let token = RequestToken::new(Arc::clone(&tracker));
        token.disconnected();

        let counters = tracker.snapshot();
        assert_eq!(counters.disconnects, 1);
        assert!(counters.disconnects <= counters.total);
    }

    #[test]
    fn test_dropped_token_records_nothing() {
        let tracker = Arc::new(RequestTracker::new());

        tracker.record_received();
        let token = RequestToken::new(Arc::clone(&tracker));
        drop(token);

        assert_eq!(tracker.snapshot().disconnects, 0);
    }

    #[test]
    fn test_reset_preserves_active_requests() {
        let tracker = Arc::new(RequestTracker::new());

        tracker.record_received();
        tracker.record_received();
        tracker.record_received();
        tracker.record_response(Some(200));
        RequestToken::new(Arc::clone(&tracker)).disconnected();

        tracker.reset();

        let counters = tracker.snapshot();
        assert_eq!(counters.total, 0);
        assert_eq!(counters.disconnects, 0);
        assert!(counters.status_codes.is_empty());
        // Two requests are still in flight
        assert_eq!(counters.active_requests, 2);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let tracker = RequestTracker::new();

        tracker.record_received();
        tracker.reset();
        let first = tracker.snapshot();
        tracker.reset();
        let second = tracker.snapshot();

        assert_eq!(first, second);
    }
}
