//! Network activity monitoring for a single server instance
//!
//! [`NetworkMonitor`] is the stateful half of the ops monitor: the host
//! server calls its two notification points from the request lifecycle and
//! the scheduler (or anything else) reads the accumulated counters back out.
//! The monitor is `Clone` and cheap to share; clones observe the same
//! underlying counters.
//!
//! The notification contract is deliberately narrow so any host can drive it
//! directly, without adapting to a particular event-emission mechanism:
//!
//! - [`on_request_received`](NetworkMonitor::on_request_received) once per
//!   inbound request, before routing;
//! - [`on_response_sent`](NetworkMonitor::on_response_sent) once per request
//!   reaching completion, normal or not;
//! - [`RequestToken::disconnected`] when a request's connection closes early.

mod request_counters;
mod response_times;
mod sockets;

pub use request_counters::{RequestCounters, RequestToken};
pub use response_times::ResponseTimeSummary;
pub use sockets::{ConnectionPool, ConnectionPoolSnapshot, SocketCount};

use request_counters::RequestTracker;
use response_times::ResponseTimeAccumulator;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Request, latency, and socket observation for one server
#[derive(Clone)]
pub struct NetworkMonitor {
    requests: Arc<RequestTracker>,
    response_times: Arc<ResponseTimeAccumulator>,
    plain_pools: Arc<[Arc<dyn ConnectionPool>]>,
    secure_pools: Arc<[Arc<dyn ConnectionPool>]>,
}

impl NetworkMonitor {
    /// Monitor with no outbound pools configured
    ///
    /// `sockets()` will report empty counts for both schemes.
    #[must_use]
    pub fn new() -> Self {
        Self::with_pools(Vec::new(), Vec::new())
    }

    /// Monitor over the given outbound pools, split by transport scheme
    #[must_use]
    pub fn with_pools(
        plain: Vec<Arc<dyn ConnectionPool>>,
        secure: Vec<Arc<dyn ConnectionPool>>,
    ) -> Self {
        Self {
            requests: Arc::new(RequestTracker::new()),
            response_times: Arc::new(ResponseTimeAccumulator::new()),
            plain_pools: plain.into(),
            secure_pools: secure.into(),
        }
    }

    /// Notify the monitor of one inbound request
    ///
    /// Call exactly once per request, before routing. The returned token
    /// belongs to this request; consume it with
    /// [`RequestToken::disconnected`] if the connection dies before the
    /// response completes, or drop it on normal completion.
    pub fn on_request_received(&self) -> RequestToken {
        self.requests.record_received();
        RequestToken::new(Arc::clone(&self.requests))
    }

    /// Notify the monitor of one completed response
    ///
    /// Call exactly once per request reaching completion, including abnormal
    /// completion where no status code exists.
    pub fn on_response_sent(&self, latency: Duration, status: Option<u16>) {
        self.response_times.record(latency);
        self.requests.record_response(status);
    }

    /// Current request counters as a consistent copy
    #[must_use]
    pub fn requests(&self) -> RequestCounters {
        self.requests.snapshot()
    }

    /// Average and maximum response latency, `None` before the first sample
    #[must_use]
    pub fn response_times(&self) -> Option<ResponseTimeSummary> {
        self.response_times.summary()
    }

    /// Occupancy of the configured outbound pools, computed on demand
    #[must_use]
    pub fn sockets(&self) -> ConnectionPoolSnapshot {
        ConnectionPoolSnapshot::inspect(&self.plain_pools, &self.secure_pools)
    }

    /// Zero the historical counters
    ///
    /// The request total, disconnects, status-code histogram, and latency
    /// samples are cleared. The in-flight request count is current state,
    /// not history, and carries through unchanged.
    pub fn reset(&self) {
        self.requests.reset();
        self.response_times.reset();
        debug!("network counters reset");
    }
}

impl Default for NetworkMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for NetworkMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkMonitor")
            .field("requests", &self.requests)
            .field("response_times", &self.response_times)
            .field("plain_pools", &self.plain_pools.len())
            .field("secure_pools", &self.secure_pools.len())
            .finish()
    }
}
