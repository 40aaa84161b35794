//! Constants used throughout the ops monitor
//!
//! This module centralizes magic numbers and reserved names
//! to improve maintainability and reduce duplication.

use std::time::Duration;

/// Scheduler and snapshot constants
pub mod ops {
    use super::Duration;

    /// Reserved snapshot key carrying the server identity.
    /// Tasks may not be registered under this name.
    pub const HOST_KEY: &str = "host";

    /// Default publication interval when none is configured
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(15);

    /// Capacity of the broadcast channel carrying ops/error events.
    /// A consumer that falls further behind than this misses events.
    pub const EVENT_CHANNEL_CAPACITY: usize = 16;
}

/// HTTP status-code histogram bounds
///
/// Codes outside this range are still counted toward the request total
/// but are kept out of the histogram, so a misbehaving handler cannot
/// grow the map without bound.
pub mod status {
    /// Lowest status code admitted to the histogram
    pub const MIN_CODE: u16 = 100;

    /// Highest status code admitted to the histogram
    pub const MAX_CODE: u16 = 599;
}

/// Event-loop delay sampling
pub mod delay {
    use super::Duration;

    /// Probe timer duration; the reported delay is how far past this
    /// deadline the runtime actually woke us up.
    pub const PROBE: Duration = Duration::from_millis(10);
}
