//! Outbound connection-pool inspection
//!
//! A server typically keeps pools of reusable outbound sockets, grouped by
//! destination and split by transport scheme (plain TCP vs TLS). The monitor
//! only reads pool occupancy; it never checks sockets out or mutates pool
//! state. Pools are external: anything that can report its open sockets per
//! destination key implements [`ConnectionPool`].

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Read-only view over one outbound connection pool
pub trait ConnectionPool: Send + Sync {
    /// Open-socket count per destination key
    ///
    /// An empty map is a valid answer for an idle pool, not an error.
    fn open_sockets_by_key(&self) -> HashMap<String, u64>;
}

/// Open-socket counts for one transport scheme
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SocketCount {
    /// Per-destination counts, summed across the scheme's pools
    #[serde(flatten)]
    pub by_key: HashMap<String, u64>,
    /// Sum over all keys
    pub total: u64,
}

impl SocketCount {
    /// Aggregate a set of pools into per-key counts and a total
    fn gather(pools: &[Arc<dyn ConnectionPool>]) -> Self {
        let mut result = Self::default();
        for pool in pools {
            for (key, count) in pool.open_sockets_by_key() {
                *result.by_key.entry(key).or_insert(0) += count;
                result.total += count;
            }
        }
        result
    }
}

/// Occupancy of the configured outbound pools, split by scheme
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConnectionPoolSnapshot {
    /// Plain-transport pools
    pub plain: SocketCount,
    /// TLS-transport pools
    pub secure: SocketCount,
}

impl ConnectionPoolSnapshot {
    /// Inspect the given pools right now; nothing is cached
    pub(crate) fn inspect(
        plain: &[Arc<dyn ConnectionPool>],
        secure: &[Arc<dyn ConnectionPool>],
    ) -> Self {
        Self {
            plain: SocketCount::gather(plain),
            secure: SocketCount::gather(secure),
        }
    }
}
