//! In-process operational metrics for a running network server
//!
//! `opsmon` watches one server's request lifecycle and periodically publishes
//! a merged snapshot of everything worth graphing: request volume,
//! disconnects, a status-code histogram, response-time average/max, outbound
//! connection-pool occupancy, and OS/process readings.
//!
//! Two pieces do the real work:
//!
//! - [`NetworkMonitor`] — event-driven counters the host feeds from its
//!   request lifecycle, readable (and resettable) at any time;
//! - [`OpsScheduler`] — a repeating timer that runs every registered task
//!   concurrently each tick and broadcasts one [`OpsEvent`] per tick: a
//!   complete snapshot, or the tick's first error. A failed tick never stops
//!   the scheduler.
//!
//! ```no_run
//! use opsmon::{NetworkMonitor, OpsEvent, OpsScheduler};
//! use std::time::Duration;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let monitor = NetworkMonitor::new();
//! let scheduler = OpsScheduler::for_server("web-1", &monitor)?;
//! let mut events = scheduler.subscribe();
//! scheduler.start(Duration::from_secs(15))?;
//!
//! // In the request path:
//! let token = monitor.on_request_received();
//! // ... handle the request ...
//! monitor.on_response_sent(Duration::from_millis(12), Some(200));
//! drop(token); // or token.disconnected() if the client went away
//!
//! while let Ok(event) = events.recv().await {
//!     match event {
//!         OpsEvent::Snapshot(snapshot) => println!("{:?}", snapshot),
//!         OpsEvent::Error(error) => eprintln!("tick failed: {error}"),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod network;
pub mod ops;
pub mod tasks;

pub use config::{OpsConfig, load_config};
pub use error::{RegistryError, SchedulerError};
pub use network::{
    ConnectionPool, ConnectionPoolSnapshot, NetworkMonitor, RequestCounters, RequestToken,
    ResponseTimeSummary, SocketCount,
};
pub use ops::{OpsEvent, OpsScheduler, OpsSnapshot};
pub use tasks::{TaskRegistry, TaskResult, register_builtin_tasks};
