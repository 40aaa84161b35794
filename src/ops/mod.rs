//! Periodic ops scheduler
//!
//! [`OpsScheduler`] drives a repeating timer. Each tick it runs every
//! registered task concurrently, merges the results into one snapshot keyed
//! by task name plus the reserved `host` field, and broadcasts either the
//! snapshot or the tick's first error. One failing tick never stops the
//! scheduler; the next tick proceeds on schedule.
//!
//! Ticks are strictly sequential. A tick that overruns the interval delays
//! the next tick instead of piling up a backlog, and stopping the scheduler
//! discards the result of any tick still in flight.

use futures::future::join_all;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::constants::ops::{EVENT_CHANNEL_CAPACITY, HOST_KEY};
use crate::error::{RegistryError, SchedulerError};
use crate::network::NetworkMonitor;
use crate::tasks::{TaskRegistry, register_builtin_tasks};

/// Merged record of all task results for one tick
pub type OpsSnapshot = serde_json::Map<String, serde_json::Value>;

/// One publication from the scheduler
#[derive(Debug, Clone)]
pub enum OpsEvent {
    /// Every task succeeded; one complete snapshot for this tick
    Snapshot(Arc<OpsSnapshot>),
    /// At least one task failed; the first failure in registration order
    Error(Arc<anyhow::Error>),
}

struct SchedulerInner {
    host: String,
    registry: Mutex<TaskRegistry>,
    events: broadcast::Sender<OpsEvent>,
    /// Cleared by `stop` before the tick loop is aborted; publication
    /// re-checks it so an in-flight tick's result is discarded
    running: AtomicBool,
    /// Serializes publication against `stop`, closing the window between
    /// the running check and the send
    publish: Mutex<()>,
    loop_handle: Mutex<Option<JoinHandle<()>>>,
}

/// Periodic runner over a task registry, one snapshot or error per tick
///
/// Cheap to clone; clones control the same scheduler. Dropping the last
/// clone aborts a running tick loop.
#[derive(Clone)]
pub struct OpsScheduler {
    inner: Arc<SchedulerInner>,
}

impl OpsScheduler {
    /// Scheduler with an empty task registry
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(SchedulerInner {
                host: host.into(),
                registry: Mutex::new(TaskRegistry::new()),
                events,
                running: AtomicBool::new(false),
                publish: Mutex::new(()),
                loop_handle: Mutex::new(None),
            }),
        }
    }

    /// Scheduler pre-seeded with the built-in task set for one server
    pub fn for_server(host: impl Into<String>, monitor: &NetworkMonitor) -> anyhow::Result<Self> {
        let scheduler = Self::new(host);
        {
            let mut registry = scheduler
                .inner
                .registry
                .lock()
                .map_err(|_| anyhow::anyhow!("task registry lock poisoned"))?;
            register_builtin_tasks(&mut registry, monitor)?;
        }
        Ok(scheduler)
    }

    /// Server identity published under the reserved `host` key
    #[must_use]
    pub fn host(&self) -> &str {
        &self.inner.host
    }

    /// Register a task; only allowed while stopped
    ///
    /// Mutating the registry under a live tick loop is refused rather than
    /// raced: stop, register, start again.
    pub fn register<F, Fut>(&self, name: impl Into<String>, producer: F) -> Result<(), RegistryError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = crate::tasks::TaskResult> + Send + 'static,
    {
        if self.is_running() {
            return Err(RegistryError::SchedulerRunning);
        }
        let mut registry = self
            .inner
            .registry
            .lock()
            .map_err(|_| RegistryError::SchedulerRunning)?;
        registry.register(name, producer)
    }

    /// Subscribe to ops and error events
    ///
    /// Broadcast semantics: a consumer that falls far behind misses events
    /// rather than stalling the scheduler.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<OpsEvent> {
        self.inner.events.subscribe()
    }

    /// Whether the tick loop is armed
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner
            .loop_handle
            .lock()
            .map(|handle| handle.is_some())
            .unwrap_or(false)
    }

    /// Arm the repeating timer; stopped → running
    ///
    /// The first tick fires one full `interval` after this call. Calling
    /// `start` while already running is a no-op and keeps the original
    /// interval, so timers never overlap.
    pub fn start(&self, interval: Duration) -> Result<(), SchedulerError> {
        if interval.is_zero() {
            return Err(SchedulerError::InvalidInterval);
        }

        let Ok(mut handle) = self.inner.loop_handle.lock() else {
            return Ok(());
        };
        if handle.is_some() {
            debug!("scheduler already running, start is a no-op");
            return Ok(());
        }

        self.inner.running.store(true, Ordering::Release);
        // The loop holds a weak reference so an abandoned scheduler can
        // actually drop; the Drop impl then aborts the loop promptly.
        let inner = Arc::downgrade(&self.inner);
        *handle = Some(tokio::spawn(run_loop(inner, interval)));
        info!(
            host = %self.inner.host,
            interval_ms = interval.as_millis() as u64,
            "ops scheduler started"
        );
        Ok(())
    }

    /// Disarm the timer; running → stopped, idempotent
    ///
    /// Safe to call from anywhere, including an event consumer. No event is
    /// delivered after this returns: a tick currently in flight has its
    /// publication suppressed.
    pub fn stop(&self) {
        // Taking the publish lock first means any tick past its running
        // check finishes sending before we flip the flag; every later tick
        // observes the flag and stays silent.
        let _publish = self.inner.publish.lock();
        self.inner.running.store(false, Ordering::Release);

        let handle = self
            .inner
            .loop_handle
            .lock()
            .ok()
            .and_then(|mut guard| guard.take());
        if let Some(handle) = handle {
            handle.abort();
            info!(host = %self.inner.host, "ops scheduler stopped");
        }
    }
}

impl Drop for SchedulerInner {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.loop_handle.lock() {
            if let Some(handle) = guard.take() {
                handle.abort();
            }
        }
    }
}

impl std::fmt::Debug for OpsScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpsScheduler")
            .field("host", &self.inner.host)
            .field("running", &self.is_running())
            .finish()
    }
}

/// The tick loop: wait, run all tasks, publish, repeat
async fn run_loop(inner: std::sync::Weak<SchedulerInner>, interval: Duration) {
    let mut ticker = time::interval(interval);
    // An overrunning tick delays the next one; no backlog of missed ticks
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // interval's first tick completes immediately; swallow it so the first
    // snapshot lands one full period after start
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let Some(inner) = inner.upgrade() else {
            return;
        };
        let event = run_tick(&inner).await;

        if let Ok(_publish) = inner.publish.lock() {
            if inner.running.load(Ordering::Acquire) {
                // A send error only means no subscribers right now
                let _ = inner.events.send(event);
            }
        };
    }
}

/// Run every registered task concurrently and merge the results
async fn run_tick(inner: &SchedulerInner) -> OpsEvent {
    let launched = match inner.registry.lock() {
        Ok(registry) => registry.launch_all(),
        Err(_) => Vec::new(),
    };

    let (names, futures): (Vec<_>, Vec<_>) = launched.into_iter().unzip();
    let results = join_all(futures).await;

    let mut snapshot = OpsSnapshot::new();
    for (name, result) in names.into_iter().zip(results) {
        match result {
            Ok(value) => {
                snapshot.insert(name, value);
            }
            Err(error) => {
                // First failure in registration order wins the tick
                warn!(task = %name, error = %error, "ops task failed");
                return OpsEvent::Error(Arc::new(error));
            }
        }
    }

    snapshot.insert(HOST_KEY.to_string(), json!(inner.host));
    debug!(tasks = snapshot.len() - 1, "ops snapshot assembled");
    OpsEvent::Snapshot(Arc::new(snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_scheduler_is_stopped() {
        let scheduler = OpsScheduler::new("web-1");
        assert!(!scheduler.is_running());
        assert_eq!(scheduler.host(), "web-1");
    }

    #[tokio::test]
    async fn test_zero_interval_rejected() {
        let scheduler = OpsScheduler::new("web-1");
        assert_eq!(
            scheduler.start(Duration::ZERO),
            Err(SchedulerError::InvalidInterval)
        );
        assert!(!scheduler.is_running());
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let scheduler = OpsScheduler::new("web-1");
        scheduler.start(Duration::from_millis(100)).unwrap();
        scheduler.start(Duration::from_millis(5)).unwrap();
        assert!(scheduler.is_running());
        scheduler.stop();
    }

    #[tokio::test]
    async fn test_stop_is_idempotent_from_any_state() {
        let scheduler = OpsScheduler::new("web-1");
        scheduler.stop();
        scheduler.start(Duration::from_millis(100)).unwrap();
        scheduler.stop();
        scheduler.stop();
        assert!(!scheduler.is_running());
    }

    #[tokio::test]
    async fn test_register_refused_while_running() {
        let scheduler = OpsScheduler::new("web-1");
        scheduler.start(Duration::from_millis(100)).unwrap();

        let err = scheduler
            .register("late", || async { Ok(json!(1)) })
            .unwrap_err();
        assert_eq!(err, RegistryError::SchedulerRunning);

        scheduler.stop();
        scheduler.register("late", || async { Ok(json!(1)) }).unwrap();
    }

    #[tokio::test]
    async fn test_reserved_host_key_rejected_through_scheduler() {
        let scheduler = OpsScheduler::new("web-1");
        let err = scheduler
            .register("host", || async { Ok(json!("x")) })
            .unwrap_err();
        assert_eq!(err, RegistryError::ReservedName("host".to_string()));
    }
}
