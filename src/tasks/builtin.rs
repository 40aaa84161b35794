//! Built-in metric producers
//!
//! The standard task set covers the host machine, the current process, and
//! the network monitor's counters. OS and process readings come from
//! `sysinfo`; the sampler refreshes only what each task needs.
//!
//! Task names are short and stable, since they become snapshot keys:
//! `osload`, `osmem`, `osup`, `psup`, `psmem`, `pscpu`, `psdelay`,
//! `requests`, `concurrents`, `responseTimes`, `sockets`.

use anyhow::{Context, anyhow};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use sysinfo::{MemoryRefreshKind, ProcessRefreshKind, ProcessesToUpdate, RefreshKind, System};
use tokio::time::Instant;

use super::TaskRegistry;
use crate::constants::delay;
use crate::network::NetworkMonitor;

/// OS and process reader over a shared `sysinfo` handle
///
/// Refreshing mutates the handle, so producers share one sampler behind a
/// mutex. Readings are quick; the lock is never held across an await.
struct SystemSampler {
    system: System,
    pid: sysinfo::Pid,
}

impl SystemSampler {
    fn new() -> anyhow::Result<Self> {
        let pid = sysinfo::get_current_pid()
            .map_err(|e| anyhow!("failed to resolve current pid: {e}"))?;
        let mut system = System::new_with_specifics(
            RefreshKind::nothing()
                .with_memory(MemoryRefreshKind::everything())
                .with_processes(ProcessRefreshKind::everything()),
        );
        // Prime the process table; CPU usage needs a baseline sample
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
        Ok(Self { system, pid })
    }

    /// Host memory `{total, free}` in bytes
    fn host_memory(&mut self) -> Value {
        self.system.refresh_memory();
        json!({
            "total": self.system.total_memory(),
            "free": self.system.free_memory(),
        })
    }

    fn refresh_own_process(&mut self) -> anyhow::Result<&sysinfo::Process> {
        self.system
            .refresh_processes(ProcessesToUpdate::Some(&[self.pid]), true);
        self.system
            .process(self.pid)
            .ok_or_else(|| anyhow!("own process {} missing from process table", self.pid))
    }

    /// Process memory `{rss, virtual}` in bytes
    fn process_memory(&mut self) -> anyhow::Result<Value> {
        let process = self.refresh_own_process()?;
        Ok(json!({
            "rss": process.memory(),
            "virtual": process.virtual_memory(),
        }))
    }

    /// Process CPU usage percent
    ///
    /// First reading may be zero; `sysinfo` needs two samples for a rate.
    fn process_cpu(&mut self) -> anyhow::Result<Value> {
        let process = self.refresh_own_process()?;
        Ok(json!({ "percent": process.cpu_usage() }))
    }

    /// Seconds since the process started
    fn process_uptime(&mut self) -> anyhow::Result<Value> {
        let process = self.refresh_own_process()?;
        Ok(json!(process.run_time()))
    }
}

/// Measure timer-wheel lag by overshooting a short probe sleep
///
/// The runtime analog of an event-loop delay probe: ask for a fixed sleep
/// and report how far past the deadline the wakeup landed, in milliseconds.
async fn event_loop_delay() -> Value {
    let started = Instant::now();
    tokio::time::sleep(delay::PROBE).await;
    let lag = started.elapsed().saturating_sub(delay::PROBE);
    json!(lag.as_secs_f64() * 1000.0)
}

/// Seed a registry with the standard task set for one server
///
/// Fails if any standard name is already taken or the current process
/// cannot be resolved for sampling.
pub fn register_builtin_tasks(
    registry: &mut TaskRegistry,
    monitor: &NetworkMonitor,
) -> anyhow::Result<()> {
    let sampler = Arc::new(Mutex::new(
        SystemSampler::new().context("creating system sampler")?,
    ));

    registry.register("osload", || async {
        let load = System::load_average();
        Ok(json!([load.one, load.five, load.fifteen]))
    })?;

    let mem_sampler = Arc::clone(&sampler);
    registry.register("osmem", move || {
        let sampler = Arc::clone(&mem_sampler);
        async move { with_sampler(&sampler, |s| Ok(s.host_memory())) }
    })?;

    registry.register("osup", || async { Ok(json!(System::uptime())) })?;

    let uptime_sampler = Arc::clone(&sampler);
    registry.register("psup", move || {
        let sampler = Arc::clone(&uptime_sampler);
        async move { with_sampler(&sampler, SystemSampler::process_uptime) }
    })?;

    let psmem_sampler = Arc::clone(&sampler);
    registry.register("psmem", move || {
        let sampler = Arc::clone(&psmem_sampler);
        async move { with_sampler(&sampler, SystemSampler::process_memory) }
    })?;

    let pscpu_sampler = Arc::clone(&sampler);
    registry.register("pscpu", move || {
        let sampler = Arc::clone(&pscpu_sampler);
        async move { with_sampler(&sampler, SystemSampler::process_cpu) }
    })?;

    registry.register("psdelay", || async { Ok(event_loop_delay().await) })?;

    let requests_monitor = monitor.clone();
    registry.register("requests", move || {
        let counters = requests_monitor.requests();
        async move { serde_json::to_value(counters).map_err(Into::into) }
    })?;

    let concurrents_monitor = monitor.clone();
    registry.register("concurrents", move || {
        let active = concurrents_monitor.requests().active_requests;
        async move { Ok(json!(active)) }
    })?;

    let times_monitor = monitor.clone();
    registry.register("responseTimes", move || {
        let summary = times_monitor.response_times();
        async move { serde_json::to_value(summary).map_err(Into::into) }
    })?;

    let sockets_monitor = monitor.clone();
    registry.register("sockets", move || {
        let snapshot = sockets_monitor.sockets();
        async move { serde_json::to_value(snapshot).map_err(Into::into) }
    })?;

    Ok(())
}

fn with_sampler<F>(sampler: &Mutex<SystemSampler>, read: F) -> anyhow::Result<Value>
where
    F: FnOnce(&mut SystemSampler) -> anyhow::Result<Value>,
{
    let mut guard = sampler
        .lock()
        .map_err(|_| anyhow!("system sampler lock poisoned"))?;
    read(&mut guard)
}
