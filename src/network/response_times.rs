//! Response latency accumulator
//!
//! Keeps a running count, sum, and maximum of response latencies. Only the
//! derived average and maximum are exposed; with zero samples the summary is
//! `None` rather than zeros, since a zero would falsely imply an instant
//! response was observed.

use serde::Serialize;
use std::sync::Mutex;
use std::time::Duration;

/// Derived latency view in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResponseTimeSummary {
    /// Mean latency over the samples since the last reset
    pub avg: f64,
    /// Largest single latency since the last reset
    pub max: f64,
}

/// Running latency totals
#[derive(Debug, Default)]
struct ResponseTimeState {
    count: u64,
    total_ms: f64,
    max_ms: f64,
}

/// Accumulates one sample per completed response
///
/// The three fields move together under one mutex so a summary never mixes
/// the count of one sample set with the sum of another.
#[derive(Debug, Default)]
pub(crate) struct ResponseTimeAccumulator {
    state: Mutex<ResponseTimeState>,
}

impl ResponseTimeAccumulator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record one response latency
    pub(crate) fn record(&self, latency: Duration) {
        let ms = latency.as_secs_f64() * 1000.0;
        if let Ok(mut state) = self.state.lock() {
            state.count += 1;
            state.total_ms += ms;
            if ms > state.max_ms {
                state.max_ms = ms;
            }
        }
    }

    /// Average and maximum latency, or `None` before the first sample
    pub(crate) fn summary(&self) -> Option<ResponseTimeSummary> {
        let state = self.state.lock().ok()?;
        if state.count == 0 {
            return None;
        }
        Some(ResponseTimeSummary {
            avg: state.total_ms / state.count as f64,
            max: state.max_ms,
        })
    }

    /// Number of samples since the last reset
    #[cfg(test)]
    pub(crate) fn count(&self) -> u64 {
        self.state.lock().map(|state| state.count).unwrap_or(0)
    }

    /// Drop all samples
    pub(crate) fn reset(&self) {
        if let Ok(mut state) = self.state.lock() {
            *state = ResponseTimeState::default();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_samples_yields_none() {
        let acc = ResponseTimeAccumulator::new();
        assert_eq!(acc.summary(), None);
        assert_eq!(acc.count(), 0);
    }

    #[test]
    fn test_single_sample() {
        let acc = ResponseTimeAccumulator::new();
        acc.record(Duration::from_millis(8));

        let summary = acc.summary().unwrap();
        assert_eq!(summary.avg, 8.0);
        assert_eq!(summary.max, 8.0);
    }

    #[test]
    fn test_average_and_max_over_samples() {
        let acc = ResponseTimeAccumulator::new();
        acc.record(Duration::from_millis(10));
        acc.record(Duration::from_millis(20));
        acc.record(Duration::from_millis(60));

        let summary = acc.summary().unwrap();
        assert_eq!(summary.avg, 30.0);
        assert_eq!(summary.max, 60.0);
    }

    #[test]
    fn test_twenty_identical_samples() {
        let acc = ResponseTimeAccumulator::new();
        for _ in 0..20 {
            acc.record(Duration::from_millis(5));
        }

        let summary = acc.summary().unwrap();
        assert_eq!(acc.count(), 20);
        assert_eq!(summary.avg, 5.0);
        assert_eq!(summary.max, 5.0);
    }

    #[test]
    fn test_reset_drops_samples() {
        let acc = ResponseTimeAccumulator::new();
        acc.record(Duration::from_millis(100));
        acc.reset();

        assert_eq!(acc.summary(), None);
        assert_eq!(acc.count(), 0);
    }

    #[test]
    fn test_sub_millisecond_latency() {
        let acc = ResponseTimeAccumulator::new();
        acc.record(Duration::from_micros(250));

        let summary = acc.summary().unwrap();
        assert!(summary.avg > 0.0 && summary.avg < 1.0);
        assert_eq!(summary.avg, summary.max);
    }
}
