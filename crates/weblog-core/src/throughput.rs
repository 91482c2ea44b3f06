//! Wall-clock throughput meter.
//!
//! Counts processed messages and hands back the count once per reporting
//! interval, resetting to zero each time. Nothing is persisted; a restart
//! starts a fresh window.

use std::fmt;
use std::time::{Duration, Instant};

/// Default reporting window.
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(60);

/// Count emitted at a reporting boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThroughputReport {
    pub count: u64,
    pub window: Duration,
}

impl fmt::Display for ThroughputReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.window == Duration::from_secs(60) {
            write!(f, "Throughput: {} records/min", self.count)
        } else {
            write!(f, "Throughput: {} records/{}s", self.count, self.window.as_secs())
        }
    }
}

#[derive(Debug)]
pub struct ThroughputMeter {
    interval: Duration,
    count: u64,
    last_report: Instant,
}

impl ThroughputMeter {
    /// Start a meter whose first window opens at `now`.
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            count: 0,
            last_report: now,
        }
    }

    /// Open a fresh window at `now`, keeping any pending count.
    pub fn restart(&mut self, now: Instant) {
        self.last_report = now;
    }

    pub fn record_processed(&mut self) {
        self.count += 1;
    }

    /// Count accumulated since the last report.
    pub fn pending(&self) -> u64 {
        self.count
    }

    /// Emit and reset the counter once `now - last_report >= interval`.
    pub fn maybe_report(&mut self, now: Instant) -> Option<ThroughputReport> {
        if now.saturating_duration_since(self.last_report) < self.interval {
            return None;
        }
        let count = std::mem::take(&mut self.count);
        self.last_report = now;
        Some(ThroughputReport {
            count,
            window: self.interval,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_report_before_interval() {
        let start = Instant::now();
        let mut m = ThroughputMeter::new(DEFAULT_REPORT_INTERVAL, start);
        m.record_processed();
        assert!(m.maybe_report(start + Duration::from_millis(59_999)).is_none());
        assert_eq!(m.pending(), 1);
    }

    #[test]
    fn reports_exactly_at_interval_and_resets() {
        let start = Instant::now();
        let mut m = ThroughputMeter::new(DEFAULT_REPORT_INTERVAL, start);
        for _ in 0..3 {
            m.record_processed();
        }

        let report = m.maybe_report(start + Duration::from_secs(60)).unwrap();
        assert_eq!(report.count, 3);
        assert_eq!(m.pending(), 0);

        // Accumulates again immediately after the reset.
        m.record_processed();
        assert_eq!(m.pending(), 1);
    }

    #[test]
    fn window_restarts_at_report_time() {
        let start = Instant::now();
        let mut m = ThroughputMeter::new(DEFAULT_REPORT_INTERVAL, start);
        let first = start + Duration::from_secs(75);
        assert!(m.maybe_report(first).is_some());

        // 60s measured from the report, not from the original start.
        assert!(m.maybe_report(start + Duration::from_secs(120)).is_none());
        let second = m.maybe_report(first + Duration::from_secs(60)).unwrap();
        assert_eq!(second.count, 0);
    }

    #[test]
    fn restart_moves_window_start() {
        let start = Instant::now();
        let mut m = ThroughputMeter::new(DEFAULT_REPORT_INTERVAL, start);
        m.record_processed();
        let resumed = start + Duration::from_secs(30);
        m.restart(resumed);

        assert!(m.maybe_report(start + Duration::from_secs(60)).is_none());
        let report = m.maybe_report(resumed + Duration::from_secs(60)).unwrap();
        assert_eq!(report.count, 1);
    }

    #[test]
    fn report_line_format() {
        let per_min = ThroughputReport { count: 42, window: Duration::from_secs(60) };
        assert_eq!(per_min.to_string(), "Throughput: 42 records/min");

        let custom = ThroughputReport { count: 7, window: Duration::from_secs(10) };
        assert_eq!(custom.to_string(), "Throughput: 7 records/10s");
    }
}
