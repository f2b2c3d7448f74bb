use std::time::{Duration, Instant};

/// A point-in-time snapshot of scheduler counters. Reads return a copy;
/// only the dispatcher mutates the live counters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulerStats {
    pub total: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub queue_depth: usize,
    pub active: usize,
    pub avg_response_time: Duration,
    pub uptime: Duration,
}

/// Live, mutable counters owned by the dispatcher task.
pub struct StatsTracker {
    total: u64,
    succeeded: u64,
    failed: u64,
    avg_response_time: Duration,
    started_at: Instant,
}

impl StatsTracker {
    pub fn new() -> Self {
        Self {
            total: 0,
            succeeded: 0,
            failed: 0,
            avg_response_time: Duration::ZERO,
            started_at: Instant::now(),
        }
    }

    /// Records one completed dispatch and updates the running average
    /// response time: `avg := (avg*(n-1) + r) / n` where `n` is the new
    /// count of resolved requests.
    pub fn record_completion(&mut self, succeeded: bool, response_time: Duration) {
        self.total += 1;
        if succeeded {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        let n = self.succeeded + self.failed;
        let prior_total_nanos = self.avg_response_time.as_nanos() as u64 * (n - 1);
        let updated_nanos = (prior_total_nanos + response_time.as_nanos() as u64) / n;
        self.avg_response_time = Duration::from_nanos(updated_nanos);
    }

    pub fn snapshot(&self, queue_depth: usize, active: usize) -> SchedulerStats {
        SchedulerStats {
            total: self.total,
            succeeded: self.succeeded,
            failed: self.failed,
            queue_depth,
            active,
            avg_response_time: self.avg_response_time,
            uptime: self.started_at.elapsed(),
        }
    }
}

impl Default for StatsTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn averages_response_time_across_completions() {
        let mut tracker = StatsTracker::new();
        tracker.record_completion(true, Duration::from_millis(100));
        tracker.record_completion(true, Duration::from_millis(200));
        let snapshot = tracker.snapshot(0, 0);
        assert_eq!(snapshot.avg_response_time, Duration::from_millis(150));
        assert_eq!(snapshot.succeeded, 2);
        assert_eq!(snapshot.total, 2);
    }

    #[test]
    fn counters_never_decrease() {
        let mut tracker = StatsTracker::new();
        tracker.record_completion(true, Duration::from_millis(10));
        tracker.record_completion(false, Duration::from_millis(10));
        let snapshot = tracker.snapshot(0, 0);
        assert_eq!(snapshot.total, 2);
        assert!(snapshot.succeeded + snapshot.failed <= snapshot.total);
    }
}
