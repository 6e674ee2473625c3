//! Metrics for config sync
//!
//! Counters and histograms are recorded through the `metrics` facade. No
//! exporter is installed here; without a recorder every call is a no-op.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Instant;

pub const PUSHES: &str = "config.push.total";
pub const SNAPSHOTS_ACCEPTED: &str = "merge.snapshots.accepted";
pub const SNAPSHOTS_REJECTED: &str = "merge.snapshots.rejected";
pub const FAST_FORWARDS: &str = "merge.fast_forward";
pub const MERGE_HEADS: &str = "merge.synthesized";
pub const MERGE_DURATION: &str = "merge.duration_ms";

/// Register metric descriptions with the installed recorder
pub fn init_metrics() {
    describe_counter!(PUSHES, "Snapshots sealed for pushing");
    describe_counter!(SNAPSHOTS_ACCEPTED, "Incoming snapshots accepted by merge");
    describe_counter!(SNAPSHOTS_REJECTED, "Incoming snapshots rejected by merge");
    describe_counter!(FAST_FORWARDS, "Merges that adopted an existing snapshot");
    describe_counter!(MERGE_HEADS, "Merges that built a new merge head");
    describe_histogram!(MERGE_DURATION, "Merge duration in milliseconds");
}

/// Record a counter metric
pub fn record_counter(name: &'static str, value: u64) {
    counter!(name).increment(value);
}

/// Timer for measuring operation duration
pub struct Timer {
    name: &'static str,
    start: Instant,
}

impl Timer {
    /// Start a timer
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            start: Instant::now(),
        }
    }

    /// Stop the timer and record the duration
    pub fn stop(self) {
        let duration = self.start.elapsed();
        histogram!(self.name).record(duration.as_secs_f64() * 1000.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_without_recorder() {
        init_metrics();
        record_counter(PUSHES, 1);
        Timer::new(MERGE_DURATION).stop();
    }
}
