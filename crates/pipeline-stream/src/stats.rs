//! Two-tier statistics (spec §4.5): "per-processor counters (input,
//! output, filtered, errored, processing duration, last-record
//! timestamp) and per-stage counters (input, output, filtered, errored,
//! running-average latency). Both are updated under a single lock per
//! processor and copied under lock on read."

// Layer 1: Standard library imports
use std::time::Duration;

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

// Layer 3: Internal module imports
// (none)

/// Processor-wide counters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessorStats {
    pub input: u64,
    pub output: u64,
    pub filtered: u64,
    pub errored: u64,
    /// Cumulative time spent inside the stage chain across all records.
    pub processing_duration: Duration,
    pub last_record_at: Option<DateTime<Utc>>,
    /// Records dropped by the realtime dedup layer (spec §8 S2), counted
    /// separately from stage-level `filtered`.
    pub duplicate_count: u64,
}

/// Per-stage counters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageStats {
    pub name: String,
    pub input: u64,
    pub output: u64,
    pub filtered: u64,
    pub errored: u64,
    /// "(avg + current) / 2 — a cheap approximation" (spec §4.5).
    pub avg_latency: Duration,
}

impl StageStats {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    fn record_latency(&mut self, latency: Duration) {
        self.avg_latency = if self.output == 0 && self.errored == 0 && self.filtered == 0 {
            latency
        } else {
            (self.avg_latency + latency) / 2
        };
    }
}

struct Inner {
    processor: ProcessorStats,
    stages: Vec<StageStats>,
}

/// The single processor-scoped mutex every stat mutation and read
/// acquires (spec §4.5, §5).
pub struct Statistics {
    inner: Mutex<Inner>,
}

impl Statistics {
    pub fn new(stage_names: impl IntoIterator<Item = String>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                processor: ProcessorStats::default(),
                stages: stage_names.into_iter().map(StageStats::new).collect(),
            }),
        }
    }

    pub fn record_input(&self) {
        let mut inner = self.inner.lock();
        inner.processor.input += 1;
        inner.processor.last_record_at = Some(Utc::now());
    }

    pub fn record_stage_success(&self, stage_index: usize, latency: Duration) {
        let mut inner = self.inner.lock();
        if let Some(stage) = inner.stages.get_mut(stage_index) {
            stage.input += 1;
            stage.output += 1;
            stage.record_latency(latency);
        }
    }

    pub fn record_stage_filtered(&self, stage_index: usize, latency: Duration) {
        let mut inner = self.inner.lock();
        if let Some(stage) = inner.stages.get_mut(stage_index) {
            stage.input += 1;
            stage.filtered += 1;
            stage.record_latency(latency);
        }
        inner.processor.filtered += 1;
    }

    pub fn record_stage_error(&self, stage_index: usize, latency: Duration) {
        let mut inner = self.inner.lock();
        if let Some(stage) = inner.stages.get_mut(stage_index) {
            stage.input += 1;
            stage.errored += 1;
            stage.record_latency(latency);
        }
        inner.processor.errored += 1;
    }

    pub fn record_output(&self, processing_duration: Duration) {
        let mut inner = self.inner.lock();
        inner.processor.output += 1;
        inner.processor.processing_duration += processing_duration;
    }

    pub fn record_sink_error(&self) {
        self.inner.lock().processor.errored += 1;
    }

    pub fn record_duplicate(&self) {
        self.inner.lock().processor.duplicate_count += 1;
    }

    /// A deep-copy snapshot, taken under the same lock every mutation
    /// uses.
    pub fn snapshot(&self) -> (ProcessorStats, Vec<StageStats>) {
        let inner = self.inner.lock();
        (inner.processor.clone(), inner.stages.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_count_and_last_record_timestamp_advance() {
        let stats = Statistics::new(["s1".to_string()]);
        stats.record_input();
        let (processor, _) = stats.snapshot();
        assert_eq!(processor.input, 1);
        assert!(processor.last_record_at.is_some());
    }

    #[test]
    fn stage_latency_uses_cheap_running_average() {
        let stats = Statistics::new(["s1".to_string()]);
        stats.record_stage_success(0, Duration::from_millis(10));
        stats.record_stage_success(0, Duration::from_millis(30));
        let (_, stages) = stats.snapshot();
        // (10 + 30) / 2 = 20ms after the first update folds in.
        assert_eq!(stages[0].avg_latency, Duration::from_millis(20));
    }

    #[test]
    fn universal_invariant_input_covers_output_filtered_errored() {
        let stats = Statistics::new(["s1".to_string()]);
        stats.record_input();
        stats.record_stage_success(0, Duration::from_millis(1));
        stats.record_output(Duration::from_millis(1));
        stats.record_input();
        stats.record_stage_filtered(0, Duration::from_millis(1));
        let (processor, _) = stats.snapshot();
        assert!(processor.input >= processor.output + processor.filtered + processor.errored);
    }
}
