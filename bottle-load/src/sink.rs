//! Result capture
//!
//! Issuers append successful records to a lock-free queue and bump a
//! per-second throughput counter. Nothing reads the sink until the phase has
//! ended and its workers are gone; [`ResultSink::freeze`] then drains it.

use bottle_http::{FailureKind, RecordSink, RequestKind, RequestRecord};
use crossbeam::queue::SegQueue;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

/// Concurrent sink for one phase
#[derive(Debug)]
pub struct ResultSink {
    records: SegQueue<RequestRecord>,
    throughput: RwLock<HashMap<i64, AtomicU64>>,
    /// Phase start, milliseconds since the Unix epoch
    epoch_ms: i64,
    failures: AtomicU64,
    skipped: AtomicU64,
}

/// Snapshot of a drained sink
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrozenResults {
    pub records: Vec<RequestRecord>,
    /// Second offset from the phase start to completed successes
    pub throughput: BTreeMap<i64, u64>,
    pub failures: u64,
    pub skipped: u64,
}

impl FrozenResults {
    pub fn success_count(&self) -> usize {
        self.records.len()
    }

    /// Successes plus failed attempts
    pub fn attempts(&self) -> u64 {
        self.records.len() as u64 + self.failures
    }

    pub fn latencies(&self, kind: Option<RequestKind>) -> Vec<i64> {
        self.records
            .iter()
            .filter(|r| kind.is_none_or(|k| r.kind == k))
            .map(|r| r.latency_ms)
            .collect()
    }
}

impl ResultSink {
    pub fn new(epoch_ms: i64) -> Self {
        Self {
            records: SegQueue::new(),
            throughput: RwLock::new(HashMap::new()),
            epoch_ms,
            failures: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
        }
    }

    /// A sink whose throughput seconds count from now
    pub fn starting_now() -> Self {
        Self::new(chrono::Utc::now().timestamp_millis())
    }

    pub fn success_count(&self) -> usize {
        self.records.len()
    }

    pub fn failure_count(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    pub fn skipped_count(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    /// Drain records and counters into an immutable snapshot
    pub fn freeze(&self) -> FrozenResults {
        let mut records = Vec::with_capacity(self.records.len());
        while let Some(record) = self.records.pop() {
            records.push(record);
        }

        let throughput = self
            .throughput
            .write()
            .drain()
            .map(|(second, count)| (second, count.into_inner()))
            .collect();

        FrozenResults {
            records,
            throughput,
            failures: self.failures.swap(0, Ordering::AcqRel),
            skipped: self.skipped.swap(0, Ordering::AcqRel),
        }
    }

    fn bump_second(&self, completed_ms: i64) {
        let second = (completed_ms - self.epoch_ms).div_euclid(1000);

        if let Some(count) = self.throughput.read().get(&second) {
            count.fetch_add(1, Ordering::Relaxed);
            return;
        }
        self.throughput
            .write()
            .entry(second)
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }
}

impl RecordSink for ResultSink {
    fn record_success(&self, record: RequestRecord) {
        self.bump_second(record.start_ms + record.latency_ms);
        self.records.push(record);
    }

    fn record_failure(&self, _kind: RequestKind, _failure: &FailureKind) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    fn record_skip(&self, _kind: RequestKind) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn record(start_ms: i64, kind: RequestKind, latency_ms: i64) -> RequestRecord {
        RequestRecord {
            start_ms,
            kind,
            latency_ms,
            status: 200,
        }
    }

    #[test]
    fn test_records_and_buckets() {
        let sink = ResultSink::new(10_000);
        sink.record_success(record(10_100, RequestKind::Post, 50));
        sink.record_success(record(10_900, RequestKind::Get, 200));
        sink.record_success(record(12_000, RequestKind::Get, 10));
        sink.record_failure(RequestKind::Post, &FailureKind::Status(500));
        sink.record_skip(RequestKind::Get);

        let frozen = sink.freeze();
        assert_eq!(frozen.success_count(), 3);
        assert_eq!(frozen.failures, 1);
        assert_eq!(frozen.skipped, 1);
        assert_eq!(frozen.attempts(), 4);
        assert_eq!(
            frozen.throughput,
            BTreeMap::from([(0, 1), (1, 1), (2, 1)])
        );
        assert_eq!(frozen.latencies(Some(RequestKind::Get)), vec![200, 10]);
        assert_eq!(frozen.latencies(None).len(), 3);
    }

    #[test]
    fn test_freeze_drains() {
        let sink = ResultSink::new(0);
        sink.record_success(record(5, RequestKind::Post, 1));
        sink.record_failure(RequestKind::Get, &FailureKind::Transport("reset".into()));

        assert_eq!(sink.freeze().success_count(), 1);
        let again = sink.freeze();
        assert_eq!(again, FrozenResults::default());
    }

    #[test]
    fn test_concurrent_writers_sum_to_buckets() {
        let sink = Arc::new(ResultSink::new(0));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let sink = Arc::clone(&sink);
                std::thread::spawn(move || {
                    for i in 0..1000 {
                        sink.record_success(record(t * 1000 + i, RequestKind::Get, 3));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let frozen = sink.freeze();
        assert_eq!(frozen.success_count(), 8000);
        assert_eq!(frozen.throughput.values().sum::<u64>(), 8000);
    }
}
