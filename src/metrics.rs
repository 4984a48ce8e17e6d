use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing summarization activity.
#[derive(Default)]
pub struct SummaryMetrics {
    documents_summarized: AtomicU64,
    chunks_summarized: AtomicU64,
    unit_calls: AtomicU64,
    degraded_units: AtomicU64,
    failed_requests: AtomicU64,
}

impl SummaryMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed document along with how much summarization work it required.
    pub fn record_document(&self, chunk_count: u64, unit_calls: u64, degraded_units: u64) {
        self.documents_summarized.fetch_add(1, Ordering::Relaxed);
        self.chunks_summarized
            .fetch_add(chunk_count, Ordering::Relaxed);
        self.unit_calls.fetch_add(unit_calls, Ordering::Relaxed);
        self.degraded_units
            .fetch_add(degraded_units, Ordering::Relaxed);
    }

    /// Record a request that ended in an error.
    pub fn record_failure(&self) {
        self.failed_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_summarized: self.documents_summarized.load(Ordering::Relaxed),
            chunks_summarized: self.chunks_summarized.load(Ordering::Relaxed),
            unit_calls: self.unit_calls.load(Ordering::Relaxed),
            degraded_units: self.degraded_units.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of summarization counters used for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Documents summarized successfully since startup.
    pub documents_summarized: u64,
    /// Total chunks produced across summarized documents.
    pub chunks_summarized: u64,
    /// Calls issued to the summarization capability, reduce passes included.
    pub unit_calls: u64,
    /// Units replaced with a failure note under the degrade policy.
    pub degraded_units: u64,
    /// Requests that ended in an error.
    pub failed_requests: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_documents_and_work() {
        let metrics = SummaryMetrics::new();
        metrics.record_document(2, 3, 0);
        metrics.record_document(3, 4, 1);
        metrics.record_failure();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.documents_summarized, 2);
        assert_eq!(snapshot.chunks_summarized, 5);
        assert_eq!(snapshot.unit_calls, 7);
        assert_eq!(snapshot.degraded_units, 1);
        assert_eq!(snapshot.failed_requests, 1);
    }

    #[test]
    fn snapshot_starts_empty() {
        let metrics = SummaryMetrics::new();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }
}
