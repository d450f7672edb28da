//! Dispatch counters
//!
//! Atomics updated on the dispatch and acknowledgment paths, with a
//! serializable snapshot for status reporting.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::ack::AckOutcome;

/// Live counters (thread-safe)
#[derive(Debug, Default)]
pub struct DispatchCounters {
    dispatched: AtomicU64,
    blocking: AtomicU64,
    acked_success: AtomicU64,
    acked_error: AtomicU64,
    acked_not_implemented: AtomicU64,
    timed_out: AtomicU64,
    cancelled: AtomicU64,
    abandoned: AtomicU64,
}

impl DispatchCounters {
    pub fn record_dispatch(&self, blocking: bool) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
        if blocking {
            self.blocking.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_ack(&self, outcome: &AckOutcome) {
        let counter = match outcome {
            AckOutcome::Success(_) => &self.acked_success,
            AckOutcome::Error { .. } => &self.acked_error,
            AckOutcome::NotImplemented => &self.acked_not_implemented,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_timeout(&self) {
        self.timed_out.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cancel(&self) {
        self.cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_abandoned(&self) {
        self.abandoned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DispatchMetrics {
        DispatchMetrics {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            blocking: self.blocking.load(Ordering::Relaxed),
            acked_success: self.acked_success.load(Ordering::Relaxed),
            acked_error: self.acked_error.load(Ordering::Relaxed),
            acked_not_implemented: self.acked_not_implemented.load(Ordering::Relaxed),
            timed_out: self.timed_out.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            abandoned: self.abandoned.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`DispatchCounters`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DispatchMetrics {
    pub dispatched: u64,
    pub blocking: u64,
    pub acked_success: u64,
    pub acked_error: u64,
    pub acked_not_implemented: u64,
    pub timed_out: u64,
    pub cancelled: u64,
    pub abandoned: u64,
}

impl DispatchMetrics {
    /// Acknowledgments received, whatever their outcome
    pub fn acked(&self) -> u64 {
        self.acked_success + self.acked_error + self.acked_not_implemented
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_counts() {
        let counters = DispatchCounters::default();
        counters.record_dispatch(false);
        counters.record_dispatch(true);
        counters.record_ack(&AckOutcome::Success(serde_json::Value::Null));
        counters.record_ack(&AckOutcome::NotImplemented);
        counters.record_timeout();

        let snapshot = counters.snapshot();
        assert_eq!(snapshot.dispatched, 2);
        assert_eq!(snapshot.blocking, 1);
        assert_eq!(snapshot.acked(), 2);
        assert_eq!(snapshot.acked_not_implemented, 1);
        assert_eq!(snapshot.timed_out, 1);
        assert_eq!(snapshot.cancelled, 0);
    }

    #[test]
    fn test_metrics_serialization() {
        let json = serde_json::to_string(&DispatchMetrics::default()).unwrap();
        assert!(json.contains("acked-not-implemented"));
    }
}
