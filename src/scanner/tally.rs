//! Concurrent scan counters.

use crate::error::{FailureKind, ProbeFailure};
use crate::scanner::traits::ScanOutcome;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Attempted/succeeded/failed counters for one run.
///
/// Every counter only ever increases. `attempted` is bumped last so a
/// snapshot never shows more processed addresses than recorded outcomes.
#[derive(Debug)]
pub struct ScanTally {
    attempted: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    by_kind: [AtomicU64; 4],
    started: Instant,
    started_at: DateTime<Utc>,
}

impl ScanTally {
    pub fn new() -> Self {
        Self {
            attempted: AtomicU64::new(0),
            succeeded: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            by_kind: Default::default(),
            started: Instant::now(),
            started_at: Utc::now(),
        }
    }

    /// Count one finished probe.
    pub fn record(&self, outcome: &ScanOutcome) {
        match &outcome.result {
            Ok(()) => {
                self.succeeded.fetch_add(1, Ordering::Relaxed);
            }
            Err(failure) => self.record_failure(failure),
        }
        self.attempted.fetch_add(1, Ordering::Release);
    }

    /// Count a failure whose address is no longer known (a panicked probe).
    pub fn record_lost(&self, failure: &ProbeFailure) {
        self.record_failure(failure);
        self.attempted.fetch_add(1, Ordering::Release);
    }

    fn record_failure(&self, failure: &ProbeFailure) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        self.by_kind[failure.kind().index()].fetch_add(1, Ordering::Relaxed);
    }

    /// Read-only copy of the counters.
    pub fn snapshot(&self) -> TallySnapshot {
        let processed = self.attempted.load(Ordering::Acquire);
        TallySnapshot {
            processed,
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            elapsed: self.started.elapsed(),
        }
    }

    /// Failures recorded for one class.
    pub fn failures_of(&self, kind: FailureKind) -> u64 {
        self.by_kind[kind.index()].load(Ordering::Relaxed)
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Default for ScanTally {
    fn default() -> Self {
        Self::new()
    }
}

/// Counters at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TallySnapshot {
    pub processed: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub elapsed: Duration,
}

impl TallySnapshot {
    /// Completion percentage against a planned total.
    pub fn percent_of(&self, total: u128) -> f64 {
        if total == 0 {
            0.0
        } else {
            self.processed as f64 / total as f64 * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};
    use std::sync::Arc;

    fn outcome(result: Result<(), ProbeFailure>) -> ScanOutcome {
        ScanOutcome::new(IpAddr::V4(Ipv4Addr::LOCALHOST), result)
    }

    #[test]
    fn test_record_partitions_outcomes() {
        let tally = ScanTally::new();
        tally.record(&outcome(Ok(())));
        tally.record(&outcome(Err(ProbeFailure::AuthRejected)));
        tally.record(&outcome(Err(ProbeFailure::Timeout)));
        tally.record_lost(&ProbeFailure::Other("panicked".into()));

        let snap = tally.snapshot();
        assert_eq!(snap.processed, 4);
        assert_eq!(snap.succeeded, 1);
        assert_eq!(snap.failed, 3);
        assert_eq!(tally.failures_of(FailureKind::AuthRejected), 1);
        assert_eq!(tally.failures_of(FailureKind::Timeout), 1);
        assert_eq!(tally.failures_of(FailureKind::Other), 1);
        assert_eq!(tally.failures_of(FailureKind::Unreachable), 0);
    }

    #[test]
    fn test_concurrent_increments() {
        let tally = Arc::new(ScanTally::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let tally = Arc::clone(&tally);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        if i % 2 == 0 {
                            tally.record(&outcome(Ok(())));
                        } else {
                            tally.record(&outcome(Err(ProbeFailure::Timeout)));
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let snap = tally.snapshot();
        assert_eq!(snap.processed, 8000);
        assert_eq!(snap.succeeded + snap.failed, snap.processed);
    }

    #[test]
    fn test_percent() {
        let snap = TallySnapshot {
            processed: 64,
            ..Default::default()
        };
        assert_eq!(snap.percent_of(256), 25.0);
        assert_eq!(snap.percent_of(0), 0.0);
    }
}
