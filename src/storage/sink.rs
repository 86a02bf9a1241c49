//! Result sink: tally plus the optional hits file.

use crate::error::{FailureKind, ProbeFailure, ScanError, ScanResult};
use crate::scanner::tally::{ScanTally, TallySnapshot};
use crate::scanner::traits::ScanOutcome;
use crate::scanner::{FailureBreakdown, ScanSummary};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Accumulates outcomes and appends successful addresses to the output file.
///
/// The file is created (truncated) by [`ResultSink::open`] and closed when the
/// sink is dropped, whether the scan finished normally or not.
#[derive(Debug)]
pub struct ResultSink {
    tally: Arc<ScanTally>,
    hits: Option<HitsFile>,
}

#[derive(Debug)]
struct HitsFile {
    path: PathBuf,
    file: Mutex<File>,
}

impl ResultSink {
    /// Open the sink, creating the output file if one is configured.
    pub fn open(output: Option<&Path>) -> ScanResult<Self> {
        let hits = match output {
            Some(path) => {
                let file = File::create(path).map_err(|source| ScanError::ResourceUnavailable {
                    path: path.to_path_buf(),
                    source,
                })?;
                Some(HitsFile {
                    path: path.to_path_buf(),
                    file: Mutex::new(file),
                })
            }
            None => None,
        };

        Ok(Self {
            tally: Arc::new(ScanTally::new()),
            hits,
        })
    }

    /// Record one outcome; successes are written out before being counted.
    pub fn record(&self, outcome: &ScanOutcome) -> TallySnapshot {
        if outcome.succeeded() {
            if let Some(hits) = &self.hits {
                hits.append(&outcome.address.to_string());
            }
        }
        self.tally.record(outcome);
        self.tally.snapshot()
    }

    /// Record a failure that cannot be attributed to an address.
    pub fn record_lost(&self, failure: &ProbeFailure) {
        self.tally.record_lost(failure);
    }

    pub fn tally(&self) -> &ScanTally {
        &self.tally
    }

    /// Shared read handle for observers running alongside the scan.
    pub fn tally_handle(&self) -> Arc<ScanTally> {
        Arc::clone(&self.tally)
    }

    /// Close the output file and compute the run summary.
    pub fn finish(self, total: u128, cancelled: bool) -> ScanSummary {
        let elapsed = self.tally.elapsed();
        let snapshot = self.tally.snapshot();

        let failures = FailureBreakdown {
            unreachable: self.tally.failures_of(FailureKind::Unreachable),
            auth_rejected: self.tally.failures_of(FailureKind::AuthRejected),
            timeout: self.tally.failures_of(FailureKind::Timeout),
            other: self.tally.failures_of(FailureKind::Other),
        };

        let secs = elapsed.as_secs_f64();
        let rate = if secs > 0.0 {
            snapshot.processed as f64 / secs
        } else {
            0.0
        };

        let output = self.hits.map(|hits| hits.close());

        ScanSummary {
            total,
            attempted: snapshot.processed,
            succeeded: snapshot.succeeded,
            failed: snapshot.failed,
            failures,
            elapsed,
            rate,
            started_at: self.tally.started_at(),
            cancelled,
            output,
        }
    }
}

impl HitsFile {
    fn append(&self, line: &str) {
        let mut file = self.file.lock().unwrap_or_else(|p| p.into_inner());
        if let Err(e) = writeln!(file, "{}", line) {
            tracing::error!(path = %self.path.display(), error = %e, "failed to write result");
        }
    }

    fn close(self) -> PathBuf {
        let file = self.file.into_inner().unwrap_or_else(|p| p.into_inner());
        if let Err(e) = file.sync_all() {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to sync output file");
        }
        self.path
    }
}
