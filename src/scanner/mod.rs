//! Scanner module - coordinates probing across an address range.
//!
//! Addresses come off a bounded feed, each probe takes one permit from a
//! semaphore, and every spawned probe lives in a `JoinSet` until it has been
//! absorbed into the result sink. The run only returns once the set is empty.

pub mod enumerator;
pub mod rate_limiter;
pub mod ssh;
pub mod tally;
pub mod traits;

use crate::error::{ProbeFailure, ScanError, ScanResult};
use crate::storage::ResultSink;
use crate::types::{AddressRange, Port};
use chrono::{DateTime, Utc};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub use enumerator::{feed, AddressIter};
pub use rate_limiter::RateLimiter;
pub use ssh::SshProber;
pub use tally::{ScanTally, TallySnapshot};
pub use traits::{ProbeOutcome, Prober, ScanOutcome, ScanReporter, SilentReporter};

/// How often the progress observer samples the tally.
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

/// Configuration for a scan run.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Maximum number of probes in flight.
    pub concurrency: usize,
    /// Deadline for each probe.
    pub timeout: Duration,
    /// Port probed on every address.
    pub port: Port,
    /// File receiving successful addresses.
    pub output: Option<PathBuf>,
    /// Probes started per second, 0 for unlimited.
    pub rate_limit: u32,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            concurrency: 100,
            timeout: Duration::from_secs(3),
            port: Port::SSH,
            output: None,
            rate_limit: 0,
        }
    }
}

impl ScanConfig {
    pub fn new(port: Port) -> Self {
        Self {
            port,
            ..Self::default()
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    pub fn with_rate_limit(mut self, rate: u32) -> Self {
        self.rate_limit = rate;
        self
    }

    /// Reject zero concurrency and zero timeouts.
    pub fn validate(&self) -> ScanResult<()> {
        if self.concurrency == 0 {
            return Err(ScanError::InvalidConfig(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(ScanError::InvalidConfig(
                "timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Addresses buffered ahead of the dispatch loop.
    pub fn lookahead(&self) -> usize {
        self.concurrency.saturating_mul(2)
    }
}

/// Failure counts by class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FailureBreakdown {
    pub unreachable: u64,
    pub auth_rejected: u64,
    pub timeout: u64,
    pub other: u64,
}

/// Final numbers for a completed run.
#[derive(Debug, Clone)]
pub struct ScanSummary {
    /// Addresses the range covers.
    pub total: u128,
    pub attempted: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub failures: FailureBreakdown,
    pub elapsed: Duration,
    /// Attempted addresses per second.
    pub rate: f64,
    pub started_at: DateTime<Utc>,
    /// Dispatch stopped early on request.
    pub cancelled: bool,
    /// Where successful addresses were written, if anywhere.
    pub output: Option<PathBuf>,
}

/// A configured scan, ready to run against a range or an address feed.
pub struct ScanJob {
    config: ScanConfig,
    prober: Arc<dyn Prober>,
    reporter: Arc<dyn ScanReporter>,
    cancel: CancellationToken,
}

impl ScanJob {
    pub fn new(config: ScanConfig, prober: Arc<dyn Prober>) -> Self {
        Self {
            config,
            prober,
            reporter: Arc::new(SilentReporter),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ScanReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Stop dispatching when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Scan every address in `range`.
    ///
    /// The output file is opened before enumeration starts; if that fails
    /// nothing is probed.
    pub async fn run(self, range: &AddressRange) -> ScanResult<ScanSummary> {
        self.config.validate()?;
        let sink = ResultSink::open(self.config.output.as_deref())?;
        let addresses = feed(range, self.config.lookahead());
        self.drive(sink, addresses, range.host_count()).await
    }

    /// Scan whatever arrives on `addresses` until the sender side closes.
    pub async fn run_feed(
        self,
        addresses: mpsc::Receiver<IpAddr>,
        total: u128,
    ) -> ScanResult<ScanSummary> {
        self.config.validate()?;
        let sink = ResultSink::open(self.config.output.as_deref())?;
        self.drive(sink, addresses, total).await
    }

    async fn drive(
        self,
        sink: ResultSink,
        mut addresses: mpsc::Receiver<IpAddr>,
        total: u128,
    ) -> ScanResult<ScanSummary> {
        let reporter = Arc::new(SerializedReporter::new(self.reporter));
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let limiter = RateLimiter::new(self.config.rate_limit);
        let timeout = self.config.timeout;
        let port = self.config.port;

        let observer_stop = CancellationToken::new();
        let observer = tokio::spawn(observe_progress(
            sink.tally_handle(),
            Arc::clone(&reporter),
            observer_stop.clone(),
        ));

        info!(
            total = %total,
            concurrency = self.config.concurrency,
            port = %port,
            "scan started"
        );

        let mut tasks: JoinSet<ScanOutcome> = JoinSet::new();
        let mut cancelled = false;

        'dispatch: loop {
            let permit = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    cancelled = true;
                    break;
                }
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    absorb(&sink, &reporter, joined);
                    continue;
                }
                permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            // Finished probes keep being absorbed while the feed or the rate
            // limiter holds up the next dispatch.
            let address = loop {
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => {
                        cancelled = true;
                        break 'dispatch;
                    }
                    Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                        absorb(&sink, &reporter, joined);
                    }
                    next = addresses.recv() => match next {
                        Some(address) => break address,
                        None => break 'dispatch,
                    },
                }
            };

            if let Some(limiter) = &limiter {
                loop {
                    tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => {
                            cancelled = true;
                            break 'dispatch;
                        }
                        Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                            absorb(&sink, &reporter, joined);
                        }
                        _ = limiter.wait() => break,
                    }
                }
            }

            let prober = Arc::clone(&self.prober);
            tasks.spawn(async move {
                let _permit = permit;
                let target = SocketAddr::new(address, port.as_u16());
                let result = prober.probe_within(target, timeout).await;
                ScanOutcome::new(address, result)
            });
        }

        if cancelled {
            warn!(in_flight = tasks.len(), "scan cancelled, waiting for in-flight probes");
        }
        // Stops the producer if the range was not exhausted.
        drop(addresses);

        while let Some(joined) = tasks.join_next().await {
            absorb(&sink, &reporter, joined);
        }

        observer_stop.cancel();
        if let Err(e) = observer.await {
            error!(error = %e, "progress observer failed");
        }
        reporter.snapshot(&sink.tally().snapshot());
        reporter.finish();

        let summary = sink.finish(total, cancelled);
        info!(
            attempted = summary.attempted,
            succeeded = summary.succeeded,
            failed = summary.failed,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "scan complete"
        );
        Ok(summary)
    }
}

/// Fold one finished probe task into the sink and notify on success.
fn absorb(
    sink: &ResultSink,
    reporter: &SerializedReporter,
    joined: Result<ScanOutcome, JoinError>,
) {
    match joined {
        Ok(outcome) => {
            let snapshot = sink.record(&outcome);
            match &outcome.result {
                Ok(()) => {
                    info!(address = %outcome.address, "credentials accepted");
                    reporter.found(outcome.address, &snapshot);
                }
                Err(failure) => {
                    debug!(address = %outcome.address, kind = %failure.kind(), %failure, "probe failed");
                }
            }
        }
        Err(e) => {
            error!(error = %e, "probe task did not complete");
            sink.record_lost(&ProbeFailure::Other(e.to_string()));
        }
    }
}

async fn observe_progress(
    tally: Arc<ScanTally>,
    reporter: Arc<SerializedReporter>,
    stop: CancellationToken,
) {
    let mut ticker = tokio::time::interval(PROGRESS_INTERVAL);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = stop.cancelled() => return,
            _ = ticker.tick() => reporter.snapshot(&tally.snapshot()),
        }
    }
}

/// Keeps progress snapshots and hit notifications from interleaving.
struct SerializedReporter {
    inner: Arc<dyn ScanReporter>,
    lock: Mutex<()>,
}

impl SerializedReporter {
    fn new(inner: Arc<dyn ScanReporter>) -> Self {
        Self {
            inner,
            lock: Mutex::new(()),
        }
    }

    fn snapshot(&self, snapshot: &TallySnapshot) {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        self.inner.snapshot(snapshot);
    }

    fn found(&self, address: IpAddr, snapshot: &TallySnapshot) {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        self.inner.found(address, snapshot);
    }

    fn finish(&self) {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        self.inner.finish();
    }
}
