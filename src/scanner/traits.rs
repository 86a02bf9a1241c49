//! Prober and reporter abstractions.
//!
//! The coordinator only needs "try these credentials against this address and
//! tell me whether it worked". Keeping that behind a trait lets the SSH
//! implementation be swapped for instrumented probers in tests.

use crate::error::ProbeFailure;
use crate::scanner::tally::TallySnapshot;
use async_trait::async_trait;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Outcome of a single probe.
pub type ProbeOutcome = Result<(), ProbeFailure>;

/// One address's result, handed straight to the result sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOutcome {
    pub address: IpAddr,
    pub result: ProbeOutcome,
}

impl ScanOutcome {
    pub fn new(address: IpAddr, result: ProbeOutcome) -> Self {
        Self { address, result }
    }

    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

/// Trait for authenticated connection attempts.
///
/// Implementations carry their credentials and timeout from construction and
/// must make exactly one attempt per call, closing any connection before
/// returning.
///
/// # Example
///
/// ```ignore
/// use sshsweep::scanner::{Prober, SshProber};
///
/// async fn check<P: Prober>(prober: &P, target: SocketAddr) -> bool {
///     prober.probe(target).await.is_ok()
/// }
/// ```
#[async_trait]
pub trait Prober: Send + Sync {
    /// Attempt to authenticate against `target`.
    async fn probe(&self, target: SocketAddr) -> ProbeOutcome;

    /// Attempt to authenticate, giving up after `limit`.
    ///
    /// The default drops the `probe` future once `limit` elapses, which ends
    /// the attempt for purely async implementations. Implementations whose
    /// work outlives its future (blocking threads) must override this and
    /// only return once that work has stopped.
    async fn probe_within(&self, target: SocketAddr, limit: Duration) -> ProbeOutcome {
        match tokio::time::timeout(limit, self.probe(target)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ProbeFailure::Timeout),
        }
    }
}

/// Receives progress from a running scan.
///
/// Calls may come from any task. `found` is invoked once per success, never
/// concurrently with another `found` or `snapshot` call.
pub trait ScanReporter: Send + Sync {
    /// Periodic view of the counters.
    fn snapshot(&self, snapshot: &TallySnapshot);

    /// A target accepted the credentials.
    fn found(&self, address: IpAddr, snapshot: &TallySnapshot);

    /// The scan reached quiescence.
    fn finish(&self) {}
}

/// Reporter that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl ScanReporter for SilentReporter {
    fn snapshot(&self, _snapshot: &TallySnapshot) {}

    fn found(&self, _address: IpAddr, _snapshot: &TallySnapshot) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_scan_outcome() {
        let addr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
        assert!(ScanOutcome::new(addr, Ok(())).succeeded());
        assert!(!ScanOutcome::new(addr, Err(ProbeFailure::Timeout)).succeeded());
    }
}
