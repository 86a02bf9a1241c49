//! Rate limiting for probe dispatch.
//!
//! Token bucket that caps how many probes start per second, independent of
//! how many may be in flight at once.

use governor::{Quota, RateLimiter as GovLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

type DirectLimiter = GovLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// A rate limiter for controlling probe dispatch speed.
#[derive(Clone)]
pub struct RateLimiter {
    limiter: Arc<DirectLimiter>,
}

impl RateLimiter {
    /// Create a limiter allowing `rate` probes per second.
    ///
    /// Returns `None` for a rate of 0, which means unlimited. Bursts are not
    /// allowed: tokens are spread evenly across each second.
    pub fn new(rate: u32) -> Option<Self> {
        let rate = NonZeroU32::new(rate)?;
        let quota = Quota::per_second(rate).allow_burst(NonZeroU32::MIN);
        let limiter = GovLimiter::direct(quota);

        Some(Self {
            limiter: Arc::new(limiter),
        })
    }

    /// Wait until a token is available.
    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }

}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn test_zero_rate_is_unlimited() {
        assert!(RateLimiter::new(0).is_none());
    }

    #[test]
    fn test_first_token_is_immediate() {
        let limiter = RateLimiter::new(1).unwrap();
        let start = Instant::now();
        tokio_test::block_on(limiter.wait());
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_rate_limiter_spaces_out_dispatch() {
        let limiter = RateLimiter::new(20).unwrap();
        let start = Instant::now();
        for _ in 0..3 {
            limiter.wait().await;
        }
        // First token is immediate, the next two arrive 50ms apart.
        assert!(start.elapsed() >= Duration::from_millis(80));
    }

    #[tokio::test]
    async fn test_rate_limiter_clone_shares_state() {
        let limiter1 = RateLimiter::new(10).unwrap();
        let limiter2 = limiter1.clone();

        let start = Instant::now();
        limiter1.wait().await;
        limiter2.wait().await;
        // The clone draws from the same bucket, so it waits for the next token.
        assert!(start.elapsed() >= Duration::from_millis(80));
    }
}
