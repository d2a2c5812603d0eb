use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};

use crate::provider::ProviderError;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Requests allowed per window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateQuota {
    pub window: Duration,
    pub limit: u32,
}

impl Default for RateQuota {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(60),
            limit: 120,
        }
    }
}

/// Exponential retry schedule applied while waiting for rate budget.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
    pub max_retries: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            max_retries: 3,
        }
    }
}

/// Shared async gate in front of the series provider.
#[derive(Clone)]
pub struct RateGate {
    limiter: Arc<DirectRateLimiter>,
    backoff: BackoffPolicy,
}

impl RateGate {
    pub fn new(quota: RateQuota, backoff: BackoffPolicy) -> Self {
        Self {
            limiter: Arc::new(RateLimiter::direct(quota_from_window(quota))),
            backoff,
        }
    }

    /// Delay before retry number `attempt`, exponentially scaled from the
    /// initial delay and capped at `max_delay`; `None` once retries are
    /// exhausted.
    pub fn retry_delay(&self, attempt: u32) -> Option<Duration> {
        if attempt > self.backoff.max_retries {
            return None;
        }
        let scale = self.backoff.multiplier.powf(f64::from(attempt));
        let seconds = self.backoff.initial_delay.as_secs_f64() * scale;
        Some(Duration::from_secs_f64(
            seconds.min(self.backoff.max_delay.as_secs_f64()),
        ))
    }

    /// Waits for rate budget, sleeping through the backoff schedule; fails
    /// with a rate-limited provider error when retries run out.
    pub async fn acquire(&self) -> Result<(), ProviderError> {
        let mut attempt = 0;
        loop {
            if self.limiter.check().is_ok() {
                return Ok(());
            }
            match self.retry_delay(attempt) {
                Some(delay) => tokio::time::sleep(delay).await,
                None => {
                    return Err(ProviderError::rate_limited(
                        "rate budget exhausted after retries",
                    ))
                }
            }
            attempt += 1;
        }
    }
}

fn quota_from_window(quota: RateQuota) -> Quota {
    let safe_limit = quota.limit.max(1);
    let burst = NonZeroU32::new(safe_limit).expect("safe limit must be non-zero");

    let seconds_per_cell = (quota.window.as_secs_f64() / f64::from(safe_limit)).max(0.001);
    let period = Duration::from_secs_f64(seconds_per_cell);

    Quota::with_period(period)
        .expect("period is always greater than zero")
        .allow_burst(burst)
}
