//! Request pacing for external services.
//!
//! Each enrichment source gets its own governor enforcing a minimum
//! spacing between consecutive calls. Job runners are sequential loops,
//! so this is a simple sleep-since-last-call, not a distributed limiter.
//! Pacing alone, together with the batch caps, bounds worst-case run
//! duration - there is no separate timeout.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

/// Minimum-spacing contract between consecutive external calls.
///
/// Implementations suspend the caller in `pace` until enough time has
/// passed since the previous `pace` returned. Tests substitute a no-op.
#[async_trait]
pub trait Governor: Send + Sync {
    /// Suspend until the minimum interval since the last call has elapsed.
    async fn pace(&self);
}

/// Sleep-based governor with a fixed minimum interval.
pub struct IntervalGovernor {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl IntervalGovernor {
    /// Create a governor with the given minimum spacing.
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    /// Convenience constructor from milliseconds.
    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }
}

#[async_trait]
impl Governor for IntervalGovernor {
    async fn pace(&self) {
        let mut last = self.last_call.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        // Record when this call returned, not when it started
        *last = Some(Instant::now());
    }
}

/// No-op governor for unit tests.
#[cfg(test)]
pub struct NoopGovernor;

#[cfg(test)]
#[async_trait]
impl Governor for NoopGovernor {
    async fn pace(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_call_returns_immediately() {
        let governor = IntervalGovernor::from_millis(500);
        let start = Instant::now();
        governor.pace().await;
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_second_call_waits_out_the_interval() {
        let governor = IntervalGovernor::from_millis(50);
        let start = Instant::now();
        governor.pace().await;
        governor.pace().await;
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_no_wait_when_interval_already_elapsed() {
        let governor = IntervalGovernor::from_millis(20);
        governor.pace().await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        let start = Instant::now();
        governor.pace().await;
        assert!(start.elapsed() < Duration::from_millis(15));
    }
}
