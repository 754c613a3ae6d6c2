//! Sliding-window launch limiter.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Allows at most `max_runs` acquisitions in any `window`.
///
/// A limiter built with `max_runs == 0` never waits.
pub struct RateLimiter {
    max_runs: usize,
    window: Duration,
    launches: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max_runs: usize, window: Duration) -> Self {
        Self {
            max_runs,
            window,
            launches: Mutex::new(VecDeque::new()),
        }
    }

    pub fn per_minute(max_runs: u32) -> Self {
        Self::new(max_runs as usize, Duration::from_secs(60))
    }

    pub fn unlimited() -> Self {
        Self::new(0, Duration::ZERO)
    }

    pub fn is_unlimited(&self) -> bool {
        self.max_runs == 0
    }

    /// Wait until a launch is allowed, then record it.
    pub async fn acquire(&self) {
        if self.is_unlimited() {
            return;
        }

        let mut launches = self.launches.lock().await;
        self.prune(&mut launches, Instant::now());

        if launches.len() >= self.max_runs
            && let Some(&oldest) = launches.front()
        {
            let wait = (oldest + self.window).saturating_duration_since(Instant::now());
            if !wait.is_zero() {
                debug!(wait_ms = wait.as_millis() as u64, "Rate limit reached, waiting");
                tokio::time::sleep(wait).await;
            }
            self.prune(&mut launches, Instant::now());
        }

        launches.push_back(Instant::now());
    }

    /// Launches recorded inside the current window.
    pub async fn current_usage(&self) -> usize {
        let mut launches = self.launches.lock().await;
        self.prune(&mut launches, Instant::now());
        launches.len()
    }

    fn prune(&self, launches: &mut VecDeque<Instant>, now: Instant) {
        while let Some(&front) = launches.front() {
            if front + self.window <= now {
                launches.pop_front();
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn under_the_limit_does_not_wait() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        let start = Instant::now();
        for _ in 0..3 {
            limiter.acquire().await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(limiter.current_usage().await, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn over_the_limit_waits_for_the_window() {
        let limiter = RateLimiter::new(2, Duration::from_secs(10));
        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_secs(10));
        assert!(start.elapsed() < Duration::from_secs(11));
        // the first two have expired
        assert_eq!(limiter.current_usage().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn old_launches_expire() {
        let limiter = RateLimiter::new(1, Duration::from_secs(5));
        limiter.acquire().await;
        tokio::time::sleep(Duration::from_secs(6)).await;
        let before = Instant::now();
        limiter.acquire().await;
        assert_eq!(before.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn unlimited_never_records() {
        let limiter = RateLimiter::unlimited();
        for _ in 0..100 {
            limiter.acquire().await;
        }
        assert!(limiter.is_unlimited());
        assert_eq!(limiter.current_usage().await, 0);
    }
}
