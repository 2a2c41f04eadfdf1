//! Request pacing for upstream sources.
//!
//! Two mechanisms compose: a courtesy delay since the previous request, and
//! an optional rolling-window quota (e.g. 9000 requests/day for the video
//! API, 60/minute for the forum). A `tokio::sync::Mutex` is held across the
//! sleeps so concurrent callers hitting the same source are serialized
//! rather than racing the budget.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Rolling-window request budget.
#[derive(Debug, Clone, Copy)]
pub struct Quota {
    pub max_requests: u32,
    pub window: Duration,
}

#[derive(Debug, Default)]
struct LimiterState {
    last_call: Option<Instant>,
    recent: VecDeque<Instant>,
}

/// Paces calls to a single upstream source.
#[derive(Debug)]
pub struct RateLimiter {
    min_delay: Duration,
    quota: Option<Quota>,
    state: Mutex<LimiterState>,
}

impl RateLimiter {
    pub fn new(min_delay: Duration, quota: Option<Quota>) -> Self {
        Self {
            min_delay,
            quota,
            state: Mutex::new(LimiterState::default()),
        }
    }

    /// Courtesy delay only, no quota.
    pub fn with_delay(min_delay: Duration) -> Self {
        Self::new(min_delay, None)
    }

    /// Courtesy delay plus a rolling-window quota.
    pub fn with_quota(min_delay: Duration, max_requests: u32, window: Duration) -> Self {
        Self::new(
            min_delay,
            Some(Quota {
                max_requests,
                window,
            }),
        )
    }

    /// Waits until the next request is admitted.
    ///
    /// Never fails; a caller that has to wait simply sleeps. The internal
    /// lock is held for the whole wait so same-source callers proceed one
    /// at a time.
    pub async fn acquire(&self) {
        let mut state = self.state.lock().await;

        if let Some(last) = state.last_call {
            let elapsed = last.elapsed();
            if elapsed < self.min_delay {
                tokio::time::sleep(self.min_delay - elapsed).await;
            }
        }

        if let Some(quota) = self.quota {
            loop {
                let now = Instant::now();
                while state
                    .recent
                    .front()
                    .is_some_and(|t| now.duration_since(*t) >= quota.window)
                {
                    state.recent.pop_front();
                }
                if (state.recent.len() as u32) < quota.max_requests {
                    break;
                }
                // Window is full; sleep until the oldest entry expires.
                let Some(oldest) = state.recent.front().copied() else {
                    break;
                };
                tokio::time::sleep(quota.window - now.duration_since(oldest)).await;
            }
        }

        let now = Instant::now();
        state.last_call = Some(now);
        if self.quota.is_some() {
            state.recent.push_back(now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn first_acquire_is_immediate() {
        let limiter = RateLimiter::with_delay(Duration::from_secs(1));
        let before = Instant::now();
        limiter.acquire().await;
        assert_eq!(before.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn consecutive_acquires_respect_the_delay() {
        let limiter = RateLimiter::with_delay(Duration::from_secs(2));
        limiter.acquire().await;

        let before = Instant::now();
        limiter.acquire().await;
        assert!(before.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn delay_counts_from_the_previous_call() {
        let limiter = RateLimiter::with_delay(Duration::from_secs(2));
        limiter.acquire().await;
        tokio::time::sleep(Duration::from_millis(1500)).await;

        let before = Instant::now();
        limiter.acquire().await;
        // Only the remaining 500ms of the delay is slept.
        assert_eq!(before.elapsed(), Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn quota_blocks_until_the_window_rolls_over() {
        let limiter = RateLimiter::with_quota(Duration::ZERO, 2, Duration::from_secs(60));
        limiter.acquire().await;
        limiter.acquire().await;

        // Third call exceeds the budget and has to wait out the window.
        let before = Instant::now();
        limiter.acquire().await;
        assert!(before.elapsed() >= Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn quota_admits_after_old_entries_expire() {
        let limiter = RateLimiter::with_quota(Duration::ZERO, 1, Duration::from_secs(10));
        limiter.acquire().await;
        tokio::time::sleep(Duration::from_secs(11)).await;

        let before = Instant::now();
        limiter.acquire().await;
        assert_eq!(before.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_are_serialized() {
        use std::sync::Arc;

        let limiter = Arc::new(RateLimiter::with_delay(Duration::from_secs(1)));
        let started = Instant::now();

        let mut handles = Vec::new();
        for _ in 0..3 {
            let limiter = Arc::clone(&limiter);
            handles.push(tokio::spawn(async move {
                limiter.acquire().await;
                started.elapsed()
            }));
        }

        let mut timings: Vec<Duration> = Vec::new();
        for handle in handles {
            timings.push(handle.await.unwrap());
        }
        timings.sort();

        // One caller goes through immediately, the rest queue a full delay apart.
        assert_eq!(timings[0], Duration::ZERO);
        assert!(timings[1] >= Duration::from_secs(1));
        assert!(timings[2] >= Duration::from_secs(2));
    }
}
