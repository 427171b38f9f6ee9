//! Sliding window rate limiter for Bot API calls.
//!
//! Telegram throttles bots that send more than about 30 messages per
//! minute to the same chat, so outgoing notifications are capped here
//! before they reach the API.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Rate limiter that allows at most `max_calls` operations within any
/// trailing `period`.
///
/// Callers over the cap are blocked until the oldest call in the window
/// ages out. The window sits behind an async mutex, so one limiter shared
/// through an `Arc` enforces the cap across every caller in the process.
/// The mutex is only held while the window is inspected, never across a
/// wait, so the non-blocking methods answer immediately.
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    /// Maximum calls allowed inside one window.
    max_calls: usize,

    /// Length of the trailing window.
    period: Duration,

    /// Instants of the calls still inside the window, oldest first.
    calls: Mutex<VecDeque<Instant>>,
}

impl SlidingWindowLimiter {
    /// Creates a limiter admitting `max_calls` per `period`.
    ///
    /// A `max_calls` of zero is treated as one.
    #[must_use]
    pub fn new(max_calls: usize, period: Duration) -> Self {
        let max_calls = max_calls.max(1);
        Self {
            max_calls,
            period,
            calls: Mutex::new(VecDeque::with_capacity(max_calls)),
        }
    }

    /// Maximum calls per window.
    #[must_use]
    pub const fn max_calls(&self) -> usize {
        self.max_calls
    }

    /// Window length.
    #[must_use]
    pub const fn period(&self) -> Duration {
        self.period
    }

    /// Waits until a call is allowed, then records it.
    ///
    /// Returns the total duration waited (0 if no wait was needed).
    pub async fn wait_and_acquire(&self) -> Duration {
        let mut waited = Duration::ZERO;

        loop {
            let wait = {
                let mut calls = self.calls.lock().await;
                let now = Instant::now();
                self.evict_expired(&mut calls, now);

                if calls.len() < self.max_calls {
                    calls.push_back(now);
                    return waited;
                }

                let wait = self.wait_for(&calls, now);
                debug!(
                    "Rate limiter: {} calls in the last {:?}, waiting {:?}",
                    calls.len(),
                    self.period,
                    wait
                );
                wait
            };

            // The window is not held while sleeping; it is re-checked after.
            tokio::time::sleep(wait).await;
            waited += wait;
        }
    }

    /// Records a call if the window has room, without blocking.
    pub async fn try_acquire(&self) -> bool {
        let mut calls = self.calls.lock().await;
        let now = Instant::now();
        self.evict_expired(&mut calls, now);

        if calls.len() < self.max_calls {
            calls.push_back(now);
            true
        } else {
            false
        }
    }

    /// Checks if a call is currently allowed without recording one.
    pub async fn is_allowed(&self) -> bool {
        let mut calls = self.calls.lock().await;
        self.evict_expired(&mut calls, Instant::now());
        calls.len() < self.max_calls
    }

    /// Returns the time remaining until the next call is allowed.
    pub async fn time_until_allowed(&self) -> Duration {
        let mut calls = self.calls.lock().await;
        let now = Instant::now();
        self.evict_expired(&mut calls, now);

        if calls.len() < self.max_calls {
            Duration::ZERO
        } else {
            self.wait_for(&calls, now)
        }
    }

    /// Clears the window, allowing `max_calls` immediate calls.
    pub async fn reset(&self) {
        self.calls.lock().await.clear();
    }

    fn evict_expired(&self, calls: &mut VecDeque<Instant>, now: Instant) {
        while calls
            .front()
            .is_some_and(|oldest| now.duration_since(*oldest) >= self.period)
        {
            calls.pop_front();
        }
    }

    fn wait_for(&self, calls: &VecDeque<Instant>, now: Instant) -> Duration {
        calls
            .front()
            .map_or(Duration::ZERO, |oldest| (*oldest + self.period).saturating_duration_since(now))
    }
}
