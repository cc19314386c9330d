//! Time source and interval timers.
//!
//! All waiting in the driver goes through a [`Clock`] so that tests can run
//! against [`ManualClock`], whose `sleep` simply advances time.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A monotonic time source with blocking sleep.
pub trait Clock: Clone + Send + Sync + 'static {
    /// Time elapsed since the clock's origin.
    fn now(&self) -> Duration;

    /// Block the calling thread for `duration`.
    fn sleep(&self, duration: Duration);
}

/// Wall clock backed by [`Instant`].
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        SystemClock {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// A shared, manually driven clock. Clones observe the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    micros: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward.
    pub fn advance(&self, duration: Duration) {
        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
        self.micros.fetch_add(micros, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_micros(self.micros.load(Ordering::SeqCst))
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

/// A recurring deadline.
///
/// [`is_due`](IntervalTimer::is_due) returns `true` at most once per period
/// and restarts the period when it does. A zero period is inactive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalTimer {
    period: Duration,
    last: Duration,
}

impl IntervalTimer {
    pub fn new(period: Duration) -> Self {
        IntervalTimer {
            period,
            last: Duration::ZERO,
        }
    }

    /// An inactive timer.
    pub fn inactive() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_active(&self) -> bool {
        !self.period.is_zero()
    }

    /// Whether more than one period has passed since the last firing.
    pub fn is_due(&mut self, now: Duration) -> bool {
        if self.is_active() && now.saturating_sub(self.last) > self.period {
            self.last = now;
            true
        } else {
            false
        }
    }

    /// Restart the current period at `now`.
    pub fn reset(&mut self, now: Duration) {
        self.last = now;
    }

    /// Replace the period and restart it at `now`.
    pub fn reset_with(&mut self, period: Duration, now: Duration) {
        self.period = period;
        self.last = now;
    }

    /// Time left in the current period.
    pub fn remaining(&self, now: Duration) -> Duration {
        self.period.saturating_sub(now.saturating_sub(self.last))
    }
}
