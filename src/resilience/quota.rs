//! Fixed-window request quota.

use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Time source for window arithmetic. Injectable so tests can move time
/// without sleeping.
pub trait Clock: Send + Sync {
    /// Milliseconds since some fixed origin. Only differences matter.
    fn now_ms(&self) -> u64;
}

/// Wall-clock time.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone)]
pub struct QuotaConfig {
    /// Window size. One hour by default.
    pub window: Duration,
    /// Upstream attempts allowed per window. Kept below the provider's
    /// free-tier ceiling of 10/hour.
    pub max_requests: u32,
}

impl QuotaConfig {
    pub fn new() -> Self {
        Self {
            window: Duration::from_secs(3600),
            max_requests: 8,
        }
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn with_max_requests(mut self, max: u32) -> Self {
        self.max_requests = max;
        self
    }
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
struct Window {
    started_at_ms: u64,
    count: u32,
}

/// Current quota state, for logging and the quota-exceeded message.
#[derive(Debug, Clone)]
pub struct QuotaSnapshot {
    pub count: u32,
    pub max_requests: u32,
    /// Minutes until the window resets, rounded up. At least 1 while the
    /// window is open.
    pub minutes_left: u64,
}

/// Fixed-window counter gating upstream provider calls.
///
/// The reset rule runs before every decision: once `now - started >= window`
/// the count drops to zero and the window restarts at `now`. `allow()` and
/// `record()` each take the lock once, so check and increment are atomic
/// individually; callers that check first and charge later accept a small
/// overshoot under concurrency, which is the conservative direction for an
/// external quota.
pub struct QuotaTracker {
    config: QuotaConfig,
    clock: Box<dyn Clock>,
    window: Mutex<Window>,
}

impl QuotaTracker {
    pub fn new(config: QuotaConfig) -> Self {
        Self::with_clock(config, Box::new(SystemClock))
    }

    pub fn with_clock(config: QuotaConfig, clock: Box<dyn Clock>) -> Self {
        let started_at_ms = clock.now_ms();
        Self {
            config,
            clock,
            window: Mutex::new(Window {
                started_at_ms,
                count: 0,
            }),
        }
    }

    fn reset_if_elapsed(&self, window: &mut Window, now_ms: u64) {
        let window_ms = self.config.window.as_millis() as u64;
        if now_ms.saturating_sub(window.started_at_ms) >= window_ms {
            debug!(count = window.count, "quota window elapsed, resetting");
            window.count = 0;
            window.started_at_ms = now_ms;
        }
    }

    fn lock_current(&self) -> std::sync::MutexGuard<'_, Window> {
        let mut window = match self.window.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let now_ms = self.clock.now_ms();
        self.reset_if_elapsed(&mut window, now_ms);
        window
    }

    /// Whether another upstream attempt fits in the current window.
    pub fn allow(&self) -> bool {
        let window = self.lock_current();
        window.count < self.config.max_requests
    }

    /// Charge one upstream attempt. Called immediately before each network
    /// attempt, including retries; never on a cache hit.
    pub fn record(&self) {
        let mut window = self.lock_current();
        window.count += 1;
        debug!(
            count = window.count,
            max = self.config.max_requests,
            "AI request charged against quota"
        );
    }

    pub fn snapshot(&self) -> QuotaSnapshot {
        let window = self.lock_current();
        let now_ms = self.clock.now_ms();
        let window_ms = self.config.window.as_millis() as u64;
        let elapsed = now_ms.saturating_sub(window.started_at_ms);
        let remaining_ms = window_ms.saturating_sub(elapsed);
        QuotaSnapshot {
            count: window.count,
            max_requests: self.config.max_requests,
            minutes_left: remaining_ms.div_ceil(60_000).max(1),
        }
    }

    /// Minutes until the window resets, for the user-facing quota message.
    pub fn minutes_left(&self) -> u64 {
        self.snapshot().minutes_left
    }

    pub fn max_requests(&self) -> u32 {
        self.config.max_requests
    }

    /// Attempts charged in the current window.
    pub fn current_count(&self) -> u32 {
        self.lock_current().count
    }
}
