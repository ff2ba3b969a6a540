//! Time sources for the coordinator.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A source of monotonic time.
///
/// The coordinator reads the clock inside its critical section, so
/// implementations must return immediately.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> Instant;
}

/// The monotonic system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same time, so a test can keep one handle and give
/// another to the coordinator.
///
/// # Examples
///
/// ```rust
/// use shared_backoff::{BackoffCoordinator, BackoffIntervals, ManualClock};
/// use std::time::Duration;
///
/// let clock = ManualClock::new();
/// let coordinator = BackoffCoordinator::with_clock(BackoffIntervals::default(), clock.clone());
///
/// let (_, token) = coordinator.can_proceed();
/// coordinator.backoff(token);
/// assert!(!coordinator.can_proceed().0);
///
/// clock.advance(Duration::from_secs(1));
/// assert!(coordinator.can_proceed().0);
/// ```
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    /// Create a clock frozen at the current instant.
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// Create a clock frozen at `start`.
    pub fn starting_at(start: Instant) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }

    /// Jump to `instant`. Moving backwards is allowed.
    pub fn set(&self, instant: Instant) {
        *self.now.lock() = instant;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}
