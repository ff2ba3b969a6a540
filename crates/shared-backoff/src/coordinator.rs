//! The shared backoff coordinator.

use crate::clock::{Clock, SystemClock};
use crate::config::BackoffIntervals;
use crate::token::{BackoffEpochToken, EpochId};
use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// Exponential backoff shared by every caller of one protected resource.
///
/// Callers ask [`can_proceed`](Self::can_proceed) before each attempt and
/// report failures with [`backoff`](Self::backoff), passing back the token
/// they were given. Failure reports are coalesced: however many callers
/// fail during one window, the window grows at most once per elapsed
/// epoch, because only the caller that observes the window elapsing
/// receives an authorized token.
///
/// # State machine
///
/// ```text
/// Idle   --backoff(any)------------------> Active (start_interval, increments = 0)
/// Active --can_proceed, deadline passed--> Idle   (mints one authorized token)
/// Active --backoff(observer)-------------> Active (unchanged)
/// Active --backoff(authorized)-----------> Active (grown window, increments + 1)
/// ```
///
/// All state sits behind one mutex and every operation is a short
/// critical section; nothing inside the lock blocks or awaits.
///
/// # Examples
///
/// ```rust
/// use shared_backoff::{BackoffCoordinator, BackoffIntervals};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let coordinator = Arc::new(BackoffCoordinator::new(
///     BackoffIntervals::new(Duration::from_millis(100), 2.0, Duration::from_secs(5)).unwrap(),
/// ));
///
/// let (proceed, token) = coordinator.can_proceed();
/// assert!(proceed);
///
/// // the attempt failed
/// coordinator.backoff(token);
/// assert!(coordinator.is_backing_off());
/// ```
#[derive(Debug)]
pub struct BackoffCoordinator<C = SystemClock> {
    intervals: BackoffIntervals,
    clock: C,
    state: Mutex<State>,
}

#[derive(Debug)]
struct State {
    /// `None` while idle.
    backoff_until: Option<Instant>,
    increments: u64,
    current_epoch: EpochId,
}

impl State {
    fn in_backoff(&self) -> bool {
        self.backoff_until.is_some()
    }

    fn elapsed(&self, now: Instant) -> bool {
        self.backoff_until.is_some_and(|until| until <= now)
    }

    fn remaining(&self, now: Instant) -> Option<Duration> {
        self.backoff_until
            .map(|until| until.saturating_duration_since(now))
    }
}

/// Point-in-time view of a coordinator's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffSnapshot {
    /// Deadline of the current window, `None` while idle.
    pub backoff_until: Option<Instant>,
    /// Time left in the current window. `Some(ZERO)` once the deadline has
    /// passed but no caller has observed it yet.
    pub remaining: Option<Duration>,
    /// Increments applied since the window was last opened from idle.
    pub increments: u64,
    /// The live epoch.
    pub epoch: EpochId,
}

impl BackoffSnapshot {
    /// Whether the coordinator was idle.
    pub fn is_idle(&self) -> bool {
        self.backoff_until.is_none()
    }
}

impl BackoffCoordinator<SystemClock> {
    /// Create a coordinator driven by the system clock.
    pub fn new(intervals: BackoffIntervals) -> Self {
        Self::with_clock(intervals, SystemClock)
    }
}

impl<C: Clock> BackoffCoordinator<C> {
    /// Create a coordinator driven by `clock`.
    pub fn with_clock(intervals: BackoffIntervals, clock: C) -> Self {
        Self {
            intervals,
            clock,
            state: Mutex::new(State {
                backoff_until: None,
                increments: 0,
                current_epoch: EpochId::next(),
            }),
        }
    }

    /// Decide whether the caller may attempt the protected operation.
    ///
    /// Returns `true` when idle or when the current window has elapsed.
    /// The caller that observes the window elapsing moves the coordinator
    /// back to idle and receives the epoch's single authorized token; every
    /// other caller receives an observer token for the live epoch.
    ///
    /// The elapse check and the mint happen under one lock, so concurrent
    /// callers cannot both be authorized for the same epoch.
    pub fn can_proceed(&self) -> (bool, BackoffEpochToken) {
        let mut state = self.state.lock();
        let now = self.clock.now();

        let in_backoff = state.in_backoff();
        let proceed = !in_backoff || state.elapsed(now);

        if proceed && in_backoff {
            let epoch = EpochId::next();
            state.backoff_until = None;
            state.current_epoch = epoch;

            tracing::debug!(%epoch, increments = state.increments, "backoff window elapsed");
            return (true, BackoffEpochToken::authorized(epoch));
        }

        (proceed, BackoffEpochToken::observer(state.current_epoch))
    }

    /// Report that an attempt made with `token` failed.
    ///
    /// - Observer token while backing off: ignored, another caller already
    ///   holds (or held) the right to grow the window.
    /// - Observer token while idle: opens a window of `start_interval` and
    ///   resets the increment counter.
    /// - Authorized token: opens a window of
    ///   [`BackoffIntervals::window_for`] the current increment count and
    ///   increments the counter.
    pub fn backoff(&self, token: BackoffEpochToken) {
        let mut state = self.state.lock();

        if state.in_backoff() && !token.is_authorized() {
            tracing::trace!(epoch = %token.epoch(), "redundant failure report ignored");
            return;
        }

        let now = self.clock.now();
        self.start_or_increment(&mut state, token, now);
    }

    fn start_or_increment(&self, state: &mut State, token: BackoffEpochToken, now: Instant) {
        if token.is_authorized() {
            if token.epoch() != state.current_epoch {
                tracing::debug!(
                    token_epoch = %token.epoch(),
                    current_epoch = %state.current_epoch,
                    "authorized token from a superseded epoch"
                );
            }

            let window = self.intervals.window_for(state.increments);
            state.backoff_until = Some(deadline(now, window));
            state.increments = state.increments.saturating_add(1);

            tracing::debug!(
                epoch = %token.epoch(),
                ?window,
                increments = state.increments,
                "backoff window grown"
            );
        } else {
            let window = self.intervals.start_interval();
            state.backoff_until = Some(deadline(now, window));
            state.increments = 0;

            tracing::debug!(epoch = %state.current_epoch, ?window, "entering backoff");
        }
    }

    /// Whether a window is open (including one that has elapsed but not
    /// yet been observed by [`can_proceed`](Self::can_proceed)).
    pub fn is_backing_off(&self) -> bool {
        self.state.lock().in_backoff()
    }

    /// Time left in the current window, `None` while idle.
    pub fn remaining(&self) -> Option<Duration> {
        let state = self.state.lock();
        state.remaining(self.clock.now())
    }

    /// Increments applied since the window was last opened from idle.
    pub fn increments(&self) -> u64 {
        self.state.lock().increments
    }

    /// Read the whole state at once.
    pub fn snapshot(&self) -> BackoffSnapshot {
        let state = self.state.lock();
        BackoffSnapshot {
            backoff_until: state.backoff_until,
            remaining: state.remaining(self.clock.now()),
            increments: state.increments,
            epoch: state.current_epoch,
        }
    }

    /// The configured intervals.
    pub fn intervals(&self) -> &BackoffIntervals {
        &self.intervals
    }
}

// Validated intervals never exceed MAX_SUPPORTED_INTERVAL, so the fallback
// only guards clocks that hand out instants near the platform limit.
fn deadline(now: Instant, window: Duration) -> Instant {
    now.checked_add(window).unwrap_or(now)
}
