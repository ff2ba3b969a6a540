//! Backoff interval configuration.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default length of the first backoff window.
pub const DEFAULT_START_INTERVAL: Duration = Duration::from_secs(1);

/// Default growth factor applied per increment.
pub const DEFAULT_MULTIPLIER: f64 = 2.0;

/// Default ceiling on grown windows.
pub const DEFAULT_MAX_INTERVAL: Duration = Duration::from_secs(60);

/// Largest interval accepted for either bound (100 years).
///
/// Keeps `Instant + interval` representable on every supported platform.
pub const MAX_SUPPORTED_INTERVAL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Immutable interval configuration for a [`BackoffCoordinator`](crate::BackoffCoordinator).
///
/// Windows grow linearly in the number of increments, scaled by `multiplier`:
///
/// ```text
/// n      = max(increments, 1)
/// window = min(start_interval * multiplier * n, max_interval)
/// ```
///
/// The window opened from idle is always exactly `start_interval`, even
/// when `max_interval` is smaller; only grown windows are capped.
///
/// Values can only be obtained through validated constructors, so every
/// `BackoffIntervals` has non-zero durations, a finite positive multiplier
/// and both durations within [`MAX_SUPPORTED_INTERVAL`]. Multipliers below
/// `1.0` are accepted and produce windows that do not grow.
///
/// # Examples
///
/// ```rust
/// use shared_backoff::BackoffIntervals;
/// use std::time::Duration;
///
/// let intervals = BackoffIntervals::builder()
///     .start_interval(Duration::from_millis(500))
///     .multiplier(2.0)
///     .max_interval(Duration::from_secs(30))
///     .build()
///     .unwrap();
///
/// assert_eq!(intervals.window_for(1), Duration::from_secs(1));
/// assert_eq!(intervals.window_for(1_000), Duration::from_secs(30));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "IntervalsRepr", into = "IntervalsRepr")]
pub struct BackoffIntervals {
    start_interval: Duration,
    multiplier: f64,
    max_interval: Duration,
}

impl BackoffIntervals {
    /// Create validated intervals.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if either duration is zero or larger than
    /// [`MAX_SUPPORTED_INTERVAL`], or if `multiplier` is not finite and positive.
    pub fn new(start_interval: Duration, multiplier: f64, max_interval: Duration) -> Result<Self> {
        if start_interval.is_zero() {
            return Err(ConfigError::ZeroStartInterval);
        }
        if max_interval.is_zero() {
            return Err(ConfigError::ZeroMaxInterval);
        }
        if !multiplier.is_finite() || multiplier <= 0.0 {
            return Err(ConfigError::InvalidMultiplier(multiplier));
        }
        for interval in [start_interval, max_interval] {
            if interval > MAX_SUPPORTED_INTERVAL {
                return Err(ConfigError::IntervalTooLarge {
                    interval,
                    limit: MAX_SUPPORTED_INTERVAL,
                });
            }
        }

        Ok(Self {
            start_interval,
            multiplier,
            max_interval,
        })
    }

    /// Create a new builder, starting from the defaults.
    pub fn builder() -> BackoffIntervalsBuilder {
        BackoffIntervalsBuilder::default()
    }

    /// Load intervals from environment variables.
    ///
    /// This will look for:
    /// - `{prefix}_START_INTERVAL_MS` for the start interval in milliseconds
    /// - `{prefix}_MULTIPLIER` for the growth factor
    /// - `{prefix}_MAX_INTERVAL_MS` for the ceiling in milliseconds
    ///
    /// Unset variables fall back to the defaults.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidEnvVar`] if a variable is set but unparseable,
    /// or any validation error from [`BackoffIntervals::new`].
    #[cfg(feature = "env")]
    pub fn from_env(prefix: &str) -> Result<Self> {
        let mut builder = Self::builder();

        if let Some(ms) = read_env::<u64>(&format!("{prefix}_START_INTERVAL_MS"))? {
            builder = builder.start_interval(Duration::from_millis(ms));
        }
        if let Some(multiplier) = read_env::<f64>(&format!("{prefix}_MULTIPLIER"))? {
            builder = builder.multiplier(multiplier);
        }
        if let Some(ms) = read_env::<u64>(&format!("{prefix}_MAX_INTERVAL_MS"))? {
            builder = builder.max_interval(Duration::from_millis(ms));
        }

        builder.build()
    }

    /// Length of the window opened from idle.
    pub fn start_interval(&self) -> Duration {
        self.start_interval
    }

    /// Growth factor per increment.
    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Ceiling on grown windows.
    pub fn max_interval(&self) -> Duration {
        self.max_interval
    }

    /// Window length applied by an authorized report when the coordinator
    /// has recorded `increments` increments so far.
    ///
    /// The product is computed in `f64` and clamped to `max_interval`
    /// before converting back, so it cannot wrap for any `increments`.
    pub fn window_for(&self, increments: u64) -> Duration {
        let n = increments.max(1) as f64;
        let candidate = self.start_interval.as_secs_f64() * self.multiplier * n;

        if !candidate.is_finite() || candidate >= self.max_interval.as_secs_f64() {
            return self.max_interval;
        }

        Duration::try_from_secs_f64(candidate)
            .map_or(self.max_interval, |window| window.min(self.max_interval))
    }
}

impl Default for BackoffIntervals {
    /// Defaults:
    /// - `start_interval`: 1s
    /// - `multiplier`: 2.0
    /// - `max_interval`: 60s
    fn default() -> Self {
        Self {
            start_interval: DEFAULT_START_INTERVAL,
            multiplier: DEFAULT_MULTIPLIER,
            max_interval: DEFAULT_MAX_INTERVAL,
        }
    }
}

#[cfg(feature = "env")]
fn read_env<T: std::str::FromStr>(var: &str) -> Result<Option<T>> {
    let Ok(value) = std::env::var(var) else {
        return Ok(None);
    };

    let parsed = value.trim().parse::<T>();
    parsed.map(Some).map_err(|_| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        value,
    })
}

/// Builder for [`BackoffIntervals`].
///
/// Unset fields use [`DEFAULT_START_INTERVAL`], [`DEFAULT_MULTIPLIER`] and
/// [`DEFAULT_MAX_INTERVAL`].
#[derive(Debug, Default)]
pub struct BackoffIntervalsBuilder {
    start_interval: Option<Duration>,
    multiplier: Option<f64>,
    max_interval: Option<Duration>,
}

impl BackoffIntervalsBuilder {
    /// Set the length of the first backoff window.
    ///
    /// Default: 1s
    pub fn start_interval(mut self, interval: Duration) -> Self {
        self.start_interval = Some(interval);
        self
    }

    /// Set the growth factor.
    ///
    /// Default: 2.0
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = Some(multiplier);
        self
    }

    /// Set the ceiling on grown windows.
    ///
    /// Default: 60s
    pub fn max_interval(mut self, interval: Duration) -> Self {
        self.max_interval = Some(interval);
        self
    }

    /// Validate and build the intervals.
    pub fn build(self) -> Result<BackoffIntervals> {
        BackoffIntervals::new(
            self.start_interval.unwrap_or(DEFAULT_START_INTERVAL),
            self.multiplier.unwrap_or(DEFAULT_MULTIPLIER),
            self.max_interval.unwrap_or(DEFAULT_MAX_INTERVAL),
        )
    }
}

/// Wire form: whole milliseconds, missing fields take the defaults.
#[derive(Serialize, Deserialize)]
struct IntervalsRepr {
    #[serde(default = "default_start_ms")]
    start_interval_ms: u64,
    #[serde(default = "default_multiplier")]
    multiplier: f64,
    #[serde(default = "default_max_ms")]
    max_interval_ms: u64,
}

fn default_start_ms() -> u64 {
    DEFAULT_START_INTERVAL.as_millis() as u64
}

fn default_multiplier() -> f64 {
    DEFAULT_MULTIPLIER
}

fn default_max_ms() -> u64 {
    DEFAULT_MAX_INTERVAL.as_millis() as u64
}

impl TryFrom<IntervalsRepr> for BackoffIntervals {
    type Error = ConfigError;

    fn try_from(repr: IntervalsRepr) -> Result<Self> {
        BackoffIntervals::new(
            Duration::from_millis(repr.start_interval_ms),
            repr.multiplier,
            Duration::from_millis(repr.max_interval_ms),
        )
    }
}

impl From<BackoffIntervals> for IntervalsRepr {
    fn from(intervals: BackoffIntervals) -> Self {
        // Both bounds are within MAX_SUPPORTED_INTERVAL, far below u64::MAX ms.
        Self {
            start_interval_ms: intervals.start_interval.as_millis() as u64,
            multiplier: intervals.multiplier,
            max_interval_ms: intervals.max_interval.as_millis() as u64,
        }
    }
}
