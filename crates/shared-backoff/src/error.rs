//! Error types for interval configuration and guarded attempts.

use std::time::Duration;

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Reasons a [`BackoffIntervals`](crate::config::BackoffIntervals) value is rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// The start interval was zero.
    #[error("start interval must be greater than zero")]
    ZeroStartInterval,

    /// The max interval was zero.
    #[error("max interval must be greater than zero")]
    ZeroMaxInterval,

    /// The multiplier was NaN, infinite, zero or negative.
    #[error("multiplier must be finite and positive, got {0}")]
    InvalidMultiplier(f64),

    /// An interval exceeded [`MAX_SUPPORTED_INTERVAL`](crate::config::MAX_SUPPORTED_INTERVAL).
    #[error("interval {interval:?} exceeds the supported maximum of {limit:?}")]
    IntervalTooLarge {
        /// The offending interval.
        interval: Duration,
        /// The largest accepted interval.
        limit: Duration,
    },

    /// An environment variable was set but could not be parsed.
    #[error("environment variable {var} has invalid value {value:?}")]
    InvalidEnvVar {
        /// Name of the variable.
        var: String,
        /// Raw value that failed to parse.
        value: String,
    },
}

/// Outcome of an attempt guarded by a coordinator that did not succeed.
///
/// Returned by [`BackoffCoordinator::execute`](crate::BackoffCoordinator::execute)
/// and its siblings.
#[derive(Debug, thiserror::Error)]
pub enum AttemptError<E> {
    /// The coordinator is backing off; the operation was not run.
    #[error("backing off, {remaining:?} remaining")]
    BackingOff {
        /// Time left until the current window elapses.
        remaining: Duration,
    },

    /// The operation ran and failed.
    #[error("operation failed")]
    Operation(#[source] E),
}

impl<E> AttemptError<E> {
    /// Whether the attempt was refused without running the operation.
    pub fn is_backing_off(&self) -> bool {
        matches!(self, AttemptError::BackingOff { .. })
    }

    /// Extract the operation error, if the operation ran.
    pub fn into_operation(self) -> Option<E> {
        match self {
            AttemptError::Operation(err) => Some(err),
            AttemptError::BackingOff { .. } => None,
        }
    }
}
