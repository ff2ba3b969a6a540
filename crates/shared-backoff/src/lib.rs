#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Shared exponential backoff for many concurrent callers of one resource.
//!
//! A [`BackoffCoordinator`] sits in front of a fallible resource. Every
//! caller asks it before attempting the operation and reports back after a
//! failure. Failure reports are coalesced per backoff epoch, so a burst of
//! concurrent failures widens the window once instead of once per caller:
//!
//! - **[`BackoffCoordinator`]** - the state holder and coalescing algorithm
//! - **[`BackoffIntervals`]** - validated start, multiplier and ceiling
//! - **[`BackoffEpochToken`]** - single-use ticket passed between the two calls
//! - **[`Clock`]** - time source, with [`ManualClock`] for deterministic tests
//!
//! # Examples
//!
//! ```rust
//! use shared_backoff::prelude::*;
//! use std::time::Duration;
//!
//! let coordinator = BackoffCoordinator::new(
//!     BackoffIntervals::builder()
//!         .start_interval(Duration::from_millis(100))
//!         .max_interval(Duration::from_secs(10))
//!         .build()
//!         .unwrap(),
//! );
//!
//! let (proceed, token) = coordinator.can_proceed();
//! if proceed {
//!     let failed = true; // attempt the operation
//!     if failed {
//!         coordinator.backoff(token);
//!     }
//! }
//! ```

pub mod clock;
pub mod config;
pub mod coordinator;
pub mod error;
mod execute;
pub mod token;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{BackoffIntervals, BackoffIntervalsBuilder};
pub use coordinator::{BackoffCoordinator, BackoffSnapshot};
pub use error::{AttemptError, ConfigError};
pub use token::{BackoffEpochToken, EpochId};

/// Convenient re-exports of commonly used items.
///
/// ```rust
/// use shared_backoff::prelude::*;
/// ```
pub mod prelude {
    pub use crate::clock::{Clock, ManualClock, SystemClock};
    pub use crate::config::BackoffIntervals;
    pub use crate::coordinator::BackoffCoordinator;
    pub use crate::error::AttemptError;
    pub use crate::token::BackoffEpochToken;
}
