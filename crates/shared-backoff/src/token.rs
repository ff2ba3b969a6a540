//! Epoch identifiers and the tokens that carry them between calls.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_EPOCH: AtomicU64 = AtomicU64::new(1);

/// Identifier of one backoff epoch.
///
/// Ids are drawn from a process-wide counter, so two coordinators in the
/// same process never hand out the same id. Only equality is meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EpochId(u64);

impl EpochId {
    pub(crate) fn next() -> Self {
        Self(NEXT_EPOCH.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value, for logging.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EpochId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "epoch-{}", self.0)
    }
}

/// Ticket returned by [`BackoffCoordinator::can_proceed`](crate::BackoffCoordinator::can_proceed)
/// and handed back to [`BackoffCoordinator::backoff`](crate::BackoffCoordinator::backoff).
///
/// Exactly one token per elapsed epoch is *authorized*; only that token may
/// grow the backoff window. Tokens cannot be built outside this crate and
/// are not `Clone`, so each one is reported at most once.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "pass the token to `backoff` if the attempt fails"]
pub struct BackoffEpochToken {
    epoch: EpochId,
    authorized: bool,
}

impl BackoffEpochToken {
    pub(crate) fn authorized(epoch: EpochId) -> Self {
        Self {
            epoch,
            authorized: true,
        }
    }

    pub(crate) fn observer(epoch: EpochId) -> Self {
        Self {
            epoch,
            authorized: false,
        }
    }

    /// The epoch this token was minted in.
    pub fn epoch(&self) -> EpochId {
        self.epoch
    }

    /// Whether this token may grow the backoff window.
    pub fn is_authorized(&self) -> bool {
        self.authorized
    }
}
