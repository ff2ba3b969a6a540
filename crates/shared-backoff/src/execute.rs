//! Guarded attempts: ask, run, report.
//!
//! These helpers wrap the `can_proceed` / attempt / `backoff` sequence so
//! callers cannot forget to hand the token back. They never sleep or loop;
//! a refused attempt returns [`AttemptError::BackingOff`] immediately and
//! the caller decides whether to defer or drop the work.

use crate::clock::Clock;
use crate::coordinator::BackoffCoordinator;
use crate::error::AttemptError;
use std::future::Future;
use std::time::Duration;

impl<C: Clock> BackoffCoordinator<C> {
    /// Run an async operation if the coordinator allows it, reporting any
    /// error as a failure.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use shared_backoff::{AttemptError, BackoffCoordinator, BackoffIntervals};
    ///
    /// # async fn example() {
    /// let coordinator = BackoffCoordinator::new(BackoffIntervals::default());
    ///
    /// let result = coordinator
    ///     .execute(|| async { Err::<(), _>(std::io::Error::other("unavailable")) })
    ///     .await;
    /// assert!(matches!(result, Err(AttemptError::Operation(_))));
    ///
    /// // the failure opened a window, so the next attempt is refused
    /// let result = coordinator.execute(|| async { Ok::<_, std::io::Error>(42) }).await;
    /// assert!(matches!(result, Err(AttemptError::BackingOff { .. })));
    /// # }
    /// ```
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T, AttemptError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.execute_if(operation, |_| true).await
    }

    /// Like [`execute`](Self::execute), but only errors for which
    /// `counts_as_failure` returns `true` are reported to the coordinator.
    ///
    /// Use this to keep errors that say nothing about the resource's health
    /// (bad input, authorization) from widening the window.
    pub async fn execute_if<F, Fut, T, E, P>(
        &self,
        operation: F,
        counts_as_failure: P,
    ) -> Result<T, AttemptError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: FnOnce(&E) -> bool,
    {
        let (proceed, token) = self.can_proceed();
        if !proceed {
            return Err(self.refused());
        }

        // The lock is not held across this await.
        match operation().await {
            Ok(value) => Ok(value),
            Err(err) => {
                if counts_as_failure(&err) {
                    self.backoff(token);
                }
                Err(AttemptError::Operation(err))
            }
        }
    }

    /// Synchronous counterpart of [`execute`](Self::execute).
    pub fn call<F, T, E>(&self, operation: F) -> Result<T, AttemptError<E>>
    where
        F: FnOnce() -> Result<T, E>,
    {
        self.call_if(operation, |_| true)
    }

    /// Synchronous counterpart of [`execute_if`](Self::execute_if).
    pub fn call_if<F, T, E, P>(&self, operation: F, counts_as_failure: P) -> Result<T, AttemptError<E>>
    where
        F: FnOnce() -> Result<T, E>,
        P: FnOnce(&E) -> bool,
    {
        let (proceed, token) = self.can_proceed();
        if !proceed {
            return Err(self.refused());
        }

        operation().map_err(|err| {
            if counts_as_failure(&err) {
                self.backoff(token);
            }
            AttemptError::Operation(err)
        })
    }

    fn refused<E>(&self) -> AttemptError<E> {
        AttemptError::BackingOff {
            remaining: self.remaining().unwrap_or(Duration::ZERO),
        }
    }
}
