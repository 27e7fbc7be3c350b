//! Retrying fallible operations until they pass.
//!
//! Unlike [`wait`](crate::wait), failure here is the retry signal. When the
//! deadline passes the last recoverable error is returned as-is rather
//! than a synthetic timeout, and errors the caller did not mark as
//! recoverable are returned on their first occurrence.

use std::time::Duration;

use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::poll::DEFAULT_INTERVAL;

/// Retry parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryOptions {
    /// Fixed pause after every recoverable failure. Not clipped to the
    /// remaining time.
    pub interval: Duration,
    /// Deadline relative to the call. `None` or zero retries forever.
    pub timeout: Option<Duration>,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            timeout: None,
        }
    }
}

impl RetryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn timeout(mut self, timeout: impl Into<Option<Duration>>) -> Self {
        self.timeout = timeout.into();
        self
    }

    pub fn effective_timeout(&self) -> Option<Duration> {
        self.timeout.filter(|t| !t.is_zero())
    }
}

/// Recoverable-error predicate that accepts every failure.
///
/// Opting into this is explicit; prefer a predicate that names the
/// transient cases so programming errors are not retried.
pub fn any_error<E>(_: &E) -> bool {
    true
}

/// Retry engine bound to a [`Clock`].
#[derive(Debug, Clone, Default)]
pub struct Retrier<C = SystemClock> {
    clock: C,
    options: RetryOptions,
}

impl Retrier<SystemClock> {
    pub fn new(options: RetryOptions) -> Self {
        Self::with_clock(options, SystemClock)
    }
}

impl<C: Clock> Retrier<C> {
    pub fn with_clock(options: RetryOptions, clock: C) -> Self {
        Self { clock, options }
    }

    pub fn options(&self) -> &RetryOptions {
        &self.options
    }

    /// Call `operation` until it returns `Ok`.
    ///
    /// `is_recoverable` decides which errors are retried. The operation
    /// always runs at least once before the deadline is consulted.
    pub fn run<T, E, F, R>(&self, mut operation: F, is_recoverable: R) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
        R: Fn(&E) -> bool,
    {
        let start = self.clock.now();
        let deadline = self
            .options
            .effective_timeout()
            .and_then(|timeout| start.checked_add(timeout));

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let err = match operation() {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(attempt, "operation passed after retries");
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            if !is_recoverable(&err) {
                debug!(attempt, "operation failed with unrecoverable error");
                return Err(err);
            }

            if deadline.is_some_and(|d| self.clock.now() >= d) {
                warn!(attempt, "retry deadline passed, returning last error");
                return Err(err);
            }

            debug!(
                attempt,
                sleep_ms = self.options.interval.as_millis() as u64,
                "recoverable failure, retrying"
            );
            self.clock.sleep(self.options.interval);
        }
    }
}

/// Retry `operation` on the system clock until it passes, the deadline
/// passes, or it fails with an error `is_recoverable` rejects.
///
/// ```no_run
/// use std::time::Duration;
/// use standby::{wait_pass, RetryOptions};
///
/// let opts = RetryOptions::new()
///     .interval(Duration::from_secs(1))
///     .timeout(Duration::from_secs(30));
/// let marker = wait_pass(
///     || std::fs::read_to_string("/var/run/node/ready"),
///     |e: &std::io::Error| e.kind() == std::io::ErrorKind::NotFound,
///     &opts,
/// )?;
/// println!("node ready: {}", marker.trim());
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn wait_pass<T, E, F, R>(operation: F, is_recoverable: R, options: &RetryOptions) -> Result<T, E>
where
    F: FnMut() -> Result<T, E>,
    R: Fn(&E) -> bool,
{
    Retrier::with_clock(options.clone(), SystemClock).run(operation, is_recoverable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[derive(Debug, Clone, PartialEq)]
    enum NodeError {
        NotBooted(u32),
        BadCredentials,
    }

    fn transient(e: &NodeError) -> bool {
        matches!(e, NodeError::NotBooted(_))
    }

    #[test]
    fn first_success_returns_without_sleeping() {
        let clock = ManualClock::new();
        let retrier = Retrier::with_clock(RetryOptions::new(), &clock);
        let value = retrier.run(|| Ok::<_, NodeError>(42), transient).unwrap();
        assert_eq!(value, 42);
        assert!(clock.sleeps().is_empty());
    }

    #[test]
    fn succeeds_after_recoverable_failures() {
        let clock = ManualClock::new();
        let retrier = Retrier::with_clock(RetryOptions::new().interval(secs(1)), &clock);
        let mut calls = 0;
        let value = retrier
            .run(
                || {
                    calls += 1;
                    if calls < 3 { Err(NodeError::NotBooted(calls)) } else { Ok("up") }
                },
                transient,
            )
            .unwrap();
        assert_eq!(value, "up");
        assert_eq!(clock.sleeps(), vec![secs(1), secs(1)]);
    }

    #[test]
    fn deadline_returns_last_original_error() {
        let clock = ManualClock::new();
        let opts = RetryOptions::new().interval(secs(1)).timeout(secs(2));
        let retrier = Retrier::with_clock(opts, &clock);
        let mut calls = 0;
        let err = retrier
            .run(
                || -> Result<(), _> {
                    calls += 1;
                    Err(NodeError::NotBooted(calls))
                },
                transient,
            )
            .unwrap_err();
        assert_eq!(err, NodeError::NotBooted(3));
        assert_eq!(clock.elapsed(), secs(2));
    }

    #[test]
    fn unrecoverable_error_propagates_immediately() {
        let clock = ManualClock::new();
        let opts = RetryOptions::new().interval(secs(1)).timeout(secs(2));
        let retrier = Retrier::with_clock(opts, &clock);
        let mut calls = 0;
        let err = retrier
            .run(
                || -> Result<(), _> {
                    calls += 1;
                    Err(NodeError::BadCredentials)
                },
                transient,
            )
            .unwrap_err();
        assert_eq!(err, NodeError::BadCredentials);
        assert_eq!(calls, 1);
        assert!(clock.sleeps().is_empty());
    }

    #[test]
    fn interval_is_not_clipped_to_deadline() {
        let clock = ManualClock::new();
        let opts = RetryOptions::new().interval(secs(5)).timeout(secs(7));
        let retrier = Retrier::with_clock(opts, &clock);
        let err = retrier
            .run(|| Err::<(), _>(NodeError::NotBooted(0)), transient)
            .unwrap_err();
        assert_eq!(err, NodeError::NotBooted(0));
        assert_eq!(clock.sleeps(), vec![secs(5), secs(5)]);
        assert_eq!(clock.elapsed(), secs(10));
    }

    #[test]
    fn zero_timeout_is_unbounded() {
        let clock = ManualClock::new();
        let opts = RetryOptions::new().interval(secs(60)).timeout(Duration::ZERO);
        let retrier = Retrier::with_clock(opts, &clock);
        let mut calls = 0;
        let value = retrier
            .run(
                || {
                    calls += 1;
                    if calls < 50 { Err(NodeError::NotBooted(calls)) } else { Ok(calls) }
                },
                any_error,
            )
            .unwrap();
        assert_eq!(value, 50);
        assert_eq!(clock.elapsed(), secs(49 * 60));
    }

    #[test]
    fn operation_runs_once_even_with_expired_deadline() {
        let clock = ManualClock::new();
        let opts = RetryOptions::new().timeout(Duration::from_nanos(1));
        let retrier = Retrier::with_clock(opts, &clock);
        let mut calls = 0;
        let err = retrier
            .run(
                || -> Result<(), _> {
                    calls += 1;
                    clock.advance(secs(1));
                    Err(NodeError::NotBooted(calls))
                },
                any_error,
            )
            .unwrap_err();
        assert_eq!(err, NodeError::NotBooted(1));
        assert_eq!(calls, 1);
    }

    #[test]
    fn default_options_are_unbounded() {
        let opts = RetryOptions::default();
        assert_eq!(opts.interval, secs(5));
        assert_eq!(opts.effective_timeout(), None);
    }
}
