//! Condition polling with a fixed deadline.
//!
//! [`wait`] re-evaluates a zero-argument predicate until its value is
//! truthy (see [`Outcome`]) or the deadline computed at entry passes.
//! Sleeps between attempts are clipped so the engine never sleeps past
//! the deadline.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::WaitError;

/// Default pause between predicate evaluations.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);
/// Default polling deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
/// Default message carried by [`WaitError::Timeout`].
pub const DEFAULT_TIMEOUT_MESSAGE: &str = "Waiting timed out";

/// Truthiness of a predicate's value.
pub trait Outcome {
    fn is_ready(&self) -> bool;
}

impl Outcome for bool {
    fn is_ready(&self) -> bool {
        *self
    }
}

impl<T> Outcome for Option<T> {
    fn is_ready(&self) -> bool {
        self.is_some()
    }
}

impl<T> Outcome for Vec<T> {
    fn is_ready(&self) -> bool {
        !self.is_empty()
    }
}

impl Outcome for String {
    fn is_ready(&self) -> bool {
        !self.is_empty()
    }
}

impl Outcome for &str {
    fn is_ready(&self) -> bool {
        !self.is_empty()
    }
}

macro_rules! nonzero_outcome {
    ($($t:ty),*) => {
        $(impl Outcome for $t {
            fn is_ready(&self) -> bool {
                *self != 0
            }
        })*
    };
}

nonzero_outcome!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

/// Polling parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitOptions {
    /// Upper bound on the pause between evaluations.
    pub interval: Duration,
    /// Deadline relative to the call. `None` or zero evaluates the
    /// predicate exactly once and returns its raw value.
    pub timeout: Option<Duration>,
    /// Text of the [`WaitError::Timeout`] raised at the deadline.
    pub timeout_message: String,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            timeout: Some(DEFAULT_TIMEOUT),
            timeout_message: DEFAULT_TIMEOUT_MESSAGE.to_string(),
        }
    }
}

impl WaitOptions {
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

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.timeout_message = message.into();
        self
    }

    /// The timeout if it is set and non-zero.
    pub fn effective_timeout(&self) -> Option<Duration> {
        self.timeout.filter(|t| !t.is_zero())
    }
}

/// What a successful [`wait`] produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome<T> {
    /// Timeout was falsy: the predicate ran once and this is its raw
    /// value, truthy or not.
    Checked(T),
    /// The predicate became truthy before the deadline.
    Ready {
        /// Time left before the deadline would have struck.
        remaining: Duration,
        value: T,
    },
}

impl<T> WaitOutcome<T> {
    /// Remaining time, `None` for a single unbounded check.
    pub fn remaining(&self) -> Option<Duration> {
        match self {
            WaitOutcome::Checked(_) => None,
            WaitOutcome::Ready { remaining, .. } => Some(*remaining),
        }
    }

    pub fn value(&self) -> &T {
        match self {
            WaitOutcome::Checked(value) | WaitOutcome::Ready { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            WaitOutcome::Checked(value) | WaitOutcome::Ready { value, .. } => value,
        }
    }
}

impl<T: Outcome> WaitOutcome<T> {
    /// Whether the predicate's final value was truthy.
    pub fn is_ready(&self) -> bool {
        self.value().is_ready()
    }
}

/// Polling engine bound to a [`Clock`].
#[derive(Debug, Clone, Default)]
pub struct Poller<C = SystemClock> {
    clock: C,
    options: WaitOptions,
}

impl Poller<SystemClock> {
    pub fn new(options: WaitOptions) -> Self {
        Self::with_clock(options, SystemClock)
    }
}

impl<C: Clock> Poller<C> {
    pub fn with_clock(options: WaitOptions, clock: C) -> Self {
        Self { clock, options }
    }

    pub fn options(&self) -> &WaitOptions {
        &self.options
    }

    /// Poll an infallible predicate.
    pub fn wait<T, F>(&self, mut predicate: F) -> Result<WaitOutcome<T>, WaitError>
    where
        T: Outcome,
        F: FnMut() -> T,
    {
        self.try_wait(|| Ok::<_, WaitError>(predicate()))
    }

    /// Poll a fallible predicate. An `Err` from the predicate ends the
    /// wait immediately and is returned unchanged.
    pub fn try_wait<T, E, F>(&self, mut predicate: F) -> Result<WaitOutcome<T>, E>
    where
        T: Outcome,
        E: From<WaitError>,
        F: FnMut() -> Result<T, E>,
    {
        let start = self.clock.now();
        let Some(timeout) = self.options.effective_timeout() else {
            return predicate().map(WaitOutcome::Checked);
        };
        // An unrepresentable deadline never expires.
        let deadline = start.checked_add(timeout);

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let value = predicate()?;
            let now = self.clock.now();

            if value.is_ready() {
                let remaining = time_left(deadline, now).unwrap_or(timeout);
                debug!(attempt, remaining_ms = remaining.as_millis() as u64, "wait satisfied");
                return Ok(WaitOutcome::Ready { remaining, value });
            }

            let pause = match time_left(deadline, now) {
                Some(left) if left.is_zero() => {
                    warn!(
                        attempt,
                        timeout_ms = timeout.as_millis() as u64,
                        message = %self.options.timeout_message,
                        "wait timed out"
                    );
                    return Err(WaitError::Timeout(self.options.timeout_message.clone()).into());
                }
                Some(left) => self.options.interval.min(left),
                None => self.options.interval,
            };

            debug!(attempt, sleep_ms = pause.as_millis() as u64, "predicate not ready");
            self.clock.sleep(pause);
        }
    }
}

/// Time until `deadline`, zero once it has passed, `None` when unbounded.
fn time_left(deadline: Option<Instant>, now: Instant) -> Option<Duration> {
    deadline.map(|d| d.saturating_duration_since(now))
}

/// Wait until `predicate` returns a truthy value, using the system clock.
///
/// With a falsy timeout the predicate runs exactly once and its value is
/// returned as [`WaitOutcome::Checked`] without sleeping.
///
/// ```no_run
/// use std::time::Duration;
/// use standby::{wait, tcp_ping, WaitOptions};
///
/// let opts = WaitOptions::new()
///     .interval(Duration::from_secs(2))
///     .timeout(Duration::from_secs(180))
///     .message("Node 10.109.0.2 is not accessible by SSH.");
/// wait(|| tcp_ping("10.109.0.2", 22u16, None).unwrap_or(false), &opts)?;
/// # Ok::<(), standby::WaitError>(())
/// ```
pub fn wait<T, F>(predicate: F, options: &WaitOptions) -> Result<WaitOutcome<T>, WaitError>
where
    T: Outcome,
    F: FnMut() -> T,
{
    Poller::with_clock(options.clone(), SystemClock).wait(predicate)
}

/// [`wait`] for predicates that can fail; errors propagate on first
/// occurrence.
pub fn try_wait<T, E, F>(predicate: F, options: &WaitOptions) -> Result<WaitOutcome<T>, E>
where
    T: Outcome,
    E: From<WaitError>,
    F: FnMut() -> Result<T, E>,
{
    Poller::with_clock(options.clone(), SystemClock).try_wait(predicate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn falsy_timeout_checks_once_and_returns_raw_value() {
        for timeout in [None, Some(Duration::ZERO)] {
            let clock = ManualClock::new();
            let poller = Poller::with_clock(WaitOptions::new().timeout(timeout), &clock);
            let mut calls = 0;
            let outcome = poller
                .wait(|| {
                    calls += 1;
                    false
                })
                .unwrap();
            assert_eq!(outcome, WaitOutcome::Checked(false));
            assert!(!outcome.is_ready());
            assert_eq!(calls, 1);
            assert!(clock.sleeps().is_empty());
        }
    }

    #[test]
    fn falsy_timeout_returns_value_of_any_type() {
        let clock = ManualClock::new();
        let poller = Poller::with_clock(WaitOptions::new().timeout(None), &clock);
        let outcome = poller.wait(|| Some("10.109.0.2")).unwrap();
        assert_eq!(outcome.into_value(), Some("10.109.0.2"));
    }

    #[test]
    fn immediate_success_returns_full_timeout() {
        let clock = ManualClock::new();
        let poller = Poller::with_clock(WaitOptions::new().timeout(secs(10)), &clock);
        let outcome = poller.wait(|| true).unwrap();
        assert_eq!(outcome.remaining(), Some(secs(10)));
        assert!(clock.sleeps().is_empty());
    }

    #[test]
    fn never_ready_times_out_with_message() {
        let clock = ManualClock::new();
        let opts = WaitOptions::new().interval(secs(1)).timeout(secs(3)).message("x");
        let poller = Poller::with_clock(opts, &clock);
        let mut calls = 0;
        let err = poller
            .wait(|| {
                calls += 1;
                false
            })
            .unwrap_err();
        assert_eq!(err, WaitError::Timeout("x".into()));
        assert_eq!(clock.elapsed(), secs(3));
        assert_eq!(clock.sleeps(), vec![secs(1), secs(1), secs(1)]);
        assert_eq!(calls, 4);
    }

    #[test]
    fn sleep_is_clipped_to_deadline() {
        let clock = ManualClock::new();
        let opts = WaitOptions::new().interval(secs(5)).timeout(secs(7));
        let poller = Poller::with_clock(opts, &clock);
        let err = poller.wait(|| 0u32).unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(clock.sleeps(), vec![secs(5), secs(2)]);
        assert!(clock.elapsed() <= secs(7));
    }

    #[test]
    fn predicate_time_counts_against_deadline() {
        let clock = ManualClock::new();
        let opts = WaitOptions::new().interval(secs(2)).timeout(secs(5));
        let poller = Poller::with_clock(opts, &clock);
        let err = poller
            .wait(|| {
                clock.advance(Duration::from_millis(1500));
                false
            })
            .unwrap_err();
        assert!(err.is_timeout());
        // 1.5 + 2 + 1.5 leaves 0 -> no further sleep; total stays within the deadline.
        assert_eq!(clock.sleeps(), vec![secs(2)]);
        assert_eq!(clock.elapsed(), secs(5));
    }

    #[test]
    fn success_after_retries_reports_remaining() {
        let clock = ManualClock::new();
        let opts = WaitOptions::new().interval(secs(1)).timeout(secs(10));
        let poller = Poller::with_clock(opts, &clock);
        let mut calls = 0;
        let outcome = poller
            .wait(|| {
                calls += 1;
                if calls == 4 { Some(calls) } else { None }
            })
            .unwrap();
        assert_eq!(outcome.remaining(), Some(secs(7)));
        assert_eq!(outcome.into_value(), Some(4));
    }

    #[test]
    fn slow_success_past_deadline_saturates_remaining() {
        let clock = ManualClock::new();
        let opts = WaitOptions::new().interval(secs(1)).timeout(secs(2));
        let poller = Poller::with_clock(opts, &clock);
        let outcome = poller
            .wait(|| {
                clock.advance(secs(3));
                true
            })
            .unwrap();
        assert_eq!(outcome.remaining(), Some(Duration::ZERO));
    }

    #[test]
    fn tiny_timeout_still_evaluates_once() {
        let clock = ManualClock::new();
        let opts = WaitOptions::new().timeout(Duration::from_nanos(1));
        let poller = Poller::with_clock(opts, &clock);
        let mut calls = 0;
        let outcome = poller.wait(|| {
            calls += 1;
            clock.advance(secs(1));
            false
        });
        assert!(outcome.is_err());
        assert_eq!(calls, 1);
    }

    #[derive(Debug, PartialEq)]
    enum ProbeFailure {
        Lookup,
        Wait(WaitError),
    }

    impl From<WaitError> for ProbeFailure {
        fn from(e: WaitError) -> Self {
            ProbeFailure::Wait(e)
        }
    }

    #[test]
    fn try_wait_propagates_predicate_error() {
        let clock = ManualClock::new();
        let poller = Poller::with_clock(WaitOptions::new().interval(secs(1)), &clock);
        let mut calls = 0;
        let err = poller
            .try_wait(|| {
                calls += 1;
                if calls < 3 { Ok(false) } else { Err(ProbeFailure::Lookup) }
            })
            .unwrap_err();
        assert_eq!(err, ProbeFailure::Lookup);
        assert_eq!(clock.sleeps().len(), 2);
    }

    #[test]
    fn try_wait_converts_timeout() {
        let clock = ManualClock::new();
        let opts = WaitOptions::new().interval(secs(1)).timeout(secs(1)).message("boot");
        let poller = Poller::with_clock(opts, &clock);
        let err = poller.try_wait(|| Ok::<_, ProbeFailure>(false)).unwrap_err();
        assert_eq!(err, ProbeFailure::Wait(WaitError::Timeout("boot".into())));
    }

    #[test]
    fn outcome_truthiness() {
        assert!(true.is_ready());
        assert!(!0i32.is_ready());
        assert!(7u16.is_ready());
        assert!(!String::new().is_ready());
        assert!("up".is_ready());
        assert!(!Vec::<u8>::new().is_ready());
        assert!(!None::<u8>.is_ready());
    }

    #[test]
    fn default_options() {
        let opts = WaitOptions::default();
        assert_eq!(opts.interval, secs(5));
        assert_eq!(opts.timeout, Some(secs(60)));
        assert_eq!(opts.timeout_message, "Waiting timed out");
    }
}
