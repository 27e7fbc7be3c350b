//! Time source for the wait engines.
//!
//! Engines only ever read a monotonic instant and sleep; routing both
//! through [`Clock`] lets tests run deadline arithmetic on virtual time.

use std::time::{Duration, Instant};

/// Monotonic time source used by [`Poller`](crate::Poller) and
/// [`Retrier`](crate::Retrier).
pub trait Clock {
    /// Current monotonic reading.
    fn now(&self) -> Instant;

    /// Block the calling thread for `duration`.
    fn sleep(&self, duration: Duration);
}

/// Wall-clock implementation backed by `Instant` and `thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

/// Virtual clock for engine tests: `sleep` advances time instantly and
/// every requested duration is recorded.
#[cfg(test)]
#[derive(Debug)]
pub(crate) struct ManualClock {
    origin: Instant,
    elapsed: std::cell::Cell<Duration>,
    sleeps: std::cell::RefCell<Vec<Duration>>,
}

#[cfg(test)]
impl ManualClock {
    pub(crate) fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: std::cell::Cell::new(Duration::ZERO),
            sleeps: std::cell::RefCell::new(Vec::new()),
        }
    }

    /// Move virtual time forward without recording a sleep (models time
    /// spent inside a predicate or operation).
    pub(crate) fn advance(&self, by: Duration) {
        self.elapsed.set(self.elapsed.get() + by);
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.elapsed.get()
    }

    pub(crate) fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.borrow().clone()
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed.get()
    }

    fn sleep(&self, duration: Duration) {
        self.sleeps.borrow_mut().push(duration);
        self.advance(duration);
    }
}
