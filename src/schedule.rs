//! Cooperative timing primitives for the agent loop.
//!
//! Time is a `Duration` since an arbitrary origin. Nothing here spawns
//! threads: the owner asks a [`Clock`] for the time and hands it to whoever
//! holds a [`Timer`].

use std::cell::Cell;
use std::time::{Duration, Instant};

/// A source of monotonic time.
pub trait Clock {
    fn now(&self) -> Duration;
}

/// Wall clock measured from construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self { Self { origin: Instant::now() } }
}

impl Default for SystemClock { fn default() -> Self { Self::new() } }

impl Clock for SystemClock {
    fn now(&self) -> Duration { self.origin.elapsed() }
}

/// Virtual clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Duration>,
}

impl ManualClock {
    pub fn new() -> Self { Self::default() }

    pub fn advance(&self, by: Duration) { self.now.set(self.now.get() + by); }

    pub fn set(&self, to: Duration) { self.now.set(to); }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration { self.now.get() }
}

/// One-shot deadline with arm/cancel semantics.
///
/// Firing consumes the deadline, so a timer fires at most once per arm, and
/// a cancelled timer never fires.
///
/// ```
/// use std::time::Duration;
/// use race_2048::schedule::Timer;
///
/// let mut t = Timer::default();
/// t.arm(Duration::ZERO, Duration::from_millis(10));
/// assert!(!t.fire_if_due(Duration::from_millis(9)));
/// assert!(t.fire_if_due(Duration::from_millis(10)));
/// assert!(!t.fire_if_due(Duration::from_millis(50)));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timer {
    deadline: Option<Duration>,
}

impl Timer {
    /// Schedule the timer `delay` after `now`, replacing any pending deadline.
    pub fn arm(&mut self, now: Duration, delay: Duration) {
        self.deadline = Some(now.saturating_add(delay));
    }

    /// Drop the pending deadline. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool { self.deadline.take().is_some() }

    #[inline]
    pub fn is_armed(&self) -> bool { self.deadline.is_some() }

    #[inline]
    pub fn deadline(&self) -> Option<Duration> { self.deadline }

    /// Consume the deadline if `now` has reached it.
    pub fn fire_if_due(&mut self, now: Duration) -> bool {
        match self.deadline {
            Some(at) if now >= at => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_timer_never_fires() {
        let mut t = Timer::default();
        t.arm(Duration::from_secs(1), Duration::from_secs(1));
        assert!(t.is_armed());
        assert!(t.cancel());
        assert!(!t.is_armed());
        assert!(!t.cancel());
        assert!(!t.fire_if_due(Duration::from_secs(100)));
    }

    #[test]
    fn rearm_replaces_deadline() {
        let mut t = Timer::default();
        t.arm(Duration::ZERO, Duration::from_secs(5));
        t.arm(Duration::ZERO, Duration::from_secs(1));
        assert_eq!(t.deadline(), Some(Duration::from_secs(1)));
    }

    #[test]
    fn manual_clock_moves_on_demand() {
        let c = ManualClock::new();
        assert_eq!(c.now(), Duration::ZERO);
        c.advance(Duration::from_millis(1500));
        assert_eq!(c.now(), Duration::from_millis(1500));
        c.set(Duration::from_secs(3));
        assert_eq!(c.now(), Duration::from_secs(3));
    }
}
