//! Time source used for every timestamp the tracker writes.

use std::sync::Mutex;

use jiff::{SignedDuration, Timestamp};

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// Manually driven clock for tests and replays.
///
/// # Examples
///
/// ```rust
/// use formflow_core::clock::{Clock, FixedClock};
/// use jiff::{SignedDuration, Timestamp};
///
/// let clock = FixedClock::new(Timestamp::UNIX_EPOCH);
/// clock.advance(SignedDuration::from_hours(48));
/// assert_eq!(clock.now().as_second(), 48 * 3600);
/// ```
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<Timestamp>,
}

impl FixedClock {
    pub fn new(now: Timestamp) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Moves the clock by `by` (negative values move it back).
    pub fn advance(&self, by: SignedDuration) {
        let mut now = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Ok(next) = now.checked_add(by) {
            *now = next;
        }
    }

    pub fn set(&self, to: Timestamp) {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = to;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_moves_both_ways() {
        let start = Timestamp::from_second(1_700_000_000).unwrap();
        let clock = FixedClock::new(start);

        clock.advance(SignedDuration::from_mins(90));
        assert_eq!(clock.now().as_second(), 1_700_000_000 + 90 * 60);

        clock.advance(SignedDuration::from_mins(-90));
        assert_eq!(clock.now(), start);

        clock.set(Timestamp::UNIX_EPOCH);
        assert_eq!(clock.now(), Timestamp::UNIX_EPOCH);
    }
}
