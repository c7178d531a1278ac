//! Timestamp sources for callers of the dictionary.
//!
//! The dictionary never reads a clock itself; every mutation takes an explicit
//! timestamp. These clocks are conveniences for producing timestamps that only
//! move forward: a thread-safe Lamport counter and a monotonic UTC wall clock.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

/// A thread-safe logical clock for generating `u64` timestamps
#[derive(Debug, Default)]
pub struct LamportClock {
    counter: AtomicU64,
}

impl LamportClock {
    /// Creates a new Lamport clock starting at zero
    pub fn new() -> Self {
        LamportClock {
            counter: AtomicU64::new(0),
        }
    }

    /// Generates the next timestamp for this replica
    pub fn tick(&self) -> u64 {
        self.counter.fetch_add(1, AtomicOrdering::SeqCst) + 1
    }

    /// Advances the clock so that it is at least `observed`.
    ///
    /// Call this with timestamps seen in merged state so the next local
    /// write supersedes them.
    pub fn observe(&self, observed: u64) {
        self.counter.fetch_max(observed, AtomicOrdering::SeqCst);
    }

    /// Gets the current counter value
    pub fn current(&self) -> u64 {
        self.counter.load(AtomicOrdering::SeqCst)
    }
}

/// A UTC wall clock that never runs backwards.
///
/// If the system clock steps back, `now` keeps returning the last value it
/// handed out until real time catches up.
#[derive(Debug, Default)]
pub struct WallClock {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl WallClock {
    pub fn new() -> Self {
        WallClock {
            last: Mutex::new(None),
        }
    }

    /// Returns the current time, clamped to the last returned value
    pub fn now(&self) -> DateTime<Utc> {
        self.stamp(Utc::now())
    }

    fn stamp(&self, reading: DateTime<Utc>) -> DateTime<Utc> {
        let mut last = self.last.lock();
        let next = match *last {
            Some(prev) if prev > reading => prev,
            _ => reading,
        };
        *last = Some(next);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_lamport_clock() {
        let clock = LamportClock::new();

        let ts1 = clock.tick();
        let ts2 = clock.tick();

        assert!(ts1 < ts2);
        assert_eq!(ts1 + 1, ts2);
        assert_eq!(clock.current(), ts2);
    }

    #[test]
    fn test_lamport_clock_observe() {
        let clock = LamportClock::new();

        // Simulate merging state written far in the future
        clock.observe(100);
        let next_ts = clock.tick();
        assert_eq!(next_ts, 101);

        // Observing the past never moves the clock backwards
        clock.observe(3);
        assert_eq!(clock.current(), 101);
    }

    #[test]
    fn test_wall_clock_is_monotonic() {
        let clock = WallClock::new();
        let t1 = clock.now();
        let t2 = clock.now();
        assert!(t1 <= t2);
    }

    #[test]
    fn test_wall_clock_clamps_backwards_steps() {
        let clock = WallClock::new();
        let reading = Utc::now();

        let first = clock.stamp(reading);
        let stepped_back = clock.stamp(reading - Duration::seconds(30));
        assert_eq!(first, stepped_back);

        let later = clock.stamp(reading + Duration::seconds(1));
        assert!(later > first);
    }
}
