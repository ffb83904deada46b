//! Wall-clock port.
//!
//! Refresh cycles derive the requested [`Period`] from "now". Going through
//! a trait keeps that derivation testable without touching the system time.

use chrono::{DateTime, Local, TimeZone};

use crate::models::Period;

/// Source of the current local time.
pub trait Clock: Send + Sync {
    /// Returns the current local time.
    fn now(&self) -> DateTime<Local>;

    /// Returns the period containing [`Clock::now`].
    fn current_period(&self) -> Period {
        Period::containing(&self.now())
    }
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    at: DateTime<Local>,
}

impl FixedClock {
    /// Creates a clock that always reports `at`.
    pub fn new(at: DateTime<Local>) -> Self {
        Self { at }
    }

    /// Creates a clock at local midday on the given date.
    ///
    /// Returns `None` for dates that do not exist.
    pub fn at_date(year: i32, month: u32, day: u32) -> Option<Self> {
        Local
            .with_ymd_and_hms(year, month, day, 12, 0, 0)
            .single()
            .map(Self::new)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_period() {
        let clock = FixedClock::at_date(2024, 3, 15).unwrap();
        let period = clock.current_period();
        assert_eq!(period.year(), 2024);
        assert_eq!(period.month(), 3);
    }

    #[test]
    fn test_fixed_clock_rejects_impossible_date() {
        assert!(FixedClock::at_date(2023, 2, 30).is_none());
    }

    #[test]
    fn test_system_clock_matches_local_period() {
        let before = Period::containing(&Local::now());
        let period = SystemClock.current_period();
        let after = Period::containing(&Local::now());
        assert!(period == before || period == after);
    }
}
