//! Billing period types.

use chrono::{DateTime, Datelike, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// A calendar month, the unit consumption data is requested in.
///
/// Recomputed from the clock at the start of each refresh cycle and never
/// stored by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawPeriod")]
pub struct Period {
    year: i32,
    month: u32,
}

#[derive(Deserialize)]
struct RawPeriod {
    year: i32,
    month: u32,
}

impl TryFrom<RawPeriod> for Period {
    type Error = CoreError;

    fn try_from(raw: RawPeriod) -> Result<Self, Self::Error> {
        Self::new(raw.year, raw.month)
    }
}

impl Period {
    /// Creates a period, rejecting months outside `1..=12`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidPeriod`] when `month` is not a calendar month.
    pub fn new(year: i32, month: u32) -> Result<Self, CoreError> {
        if !(1..=12).contains(&month) {
            return Err(CoreError::InvalidPeriod { year, month });
        }
        Ok(Self { year, month })
    }

    /// Returns the period containing the given instant, in that instant's timezone.
    pub fn containing<Tz: TimeZone>(at: &DateTime<Tz>) -> Self {
        Self {
            year: at.year(),
            month: at.month(),
        }
    }

    /// The year.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// The month, 1-based.
    pub fn month(&self) -> u32 {
        self.month
    }

    /// Returns the month before this one.
    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    #[test]
    fn test_new_rejects_bad_month() {
        assert!(Period::new(2024, 0).is_err());
        assert!(Period::new(2024, 13).is_err());
        assert!(Period::new(2024, 12).is_ok());
    }

    #[test]
    fn test_containing_uses_instant_timezone() {
        // 23:30 UTC on March 31 is already April 1 in UTC+2.
        let utc = Utc.with_ymd_and_hms(2024, 3, 31, 23, 30, 0).unwrap();
        assert_eq!(Period::containing(&utc), Period::new(2024, 3).unwrap());

        let paris = utc.with_timezone(&FixedOffset::east_opt(2 * 3600).unwrap());
        assert_eq!(Period::containing(&paris), Period::new(2024, 4).unwrap());
    }

    #[test]
    fn test_previous_wraps_year() {
        let jan = Period::new(2024, 1).unwrap();
        assert_eq!(jan.previous(), Period::new(2023, 12).unwrap());
        assert_eq!(Period::new(2024, 7).unwrap().previous().month(), 6);
    }

    #[test]
    fn test_display() {
        assert_eq!(Period::new(2024, 3).unwrap().to_string(), "2024-03");
    }
}
