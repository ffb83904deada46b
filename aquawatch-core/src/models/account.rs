//! Consumption snapshot types.
//!
//! This module contains the data an account client hands back after a fetch:
//! - [`AccountSnapshot`] - Container for one account and period
//! - [`DailyConsumption`] - Per-day reading in litres
//! - [`MonthlyConsumption`] - Per-month reading in cubic metres

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::period::Period;
use crate::error::CoreError;

// ============================================================================
// Account Snapshot
// ============================================================================

/// Latest known consumption figures for one account and period.
///
/// Treated as an immutable value once received. The refresh coordinator
/// passes it through untouched; the accessors below exist for consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    /// Provider-side subscription identifier.
    pub account_id: String,
    /// Period the snapshot was requested for.
    pub period: Period,
    /// Daily readings, in provider order.
    #[serde(default)]
    pub daily: Vec<DailyConsumption>,
    /// Monthly readings, in provider order.
    #[serde(default)]
    pub monthly: Vec<MonthlyConsumption>,
    /// When the client retrieved this data.
    pub retrieved_at: DateTime<Utc>,
}

impl AccountSnapshot {
    /// Creates an empty snapshot for an account and period.
    pub fn new(account_id: impl Into<String>, period: Period) -> Self {
        Self {
            account_id: account_id.into(),
            period,
            daily: Vec::new(),
            monthly: Vec::new(),
            retrieved_at: Utc::now(),
        }
    }

    /// Adds a daily reading.
    #[must_use]
    pub fn with_daily(mut self, date: NaiveDate, liters: f64) -> Self {
        self.daily.push(DailyConsumption { date, liters });
        self
    }

    /// Adds a monthly reading.
    #[must_use]
    pub fn with_monthly(mut self, period: Period, cubic_meters: f64) -> Self {
        self.monthly.push(MonthlyConsumption {
            period,
            cubic_meters,
        });
        self
    }

    /// Returns true if any reading is present.
    pub fn has_data(&self) -> bool {
        !self.daily.is_empty() || !self.monthly.is_empty()
    }

    /// Total litres across the daily readings.
    pub fn total_daily_liters(&self) -> f64 {
        self.daily.iter().map(|d| d.liters).sum()
    }

    /// The most recent daily reading.
    pub fn latest_daily(&self) -> Option<&DailyConsumption> {
        self.daily.iter().max_by_key(|d| d.date)
    }

    /// The monthly reading for the snapshot's own period, if reported.
    pub fn current_month(&self) -> Option<&MonthlyConsumption> {
        self.monthly.iter().find(|m| m.period == self.period)
    }

    /// Validates the readings.
    ///
    /// Snapshots are published exactly as the client reported them; nothing
    /// on the refresh path calls this. Consumers that need clean readings
    /// must call it themselves.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidData` if any reading is negative or not finite.
    pub fn validate(&self) -> Result<(), CoreError> {
        for day in &self.daily {
            if !day.liters.is_finite() || day.liters < 0.0 {
                return Err(CoreError::InvalidData(format!(
                    "daily reading for {} is {}",
                    day.date, day.liters
                )));
            }
        }
        for month in &self.monthly {
            if !month.cubic_meters.is_finite() || month.cubic_meters < 0.0 {
                return Err(CoreError::InvalidData(format!(
                    "monthly reading for {} is {}",
                    month.period, month.cubic_meters
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Readings
// ============================================================================

/// Water used on a single day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyConsumption {
    /// Day of the reading.
    pub date: NaiveDate,
    /// Litres used that day.
    pub liters: f64,
}

/// Water used over a calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyConsumption {
    /// Month of the reading.
    pub period: Period,
    /// Cubic metres used that month.
    pub cubic_meters: f64,
}
