//! Core error types for `AquaWatch`.

use thiserror::Error;

/// Core error type for `AquaWatch` models.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Credentials were rejected before any client was built.
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// A period outside the calendar (month not in 1..=12).
    #[error("Invalid period: {year}-{month}")]
    InvalidPeriod {
        /// Requested year.
        year: i32,
        /// Requested month.
        month: u32,
    },

    /// Invalid data from a client payload.
    #[error("Invalid data: {0}")]
    InvalidData(String),
}
