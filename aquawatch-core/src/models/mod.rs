//! Domain models for AquaWatch.
//!
//! ## Submodules
//!
//! - [`credentials`] - Account credentials
//! - [`period`] - Billing period a refresh cycle requests
//! - [`account`] - Consumption snapshot returned by an account client

mod account;
mod credentials;
mod period;

pub use account::{AccountSnapshot, DailyConsumption, MonthlyConsumption};
pub use credentials::Credentials;
pub use period::Period;
