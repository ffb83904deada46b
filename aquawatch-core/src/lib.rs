// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `AquaWatch` Core
//!
//! Core types and models for the `AquaWatch` refresh service.
//!
//! This crate provides the foundational abstractions used across all other
//! `AquaWatch` crates:
//!
//! - Domain models (credentials, billing periods, consumption snapshots)
//! - Error types
//! - The [`Clock`] port used to derive the current period
//!
//! ## Key Types
//!
//! - [`Credentials`] - Account username and password, validated once
//! - [`Period`] - `(year, month)` a refresh cycle asks for
//! - [`AccountSnapshot`] - Consumption figures returned by an account client
//! - [`DailyConsumption`] / [`MonthlyConsumption`] - Individual readings

pub mod clock;
pub mod error;
pub mod models;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::CoreError;
pub use models::{AccountSnapshot, Credentials, DailyConsumption, MonthlyConsumption, Period};
