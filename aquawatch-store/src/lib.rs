// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # AquaWatch Store
//!
//! Refresh state, scheduling, and configuration for the AquaWatch service.
//!
//! This crate provides:
//!
//! - **StateStore**: Latest refresh outcome plus last known good snapshot,
//!   observable through a watch channel
//! - **IntervalScheduler**: Tokio implementation of the [`Scheduler`] port
//!   that drives a refresh coordinator
//! - **Config**: Refresh interval and retry policy with JSON persistence
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use aquawatch_fetch::RefreshCoordinator;
//! use aquawatch_store::{Config, IntervalScheduler, Scheduler, StateStore};
//!
//! let config = Config::load().await?;
//! let coordinator = Arc::new(RefreshCoordinator::connect(credentials, ProviderApi::new)?);
//! let store = Arc::new(StateStore::new());
//!
//! let scheduler = IntervalScheduler::start(coordinator, store.clone(), config.retry_strategy());
//! scheduler.schedule_every(config.refresh_interval());
//!
//! let mut rx = store.subscribe();
//! while rx.changed().await.is_ok() {
//!     println!("{:?}", rx.borrow().current);
//! }
//! ```

pub mod config;
pub mod error;
pub mod persistence;
pub mod scheduler;
pub mod state;

pub use config::{Config, DEFAULT_REFRESH_INTERVAL, MIN_REFRESH_INTERVAL, RetryConfig};
pub use error::StoreError;
pub use persistence::{default_config_dir, default_config_path, load_json, save_json};
pub use scheduler::{IntervalScheduler, Scheduler};
pub use state::{LastGood, RefreshState, StateStore, StateView};
