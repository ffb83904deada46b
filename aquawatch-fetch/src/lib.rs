// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # AquaWatch Fetch
//!
//! Account client contract and refresh coordinator for the AquaWatch service.
//!
//! ## Client Contract
//!
//! - [`client::AccountClient`] - What a provider client must offer
//! - [`error::ProviderError`] - The failures a client may report
//!
//! ## Refresh
//!
//! - [`coordinator::RefreshCoordinator`] - Runs refresh cycles and the
//!   connection test against one client
//! - [`error::RefreshError`] - Cycle failures, with re-authentication
//!   singled out
//! - [`retry::RetryStrategy`] - Backoff policy for whoever schedules cycles
//!
//! ## Example
//!
//! ```ignore
//! use aquawatch_core::Credentials;
//! use aquawatch_fetch::{RefreshCoordinator, RefreshError};
//!
//! let credentials = Credentials::new("user1", "secret")?;
//! let coordinator = RefreshCoordinator::connect(credentials, ProviderApi::new)?;
//!
//! if !coordinator.test_connection().await {
//!     eprintln!("login failed");
//! }
//!
//! match coordinator.refresh().await {
//!     Ok(snapshot) => println!("{} L this month", snapshot.total_daily_liters()),
//!     Err(RefreshError::ReauthRequired { .. }) => ask_for_new_password(),
//!     Err(e) => eprintln!("will retry: {e}"),
//! }
//! ```

pub mod client;
pub mod coordinator;
pub mod error;
pub mod retry;

pub use client::AccountClient;
pub use coordinator::{RefreshCoordinator, RefreshPhase, RefreshSource};
pub use error::{ErrorKind, ProviderError, RefreshError};
pub use retry::RetryStrategy;
