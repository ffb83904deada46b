//! Refresh coordinator.
//!
//! Sits between the host's scheduler and an [`AccountClient`]: one refresh
//! cycle asks the client for the current month and turns whatever comes back
//! into either a snapshot or a [`RefreshError`]. Scheduling, retries, and
//! caching belong to the caller.

use std::fmt;
use std::sync::Arc;

use aquawatch_core::{AccountSnapshot, Clock, Credentials, Period, SystemClock};
use async_trait::async_trait;
use tokio::sync::{Mutex, watch};
use tracing::{debug, error, info, instrument, warn};

use crate::client::AccountClient;
use crate::error::{ProviderError, RefreshError};

// ============================================================================
// Refresh Phase
// ============================================================================

/// Where the coordinator is in its cycle.
///
/// A finished cycle leaves its outcome in place until the next one starts,
/// so every phase except `Fetching` means "idle".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPhase {
    /// No cycle has run yet.
    Idle,
    /// A cycle is waiting on the client.
    Fetching {
        /// Period being requested.
        period: Period,
    },
    /// The last cycle returned a snapshot.
    Succeeded {
        /// Period that was requested.
        period: Period,
    },
    /// The last cycle ended with a re-authentication request.
    AuthFailed {
        /// Period that was requested.
        period: Period,
    },
    /// The last cycle failed for any other reason.
    OtherFailed {
        /// Period that was requested.
        period: Period,
    },
}

impl RefreshPhase {
    /// Returns true while a cycle is in flight.
    pub fn is_fetching(&self) -> bool {
        matches!(self, Self::Fetching { .. })
    }

    fn finished(period: Period, result: &Result<AccountSnapshot, RefreshError>) -> Self {
        match result {
            Ok(_) => Self::Succeeded { period },
            Err(e) if e.is_reauth_required() => Self::AuthFailed { period },
            Err(_) => Self::OtherFailed { period },
        }
    }
}

// ============================================================================
// Refresh Source
// ============================================================================

/// Anything that can run one refresh cycle.
///
/// Schedulers depend on this rather than on a concrete coordinator type.
#[async_trait]
pub trait RefreshSource: Send + Sync {
    /// Runs one refresh cycle.
    async fn refresh(&self) -> Result<AccountSnapshot, RefreshError>;
}

// ============================================================================
// Refresh Coordinator
// ============================================================================

/// Drives an account client for one set of credentials.
///
/// The client is built once in [`RefreshCoordinator::connect`] and never
/// rebuilt. Every client call goes through one async lock, so a connection
/// test and a refresh never use the client at the same time, and two
/// refreshes never interleave.
pub struct RefreshCoordinator<C> {
    credentials: Credentials,
    client: Mutex<C>,
    clock: Arc<dyn Clock>,
    phase: watch::Sender<RefreshPhase>,
}

impl<C> fmt::Debug for RefreshCoordinator<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("credentials", &self.credentials)
            .field("phase", &*self.phase.borrow())
            .finish_non_exhaustive()
    }
}

impl<C: AccountClient> RefreshCoordinator<C> {
    /// Builds the account client from `credentials` and wraps it.
    ///
    /// # Errors
    ///
    /// Returns the builder's error as-is. Construction is not retried.
    pub fn connect<F, E>(credentials: Credentials, build: F) -> Result<Self, E>
    where
        F: FnOnce(&Credentials) -> Result<C, E>,
        E: fmt::Display,
    {
        debug!(username = %credentials.username(), "Creating account client");

        let client = build(&credentials).inspect_err(|e| {
            error!(error = %e, "Failed to create account client");
        })?;

        debug!("Account client created");
        let (phase, _) = watch::channel(RefreshPhase::Idle);
        Ok(Self {
            credentials,
            client: Mutex::new(client),
            clock: Arc::new(SystemClock),
            phase,
        })
    }

    /// Replaces the clock used to pick the requested period.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The account username.
    pub fn username(&self) -> &str {
        self.credentials.username()
    }

    /// The current cycle phase.
    pub fn phase(&self) -> RefreshPhase {
        *self.phase.borrow()
    }

    /// Subscribes to phase changes.
    pub fn subscribe_phase(&self) -> watch::Receiver<RefreshPhase> {
        self.phase.subscribe()
    }

    /// Checks that the credentials are accepted.
    ///
    /// Any client error, whatever its kind, yields `false`. Meant for
    /// setup-time validation only; it does not touch the refresh outcome.
    pub async fn test_connection(&self) -> bool {
        let mut client = self.client.lock().await;
        debug!("Testing connection to provider");

        match client.login().await {
            Ok(result) => {
                debug!(result, "Login test result");
                result
            }
            Err(e) => {
                error!(error = %e, kind = %e.kind(), "Connection test failed");
                false
            }
        }
    }

    /// Runs one refresh cycle for the current month.
    ///
    /// # Errors
    ///
    /// - [`RefreshError::ReauthRequired`] when the client reports an
    ///   authentication failure, carrying that failure as its source.
    /// - [`RefreshError::Provider`] with the client's error untouched for
    ///   everything else, including a fetch that left no data behind.
    #[instrument(skip(self), fields(username = %self.credentials.username()))]
    pub async fn refresh(&self) -> Result<AccountSnapshot, RefreshError> {
        let period = self.clock.current_period();
        let mut client = self.client.lock().await;

        self.phase.send_replace(RefreshPhase::Fetching { period });
        debug!(%period, "Fetching account data");

        let result = Self::fetch(&mut *client, period).await;
        self.phase.send_replace(RefreshPhase::finished(period, &result));

        match &result {
            Ok(snapshot) => info!(
                %period,
                account = %snapshot.account_id,
                daily = snapshot.daily.len(),
                monthly = snapshot.monthly.len(),
                "Account data refreshed"
            ),
            Err(RefreshError::ReauthRequired { source }) => {
                warn!(%period, error = %source, "Provider rejected credentials");
            }
            Err(e) => error!(%period, error = %e, "Account data refresh failed"),
        }

        result
    }

    async fn fetch(client: &mut C, period: Period) -> Result<AccountSnapshot, RefreshError> {
        client.fetch_account_data(period).await?;
        let snapshot = client.account_data().cloned().ok_or(ProviderError::NoData)?;
        Ok(snapshot)
    }
}

#[async_trait]
impl<C: AccountClient> RefreshSource for RefreshCoordinator<C> {
    async fn refresh(&self) -> Result<AccountSnapshot, RefreshError> {
        RefreshCoordinator::refresh(self).await
    }
}

// ============================================================================
// Tests
// ============================================================================
