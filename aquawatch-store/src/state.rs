//! Refresh state store.
//!
//! Holds the outcome of the most recent refresh cycle and publishes every
//! change to observers through a watch channel.

use aquawatch_core::AccountSnapshot;
use aquawatch_fetch::{ErrorKind, RefreshError};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

// ============================================================================
// Refresh State
// ============================================================================

/// Outcome of the most recent refresh cycle.
#[derive(Debug, Clone, Default)]
pub enum RefreshState {
    /// No cycle has completed yet.
    #[default]
    Unset,
    /// The last cycle returned a snapshot.
    Success {
        /// The snapshot.
        snapshot: AccountSnapshot,
        /// When the cycle completed.
        fetched_at: DateTime<Utc>,
    },
    /// The last cycle failed.
    Failure {
        /// Failure classification.
        kind: ErrorKind,
        /// The error the cycle ended with.
        cause: Arc<RefreshError>,
        /// When the cycle completed.
        failed_at: DateTime<Utc>,
    },
}

impl RefreshState {
    /// Returns true if the last cycle succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The snapshot, if the last cycle succeeded.
    pub fn snapshot(&self) -> Option<&AccountSnapshot> {
        match self {
            Self::Success { snapshot, .. } => Some(snapshot),
            _ => None,
        }
    }

    /// The error, if the last cycle failed.
    pub fn error(&self) -> Option<&RefreshError> {
        match self {
            Self::Failure { cause, .. } => Some(cause.as_ref()),
            _ => None,
        }
    }

    /// The failure kind, if the last cycle failed.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Failure { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Returns true if the last cycle asked for new credentials.
    pub fn needs_reauth(&self) -> bool {
        self.error_kind() == Some(ErrorKind::Authentication)
    }
}

/// The most recent successful snapshot, kept across failures.
#[derive(Debug, Clone)]
pub struct LastGood {
    /// The snapshot.
    pub snapshot: AccountSnapshot,
    /// When it was fetched.
    pub fetched_at: DateTime<Utc>,
}

/// Everything observers can see, published as one value.
#[derive(Debug, Clone, Default)]
pub struct StateView {
    /// Outcome of the most recent cycle.
    pub current: RefreshState,
    /// Most recent success, if any.
    pub last_good: Option<LastGood>,
    /// Number of recorded cycles.
    pub version: u64,
}

// ============================================================================
// State Store
// ============================================================================

/// Observable store for refresh outcomes.
///
/// Each record replaces the whole [`StateView`] under the channel's lock, so
/// readers see either the previous view or the next one, never a mix.
pub struct StateStore {
    tx: watch::Sender<StateView>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateStore")
            .field("view", &*self.tx.borrow())
            .finish()
    }
}

impl StateStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(StateView::default());
        Self { tx }
    }

    // ========================================================================
    // Access
    // ========================================================================

    /// A copy of everything currently published.
    pub fn view(&self) -> StateView {
        self.tx.borrow().clone()
    }

    /// Outcome of the most recent cycle.
    pub fn current(&self) -> RefreshState {
        self.tx.borrow().current.clone()
    }

    /// Most recent successful snapshot, even if later cycles failed.
    pub fn last_known_good(&self) -> Option<LastGood> {
        self.tx.borrow().last_good.clone()
    }

    /// Returns true if the most recent cycle asked for new credentials.
    pub fn needs_reauth(&self) -> bool {
        self.tx.borrow().current.needs_reauth()
    }

    /// Number of cycles recorded so far.
    pub fn version(&self) -> u64 {
        self.tx.borrow().version
    }

    // ========================================================================
    // Recording
    // ========================================================================

    /// Records a cycle result and returns the state it produced.
    pub fn record(&self, result: Result<AccountSnapshot, RefreshError>) -> RefreshState {
        match result {
            Ok(snapshot) => self.record_success(snapshot),
            Err(e) => self.record_failure(e),
        }
    }

    /// Records a successful cycle.
    pub fn record_success(&self, snapshot: AccountSnapshot) -> RefreshState {
        let fetched_at = Utc::now();
        let state = RefreshState::Success {
            snapshot: snapshot.clone(),
            fetched_at,
        };

        self.replace(state.clone(), Some(LastGood { snapshot, fetched_at }));
        debug!("Refresh success recorded");
        state
    }

    /// Records a failed cycle. The last known good snapshot is kept.
    pub fn record_failure(&self, error: RefreshError) -> RefreshState {
        let kind = error.kind();
        let state = RefreshState::Failure {
            kind,
            cause: Arc::new(error),
            failed_at: Utc::now(),
        };

        self.replace(state.clone(), None);
        warn!(%kind, "Refresh failure recorded");
        state
    }

    fn replace(&self, current: RefreshState, new_good: Option<LastGood>) {
        self.tx.send_modify(|view| {
            let last_good = new_good.or_else(|| view.last_good.take());
            let version = view.version + 1;
            *view = StateView {
                current,
                last_good,
                version,
            };
        });
    }

    // ========================================================================
    // Observable
    // ========================================================================

    /// Subscribes to store changes.
    pub fn subscribe(&self) -> watch::Receiver<StateView> {
        self.tx.subscribe()
    }

    // ========================================================================
    // Staleness
    // ========================================================================

    /// Checks if the last known good snapshot is older than `threshold`.
    pub fn is_stale(&self, threshold: Duration) -> bool {
        match self.snapshot_age() {
            Some(age) => {
                age > chrono::Duration::from_std(threshold).unwrap_or(chrono::Duration::MAX)
            }
            None => true,
        }
    }

    /// Age of the last known good snapshot.
    pub fn snapshot_age(&self) -> Option<chrono::Duration> {
        self.tx
            .borrow()
            .last_good
            .as_ref()
            .map(|g| Utc::now().signed_duration_since(g.fetched_at))
    }
}

// ============================================================================
// Tests
// ============================================================================
