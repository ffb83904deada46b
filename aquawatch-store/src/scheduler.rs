//! Refresh scheduling.
//!
//! [`Scheduler`] is the port a refresh coordinator is driven through.
//! [`IntervalScheduler`] implements it on tokio: a background task runs a
//! refresh cycle when scheduled, then on every interval tick and on demand,
//! and records each outcome in a [`StateStore`] before starting the next.

use std::sync::Arc;
use std::time::Duration;

use aquawatch_fetch::{RefreshSource, RetryStrategy};
use tokio::sync::{Mutex, Notify, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::state::{RefreshState, StateStore};

// ============================================================================
// Scheduler Port
// ============================================================================

/// Drives refresh cycles.
pub trait Scheduler: Send + Sync {
    /// Runs a cycle now if nothing was scheduled yet, then one every
    /// `interval`. Calling again changes the interval and restarts the timer.
    fn schedule_every(&self, interval: Duration);

    /// Requests a cycle as soon as possible. Requests made while a cycle is
    /// running collapse into a single follow-up cycle.
    fn trigger_now(&self);
}

// ============================================================================
// Interval Scheduler
// ============================================================================

struct Inner {
    source: Arc<dyn RefreshSource>,
    store: Arc<StateStore>,
    retry: RetryStrategy,
    /// Held across fetch + record so cycles never overlap.
    cycle_lock: Mutex<()>,
    trigger: Notify,
    /// True while the last recorded attempt failed authentication. Every
    /// attempt updates it, whoever started it; the loop arms its timer from it.
    suspended: watch::Sender<bool>,
}

impl Inner {
    /// One attempt, recorded before the lock is released.
    async fn attempt(&self) -> RefreshState {
        let _cycle = self.cycle_lock.lock().await;
        let result = self.source.refresh().await;
        let state = self.store.record(result);

        let rejected = state.needs_reauth();
        self.suspended.send_if_modified(|suspended| {
            let changed = *suspended != rejected;
            *suspended = rejected;
            changed
        });
        state
    }

    /// A scheduled cycle: retries transient failures with backoff, each
    /// attempt recorded on its own.
    async fn cycle(&self) -> RefreshState {
        let mut attempt = 1;
        loop {
            let state = self.attempt().await;

            let delay = match state.error() {
                Some(error) if self.retry.should_retry(error, attempt) => {
                    let delay = self.retry.delay_after(error, attempt);
                    warn!(attempt, delay_secs = delay.as_secs(), error = %error, "Refresh failed, retrying");
                    delay
                }
                _ => return state,
            };

            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

enum Wake {
    Timer,
    Trigger,
    Rescheduled,
    AuthChanged,
    Closed,
}

/// Tokio-backed [`Scheduler`].
///
/// Must be created inside a tokio runtime. The background task stops on
/// [`IntervalScheduler::shutdown`] or when the scheduler is dropped.
///
/// After any attempt ends in an authentication failure, scheduled or started
/// through [`IntervalScheduler::refresh_now`], the periodic timer is disarmed.
/// Manual triggers still run; the timer comes back after the next attempt
/// that does not fail authentication, or immediately (with a cycle) when
/// [`Scheduler::schedule_every`] is called again.
pub struct IntervalScheduler {
    inner: Arc<Inner>,
    schedule: watch::Sender<Option<Duration>>,
    task: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for IntervalScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntervalScheduler")
            .field("interval", &*self.schedule.borrow())
            .field("retry", &self.inner.retry)
            .finish_non_exhaustive()
    }
}

impl IntervalScheduler {
    /// Spawns the background task. Nothing runs until scheduled or triggered.
    pub fn start(source: Arc<dyn RefreshSource>, store: Arc<StateStore>, retry: RetryStrategy) -> Self {
        let inner = Arc::new(Inner {
            source,
            store,
            retry,
            cycle_lock: Mutex::new(()),
            trigger: Notify::new(),
            suspended: watch::Sender::new(false),
        });
        let (schedule, schedule_rx) = watch::channel(None);
        let suspended_rx = inner.suspended.subscribe();

        let task = tokio::spawn(run(inner.clone(), schedule_rx, suspended_rx));
        debug!("Refresh scheduler started");

        Self {
            inner,
            schedule,
            task: std::sync::Mutex::new(Some(task)),
        }
    }

    /// The store outcomes are recorded in.
    pub fn store(&self) -> &Arc<StateStore> {
        &self.inner.store
    }

    /// The configured interval, if scheduled.
    pub fn interval(&self) -> Option<Duration> {
        *self.schedule.borrow()
    }

    /// Runs one attempt right away, without retries, and returns the
    /// recorded state. Waits for any cycle already in flight.
    pub async fn refresh_now(&self) -> RefreshState {
        self.inner.attempt().await
    }

    /// Returns true while periodic refresh is suspended by an authentication
    /// failure.
    pub fn is_suspended(&self) -> bool {
        *self.inner.suspended.borrow()
    }

    /// Returns true while the background task is alive.
    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .map(|t| t.as_ref().is_some_and(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    /// Stops the background task. A cycle in progress is abandoned.
    pub fn shutdown(&self) {
        if let Ok(mut task) = self.task.lock() {
            if let Some(handle) = task.take() {
                handle.abort();
                info!("Refresh scheduler stopped");
            }
        }
    }
}

impl Scheduler for IntervalScheduler {
    fn schedule_every(&self, interval: Duration) {
        info!(interval_secs = interval.as_secs(), "Scheduling periodic refresh");
        self.schedule.send_replace(Some(interval));
    }

    fn trigger_now(&self) {
        debug!("Refresh requested");
        self.inner.trigger.notify_one();
    }
}

impl Drop for IntervalScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn run(
    inner: Arc<Inner>,
    mut schedule: watch::Receiver<Option<Duration>>,
    mut suspended: watch::Receiver<bool>,
) {
    let mut next_due: Option<Instant> = None;

    loop {
        let due = next_due;
        let wake = tokio::select! {
            () = sleep_until(due) => Wake::Timer,
            () = inner.trigger.notified() => Wake::Trigger,
            changed = schedule.changed() => {
                if changed.is_ok() { Wake::Rescheduled } else { Wake::Closed }
            }
            changed = suspended.changed() => {
                if changed.is_ok() { Wake::AuthChanged } else { Wake::Closed }
            }
        };

        let run_cycle = match wake {
            Wake::Timer => true,
            Wake::Trigger => {
                debug!("Running triggered refresh");
                true
            }
            Wake::Rescheduled => {
                let interval = *schedule.borrow_and_update();
                let first = next_due.is_none();
                next_due = interval.map(|every| Instant::now() + every);
                interval.is_some() && first
            }
            // An attempt outside the loop changed the auth outcome.
            Wake::AuthChanged => {
                if *suspended.borrow_and_update() {
                    warn!("Credentials rejected, periodic refresh suspended");
                    next_due = None;
                } else if next_due.is_none() {
                    next_due = schedule.borrow().map(|every| Instant::now() + every);
                    if next_due.is_some() {
                        info!("Credentials accepted, periodic refresh resumed");
                    }
                }
                false
            }
            Wake::Closed => break,
        };

        if !run_cycle {
            continue;
        }

        inner.cycle().await;
        if *suspended.borrow_and_update() {
            warn!("Credentials rejected, periodic refresh suspended");
            next_due = None;
            continue;
        }

        next_due = schedule.borrow().map(|every| Instant::now() + every);
    }

    debug!("Refresh scheduler loop exited");
}

async fn sleep_until(due: Option<Instant>) {
    match due {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
