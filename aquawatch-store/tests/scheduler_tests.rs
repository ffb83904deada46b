//! Scheduler behavior under a paused tokio clock.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use aquawatch_core::{AccountSnapshot, Period};
use aquawatch_fetch::{ErrorKind, ProviderError, RefreshError, RefreshSource, RetryStrategy};
use aquawatch_store::{IntervalScheduler, Scheduler, StateStore};
use async_trait::async_trait;

const TWELVE_HOURS: Duration = Duration::from_secs(12 * 60 * 60);

enum Step {
    Ok,
    Timeout,
    Auth,
}

struct FakeSource {
    steps: std::sync::Mutex<VecDeque<Step>>,
    delay: Duration,
    store: Arc<StateStore>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    versions_at_start: std::sync::Mutex<Vec<u64>>,
}

impl FakeSource {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn versions_at_start(&self) -> Vec<u64> {
        self.versions_at_start.lock().unwrap().clone()
    }
}

#[async_trait]
impl RefreshSource for FakeSource {
    async fn refresh(&self) -> Result<AccountSnapshot, RefreshError> {
        self.versions_at_start
            .lock()
            .unwrap()
            .push(self.store.version());
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let step = self.steps.lock().unwrap().pop_front().unwrap_or(Step::Ok);
        match step {
            Step::Ok => Ok(AccountSnapshot::new("abo-1", Period::new(2024, 3).unwrap())),
            Step::Timeout => Err(ProviderError::Timeout(Duration::from_secs(30)).into()),
            Step::Auth => Err(ProviderError::InvalidCredentials.into()),
        }
    }
}

fn fixture(steps: Vec<Step>, delay: Duration) -> (Arc<FakeSource>, Arc<StateStore>) {
    let store = Arc::new(StateStore::new());
    let source = Arc::new(FakeSource {
        steps: std::sync::Mutex::new(steps.into()),
        delay,
        store: store.clone(),
        calls: AtomicUsize::new(0),
        in_flight: AtomicUsize::new(0),
        max_in_flight: AtomicUsize::new(0),
        versions_at_start: std::sync::Mutex::new(Vec::new()),
    });
    (source, store)
}

/// Lets spawned tasks run without moving the paused clock meaningfully.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

#[tokio::test(start_paused = true)]
async fn test_nothing_runs_until_scheduled() {
    let (source, store) = fixture(vec![], Duration::ZERO);
    let _scheduler = IntervalScheduler::start(source.clone(), store.clone(), RetryStrategy::no_retry());

    tokio::time::sleep(Duration::from_secs(3600)).await;
    assert_eq!(source.calls(), 0);
    assert_eq!(store.version(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_first_cycle_on_schedule_then_every_interval() {
    let (source, store) = fixture(vec![], Duration::ZERO);
    let scheduler = IntervalScheduler::start(source.clone(), store.clone(), RetryStrategy::no_retry());

    scheduler.schedule_every(TWELVE_HOURS);
    settle().await;
    assert_eq!(source.calls(), 1);
    assert!(store.current().is_success());

    tokio::time::sleep(TWELVE_HOURS - Duration::from_secs(60)).await;
    assert_eq!(source.calls(), 1);

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(source.calls(), 2);
    assert_eq!(scheduler.interval(), Some(TWELVE_HOURS));
}

#[tokio::test(start_paused = true)]
async fn test_triggers_during_a_cycle_coalesce() {
    let (source, store) = fixture(vec![], Duration::from_secs(10));
    let scheduler = IntervalScheduler::start(source.clone(), store.clone(), RetryStrategy::no_retry());

    scheduler.schedule_every(TWELVE_HOURS);
    settle().await;
    assert_eq!(source.calls(), 1);

    scheduler.trigger_now();
    scheduler.trigger_now();
    scheduler.trigger_now();

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(source.calls(), 2);
    assert_eq!(source.max_in_flight(), 1);
    // The follow-up cycle started only after the first outcome was recorded.
    assert_eq!(source.versions_at_start(), vec![0, 1]);
    assert_eq!(store.version(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_refresh_now_waits_for_cycle_in_flight() {
    let (source, store) = fixture(vec![], Duration::from_secs(10));
    let scheduler = IntervalScheduler::start(source.clone(), store.clone(), RetryStrategy::no_retry());

    scheduler.schedule_every(TWELVE_HOURS);
    settle().await;

    let state = scheduler.refresh_now().await;
    assert!(state.is_success());
    assert_eq!(source.calls(), 2);
    assert_eq!(source.max_in_flight(), 1);
    assert_eq!(source.versions_at_start(), vec![0, 1]);
}

#[tokio::test(start_paused = true)]
async fn test_auth_failure_suspends_periodic_refresh() {
    let (source, store) = fixture(vec![Step::Auth], Duration::ZERO);
    let scheduler = IntervalScheduler::start(
        source.clone(),
        store.clone(),
        RetryStrategy::new(5).with_base_delay(1),
    );

    scheduler.schedule_every(TWELVE_HOURS);
    tokio::time::sleep(TWELVE_HOURS * 4).await;

    // Not retried, not rescheduled.
    assert_eq!(source.calls(), 1);
    assert!(store.needs_reauth());
    assert!(store.current().error().unwrap().is_reauth_required());

    // A manual trigger still runs.
    scheduler.trigger_now();
    settle().await;
    assert_eq!(source.calls(), 2);
    assert!(store.current().is_success());
}

#[tokio::test(start_paused = true)]
async fn test_transient_failures_retry_with_backoff() {
    let (source, store) = fixture(vec![Step::Timeout, Step::Timeout], Duration::ZERO);
    let retry = RetryStrategy::new(3).with_base_delay(30).with_max_delay(600);
    let scheduler = IntervalScheduler::start(source.clone(), store.clone(), retry);

    scheduler.schedule_every(TWELVE_HOURS);
    settle().await;
    assert_eq!(source.calls(), 1);
    assert_eq!(store.current().error_kind(), Some(ErrorKind::Transient));

    // First retry after 30s.
    tokio::time::sleep(Duration::from_secs(31)).await;
    assert_eq!(source.calls(), 2);

    // Second retry 60s later.
    tokio::time::sleep(Duration::from_secs(61)).await;
    assert_eq!(source.calls(), 3);
    assert!(store.current().is_success());
    assert_eq!(store.version(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_gives_up_after_max_attempts_until_next_interval() {
    let steps = vec![Step::Timeout, Step::Timeout, Step::Timeout];
    let (source, store) = fixture(steps, Duration::ZERO);
    let retry = RetryStrategy::new(2).with_base_delay(600).with_max_delay(600);
    let scheduler = IntervalScheduler::start(source.clone(), store.clone(), retry);

    // Attempts at 0s and 600s, then the next interval starts from 600s.
    scheduler.schedule_every(TWELVE_HOURS);
    tokio::time::sleep(Duration::from_secs(3600)).await;
    assert_eq!(source.calls(), 2);
    assert_eq!(store.current().error_kind(), Some(ErrorKind::Transient));

    // Just past 12h + 600s: the next scheduled cycle ran, its retry has not.
    tokio::time::sleep(TWELVE_HOURS - Duration::from_secs(3600 - 660)).await;
    assert_eq!(source.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_failure_keeps_last_known_good_snapshot() {
    let (source, store) = fixture(vec![Step::Ok, Step::Timeout], Duration::ZERO);
    let scheduler = IntervalScheduler::start(source.clone(), store.clone(), RetryStrategy::no_retry());

    assert!(scheduler.refresh_now().await.is_success());
    let state = scheduler.refresh_now().await;

    assert!(!state.is_success());
    assert!(matches!(
        state.error(),
        Some(RefreshError::Provider(ProviderError::Timeout(_)))
    ));
    let last_good = store.last_known_good().expect("kept across failure");
    assert_eq!(last_good.snapshot.account_id, "abo-1");
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_background_task() {
    let (source, store) = fixture(vec![], Duration::ZERO);
    let scheduler = IntervalScheduler::start(source.clone(), store, RetryStrategy::no_retry());
    assert!(scheduler.is_running());

    scheduler.shutdown();
    settle().await;
    assert!(!scheduler.is_running());

    scheduler.trigger_now();
    scheduler.schedule_every(TWELVE_HOURS);
    settle().await;
    assert_eq!(source.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_auth_failure_from_refresh_now_suspends_periodic_refresh() {
    let (source, store) = fixture(vec![Step::Ok, Step::Auth], Duration::ZERO);
    let scheduler = IntervalScheduler::start(source.clone(), store.clone(), RetryStrategy::no_retry());

    scheduler.schedule_every(TWELVE_HOURS);
    settle().await;
    assert_eq!(source.calls(), 1);
    assert!(!scheduler.is_suspended());

    let state = scheduler.refresh_now().await;
    assert!(state.needs_reauth());
    assert!(scheduler.is_suspended());

    // The rejected credentials are not sent again on the timer.
    tokio::time::sleep(TWELVE_HOURS * 3).await;
    assert_eq!(source.calls(), 2);
    assert!(store.needs_reauth());
}

#[tokio::test(start_paused = true)]
async fn test_successful_refresh_now_resumes_periodic_refresh() {
    let (source, store) = fixture(vec![Step::Auth, Step::Ok], Duration::ZERO);
    let scheduler = IntervalScheduler::start(source.clone(), store.clone(), RetryStrategy::no_retry());

    scheduler.schedule_every(TWELVE_HOURS);
    settle().await;
    assert_eq!(source.calls(), 1);
    assert!(scheduler.is_suspended());

    assert!(scheduler.refresh_now().await.is_success());
    assert!(!scheduler.is_suspended());
    settle().await;

    // The timer restarts from the successful refresh.
    tokio::time::sleep(TWELVE_HOURS - Duration::from_secs(60)).await;
    assert_eq!(source.calls(), 2);

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(source.calls(), 3);

    tokio::time::sleep(TWELVE_HOURS).await;
    assert_eq!(source.calls(), 4);
    assert!(store.current().is_success());
}
