//! Tests for the scheduler module.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tokio::time::{timeout, Instant};

use copilot_core::{
    CopilotConfig, CopilotError, ErpStatus, InboxItem, Invoice, Period, SchedulerConfig,
    SourceError,
};

use crate::clock::{Clock, ManualClock};
use crate::engine::Copilot;
use crate::scheduler::{Scheduler, SchedulerState, Throttle};
use crate::sources::{ErpSource, LocalDataSource};
use crate::storage::MemoryKvStore;

/// Wall clock that follows tokio's (pausable) time.
struct TokioClock {
    base: DateTime<Utc>,
    started: Instant,
}

impl TokioClock {
    fn new() -> Self {
        Self {
            base: t0(),
            started: Instant::now(),
        }
    }
}

impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = chrono::Duration::from_std(self.started.elapsed()).unwrap();
        self.base + elapsed
    }
}

struct Disconnected;

#[async_trait]
impl ErpSource for Disconnected {
    async fn status(&self) -> ErpStatus {
        ErpStatus::Disconnected
    }
    async fn supplier_invoices(&self) -> Result<Vec<Invoice>, SourceError> {
        Ok(Vec::new())
    }
    async fn customer_invoices(&self) -> Result<Vec<Invoice>, SourceError> {
        Ok(Vec::new())
    }
}

struct NoLocalData;

#[async_trait]
impl LocalDataSource for NoLocalData {
    async fn imported_periods(&self) -> Result<BTreeSet<Period>, SourceError> {
        Ok(BTreeSet::new())
    }
    async fn reconciled_periods(&self) -> Result<BTreeSet<Period>, SourceError> {
        Ok(BTreeSet::new())
    }
    async fn inbox_items(&self) -> Result<Vec<InboxItem>, SourceError> {
        Ok(Vec::new())
    }
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 20, 9, 0, 0).unwrap()
}

fn scheduler_with(clock: Arc<dyn Clock>) -> Scheduler {
    let config = CopilotConfig::default();
    let engine = Copilot::new(
        config.clone(),
        Arc::new(Disconnected),
        Arc::new(NoLocalData),
        Arc::new(MemoryKvStore::new()),
        clock,
    )
    .unwrap();
    Scheduler::new(Arc::new(engine), &config.scheduler).unwrap()
}

// -- Throttle ----------------------------------------------------------

#[test]
fn throttle_admits_once_per_interval() {
    let throttle = Throttle::new(Duration::from_secs(300));
    assert!(throttle.try_admit(t0()));
    assert!(!throttle.try_admit(t0() + chrono::Duration::seconds(299)));
    assert!(throttle.try_admit(t0() + chrono::Duration::seconds(300)));
    assert_eq!(throttle.last_admitted(), Some(t0() + chrono::Duration::seconds(300)));
}

#[test]
fn forced_admission_restarts_the_interval() {
    let throttle = Throttle::new(Duration::from_secs(300));
    assert!(throttle.try_admit(t0()));

    let forced_at = t0() + chrono::Duration::seconds(60);
    throttle.force_admit(forced_at);
    assert_eq!(throttle.last_admitted(), Some(forced_at));
    assert!(!throttle.try_admit(t0() + chrono::Duration::seconds(301)));
    assert!(throttle.try_admit(forced_at + chrono::Duration::seconds(300)));
}

// -- Scheduler ---------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn first_check_runs_after_initial_delay() {
    let scheduler = scheduler_with(Arc::new(TokioClock::new()));
    let mut rx = scheduler.engine().subscribe();

    assert_eq!(scheduler.state(), SchedulerState::Stopped);
    assert!(scheduler.start());
    assert!(scheduler.is_running());

    assert!(timeout(Duration::from_secs(4), rx.recv()).await.is_err());
    let update = timeout(Duration::from_secs(2), rx.recv()).await.unwrap().unwrap();
    assert!(!update.notifications.is_empty());

    scheduler.stop();
}

#[tokio::test(start_paused = true)]
async fn cadence_repeats_every_interval() {
    let scheduler = scheduler_with(Arc::new(TokioClock::new()));
    let mut rx = scheduler.engine().subscribe();
    scheduler.start();

    // Initial run, then two interval ticks.
    for _ in 0..3 {
        timeout(Duration::from_secs(1801), rx.recv())
            .await
            .unwrap()
            .unwrap();
    }
    scheduler.stop();
}

#[tokio::test(start_paused = true)]
async fn manual_refresh_makes_the_next_tick_a_noop() {
    let clock = Arc::new(ManualClock::new(t0()));
    let scheduler = scheduler_with(clock.clone());
    let mut rx = scheduler.engine().subscribe();

    assert!(scheduler.engine().force_check().await.is_some());
    rx.recv().await.unwrap();

    // The wall clock has not moved, so the scheduled first run is throttled.
    scheduler.start();
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(rx.try_recv().is_err());
    scheduler.stop();
}

#[tokio::test(start_paused = true)]
async fn stop_is_idempotent_and_cancels_pending_runs() {
    let scheduler = scheduler_with(Arc::new(TokioClock::new()));
    let mut rx = scheduler.engine().subscribe();

    scheduler.start();
    assert!(!scheduler.start(), "second start is a no-op");
    scheduler.stop();
    scheduler.stop();
    assert_eq!(scheduler.state(), SchedulerState::Stopped);

    tokio::time::sleep(Duration::from_secs(3600)).await;
    assert!(rx.try_recv().is_err());
    assert!(scheduler.engine().list().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn scheduler_can_restart_after_stop() {
    let scheduler = scheduler_with(Arc::new(TokioClock::new()));
    let mut rx = scheduler.engine().subscribe();

    scheduler.start();
    scheduler.stop();
    assert!(scheduler.start());
    timeout(Duration::from_secs(6), rx.recv())
        .await
        .unwrap()
        .unwrap();
    scheduler.stop();
}

#[test]
fn zero_interval_is_refused_before_anything_is_spawned() {
    let config = CopilotConfig::default();
    let engine = Copilot::new(
        config.clone(),
        Arc::new(Disconnected),
        Arc::new(NoLocalData),
        Arc::new(MemoryKvStore::new()),
        Arc::new(ManualClock::new(t0())),
    )
    .unwrap();
    let scheduler_config = SchedulerConfig {
        check_interval_secs: 0,
        ..SchedulerConfig::default()
    };

    let result = Scheduler::new(Arc::new(engine), &scheduler_config);
    assert!(matches!(result, Err(CopilotError::Config(_))));
}

#[test]
fn default_config_cadence() {
    let config = SchedulerConfig::default();
    assert_eq!(config.initial_delay(), Duration::from_secs(5));
    assert_eq!(config.check_interval(), Duration::from_secs(30 * 60));
    assert_eq!(config.min_interval(), Duration::from_secs(5 * 60));
}
