//! The per-company copilot instance.
//!
//! [`Copilot`] owns everything one company needs: the data sources, the
//! persisted notification set, the throttle and the clock. Nothing is global;
//! two companies are simply two instances.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info};

use copilot_core::{CopilotConfig, CopilotError, Notification};

use crate::checks::CheckContext;
use crate::clock::Clock;
use crate::merge::MergeStats;
use crate::orchestrator::{CheckOrchestrator, CycleReport};
use crate::scheduler::Throttle;
use crate::sources::{ErpSource, LocalDataSource};
use crate::storage::KvStore;
use crate::store::{NotificationStore, NotificationUpdate};

/// Result of a cycle that ran and persisted.
#[derive(Debug, Clone, Serialize)]
pub struct CycleOutcome {
    pub cycle: u64,
    pub report: CycleReport,
    pub merge: MergeStats,
}

pub struct Copilot {
    config: CopilotConfig,
    orchestrator: CheckOrchestrator,
    store: NotificationStore,
    clock: Arc<dyn Clock>,
    throttle: Throttle,
    /// Serializes cycle bodies.
    cycle_lock: Mutex<()>,
    /// Sequence number handed to the next admitted cycle.
    next_cycle: AtomicU64,
    /// Bumped to invalidate cycles already in flight.
    epoch: AtomicU64,
}

impl Copilot {
    /// Wire up an instance and load the persisted set for `config.company_id`.
    pub fn new(
        config: CopilotConfig,
        erp: Arc<dyn ErpSource>,
        local: Arc<dyn LocalDataSource>,
        kv: Arc<dyn KvStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, CopilotError> {
        let store = NotificationStore::open(
            kv,
            config.notifications_key(),
            config.policy.max_notifications,
        )?;
        let throttle = Throttle::new(config.scheduler.min_interval());
        info!(company = %config.company_id, "copilot ready");

        Ok(Self {
            orchestrator: CheckOrchestrator::new(erp, local),
            store,
            clock,
            throttle,
            cycle_lock: Mutex::new(()),
            next_cycle: AtomicU64::new(1),
            epoch: AtomicU64::new(0),
            config,
        })
    }

    pub fn config(&self) -> &CopilotConfig {
        &self.config
    }

    // ── Read side ─────────────────────────────────────────────

    pub async fn list(&self) -> Vec<Notification> {
        self.store.list().await
    }

    pub async fn unread_count(&self) -> usize {
        self.store.unread_count().await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NotificationUpdate> {
        self.store.subscribe()
    }

    // ── Mutations ─────────────────────────────────────────────

    pub async fn mark_read(&self, id: &str) -> Result<bool, CopilotError> {
        self.store.mark_read(id).await
    }

    pub async fn mark_all_read(&self) -> Result<usize, CopilotError> {
        self.store.mark_all_read().await
    }

    pub async fn dismiss(&self, id: &str) -> Result<bool, CopilotError> {
        self.store.dismiss(id).await
    }

    // ── Cycles ────────────────────────────────────────────────

    /// Run a cycle unless one was admitted within the minimum interval.
    ///
    /// Returns `None` when throttled, discarded, or failed; the latter two
    /// are logged.
    pub async fn run_check(&self) -> Option<CycleOutcome> {
        if !self.throttle.try_admit(self.clock.now()) {
            return None;
        }
        self.run_admitted().await
    }

    /// Restart the throttle interval and run a cycle unconditionally.
    pub async fn force_check(&self) -> Option<CycleOutcome> {
        self.throttle.force_admit(self.clock.now());
        self.run_admitted().await
    }

    /// Make every cycle currently in flight drop its result.
    pub fn discard_in_flight(&self) {
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(epoch, "in-flight cycles invalidated");
    }

    async fn run_admitted(&self) -> Option<CycleOutcome> {
        let epoch = self.epoch.load(Ordering::SeqCst);

        let _guard = self.cycle_lock.lock().await;
        // Numbered in lock order, so a later merge always carries a higher number.
        let cycle = self.next_cycle.fetch_add(1, Ordering::SeqCst);
        let ctx = CheckContext::new(self.clock.now(), self.config.policy.clone());
        info!(company = %self.config.company_id, cycle, "check cycle started");

        let report = self.orchestrator.run(&ctx).await;

        if self.epoch.load(Ordering::SeqCst) != epoch {
            info!(cycle, "engine stopped during cycle, result discarded");
            return None;
        }

        match self
            .store
            .merge_cycle(cycle, report.candidates.clone(), &report.resolved)
            .await
        {
            Ok(Some(merge)) => {
                info!(
                    company = %self.config.company_id,
                    cycle,
                    added = merge.added,
                    refreshed = merge.refreshed,
                    evicted = merge.evicted_stale + merge.evicted_cap,
                    "check cycle persisted"
                );
                Some(CycleOutcome { cycle, report, merge })
            }
            Ok(None) => None,
            Err(e) => {
                error!(company = %self.config.company_id, cycle, error = %e, "check cycle failed to persist, previous set kept");
                None
            }
        }
    }
}
