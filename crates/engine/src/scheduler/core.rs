//! [`Scheduler`]: start/stop state machine around the periodic check loop.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use copilot_core::{CopilotError, SchedulerConfig};

use crate::engine::Copilot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerState {
    Stopped,
    Running,
}

struct RunningLoop {
    shutdown: Arc<Notify>,
    handle: JoinHandle<()>,
}

pub struct Scheduler {
    engine: Arc<Copilot>,
    initial_delay: Duration,
    interval: Duration,
    running: Mutex<Option<RunningLoop>>,
}

impl Scheduler {
    /// Fails with [`CopilotError::Config`] for a zero check interval.
    pub fn new(engine: Arc<Copilot>, config: &SchedulerConfig) -> Result<Self, CopilotError> {
        config.validate()?;
        Ok(Self {
            engine,
            initial_delay: config.initial_delay(),
            interval: config.check_interval(),
            running: Mutex::new(None),
        })
    }

    pub fn engine(&self) -> &Arc<Copilot> {
        &self.engine
    }

    pub fn state(&self) -> SchedulerState {
        let running = self.running.lock().unwrap_or_else(|e| e.into_inner());
        match running.as_ref() {
            Some(r) if !r.handle.is_finished() => SchedulerState::Running,
            _ => SchedulerState::Stopped,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == SchedulerState::Running
    }

    /// Spawn the check loop. Returns `false` if it is already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> bool {
        let mut running = self.running.lock().unwrap_or_else(|e| e.into_inner());
        if running.as_ref().is_some_and(|r| !r.handle.is_finished()) {
            debug!("scheduler already running");
            return false;
        }

        let shutdown = Arc::new(Notify::new());
        let handle = tokio::spawn(run_loop(
            self.engine.clone(),
            self.initial_delay,
            self.interval,
            shutdown.clone(),
        ));
        *running = Some(RunningLoop { shutdown, handle });
        info!(
            company = %self.engine.config().company_id,
            initial_delay_secs = self.initial_delay.as_secs(),
            interval_secs = self.interval.as_secs(),
            "scheduler started"
        );
        true
    }

    /// Stop the loop and drop the result of any cycle in flight.
    ///
    /// Idempotent: stopping a stopped scheduler does nothing.
    pub fn stop(&self) {
        let Some(running) = self
            .running
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        else {
            return;
        };
        self.engine.discard_in_flight();
        // A stored permit wakes the loop even if it is mid-cycle right now.
        running.shutdown.notify_one();
        info!(company = %self.engine.config().company_id, "scheduler stopped");
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_loop(
    engine: Arc<Copilot>,
    initial_delay: Duration,
    interval: Duration,
    shutdown: Arc<Notify>,
) {
    tokio::select! {
        _ = shutdown.notified() => return,
        _ = tokio::time::sleep(initial_delay) => {}
    }
    engine.run_check().await;

    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = shutdown.notified() => break,
            _ = ticker.tick() => {
                debug!("scheduled check tick");
                engine.run_check().await;
            }
        }
    }
    debug!("scheduler loop exited");
}
