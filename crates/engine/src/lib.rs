//! Proactive bookkeeping notifications.
//!
//! This crate provides:
//! - Ten checks that turn ERP and local bookkeeping data into candidate notifications
//! - An orchestrator that runs them against async data sources, tolerating partial failure
//! - A merge step that keeps the persisted set fresh, bounded and read-state aware
//! - A persisted store with a broadcast update bus
//! - A throttled scheduler driving one [`Copilot`] instance per company

pub mod checks;
pub mod clock;
pub mod engine;
pub mod merge;
pub mod orchestrator;
pub mod scheduler;
pub mod sources;
pub mod storage;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{Copilot, CycleOutcome};
pub use orchestrator::{CheckOrchestrator, CycleReport};
pub use scheduler::{Scheduler, SchedulerState};
pub use sources::{ErpSource, JsonFileErp, KvLocalData, LocalDataSource};
pub use storage::{FileKvStore, KvStore, MemoryKvStore, StoreError};
pub use store::{NotificationStore, NotificationUpdate};
