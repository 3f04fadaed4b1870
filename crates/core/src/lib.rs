//! Shared types for the Copilot notification engine.

pub mod config;
pub mod error;
pub mod ledger;
pub mod notification;

pub use config::{CheckPolicy, CopilotConfig, SchedulerConfig, StorageConfig};
pub use error::*;
pub use ledger::*;
pub use notification::*;
