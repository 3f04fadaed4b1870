//! Periodic cadence for one [`Copilot`](crate::engine::Copilot) instance.
//!
//! The [`Scheduler`] runs a first check shortly after start and then one per
//! interval. Both scheduled and manual triggers go through the same
//! [`Throttle`], so a manual refresh right before a scheduled tick makes the
//! tick a no-op.

mod core;
mod throttle;

#[cfg(test)]
mod tests;

pub use self::core::{Scheduler, SchedulerState};
pub use self::throttle::Throttle;
