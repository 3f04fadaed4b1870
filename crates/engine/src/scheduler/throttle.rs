//! Minimum-interval gate shared by scheduled and manual triggers.

use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

/// Rejects an invocation that arrives within `min_interval` of the last
/// admitted one.
///
/// The check and the stamp happen under one synchronous lock, so of two
/// racing triggers exactly one is admitted.
#[derive(Debug)]
pub struct Throttle {
    min_interval: chrono::Duration,
    last_admitted: Mutex<Option<DateTime<Utc>>>,
}

impl Throttle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval: chrono::Duration::from_std(min_interval)
                .unwrap_or_else(|_| chrono::Duration::zero()),
            last_admitted: Mutex::new(None),
        }
    }

    /// Admit and stamp `now`, or return `false` if still inside the interval.
    pub fn try_admit(&self, now: DateTime<Utc>) -> bool {
        let mut last = self.last_admitted.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(prev) = *last {
            let elapsed = now.signed_duration_since(prev);
            if elapsed < self.min_interval {
                debug!(
                    "check throttled ({:.0}s remaining)",
                    (self.min_interval - elapsed).num_milliseconds() as f64 / 1000.0,
                );
                return false;
            }
        }
        *last = Some(now);
        true
    }

    /// Admit unconditionally and stamp `now` under the same lock a racing
    /// [`try_admit`](Self::try_admit) takes.
    pub fn force_admit(&self, now: DateTime<Utc>) {
        *self.last_admitted.lock().unwrap_or_else(|e| e.into_inner()) = Some(now);
    }

    pub fn last_admitted(&self) -> Option<DateTime<Utc>> {
        *self.last_admitted.lock().unwrap_or_else(|e| e.into_inner())
    }
}
