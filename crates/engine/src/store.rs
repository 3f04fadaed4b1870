//! Persisted notification set and the update bus.
//!
//! The set is loaded once when the store is opened and written back after
//! every mutation. A write that fails leaves both the in-memory and the
//! on-disk set as they were. Every successful mutation is published on a
//! broadcast channel so consumers never poll.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use copilot_core::{sort_notifications, unread_count, CopilotError, Notification};

use crate::merge::{merge_notifications, MergeStats};
use crate::storage::KvStore;

/// Buffered updates per subscriber before the oldest are dropped.
const UPDATE_CHANNEL_CAPACITY: usize = 64;

/// Snapshot published after every successful mutation or cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationUpdate {
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
}

struct StoreState {
    notifications: Vec<Notification>,
    /// Highest cycle sequence number merged so far.
    last_cycle: u64,
}

pub struct NotificationStore {
    kv: Arc<dyn KvStore>,
    key: String,
    cap: usize,
    state: Mutex<StoreState>,
    updates: broadcast::Sender<NotificationUpdate>,
}

impl NotificationStore {
    /// Load the persisted set stored under `key`.
    ///
    /// A blob that does not parse is treated as an empty set. A backend that
    /// cannot be read at all is an error.
    pub fn open(kv: Arc<dyn KvStore>, key: impl Into<String>, cap: usize) -> Result<Self, CopilotError> {
        let key = key.into();
        let mut notifications = match kv.load(&key)? {
            None => Vec::new(),
            Some(bytes) => serde_json::from_slice::<Vec<Notification>>(&bytes).unwrap_or_else(|e| {
                warn!(key = %key, error = %e, "persisted notifications unparsable, starting empty");
                Vec::new()
            }),
        };
        sort_notifications(&mut notifications);
        notifications.truncate(cap);
        info!(key = %key, count = notifications.len(), "notification store opened");

        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Ok(Self {
            kv,
            key,
            cap,
            state: Mutex::new(StoreState {
                notifications,
                last_cycle: 0,
            }),
            updates,
        })
    }

    /// Current set in display order.
    pub async fn list(&self) -> Vec<Notification> {
        self.state.lock().await.notifications.clone()
    }

    pub async fn unread_count(&self) -> usize {
        unread_count(&self.state.lock().await.notifications)
    }

    /// Receive an update after every successful mutation.
    pub fn subscribe(&self) -> broadcast::Receiver<NotificationUpdate> {
        self.updates.subscribe()
    }

    /// Mark one notification read. Returns `false` for unknown or already-read ids.
    pub async fn mark_read(&self, id: &str) -> Result<bool, CopilotError> {
        let mut state = self.state.lock().await;
        let Some(pos) = state.notifications.iter().position(|n| n.id == id) else {
            debug!(id, "mark_read on unknown id");
            return Ok(false);
        };
        if state.notifications[pos].read {
            return Ok(false);
        }
        let mut next = state.notifications.clone();
        next[pos].read = true;
        self.commit(&mut state, next)?;
        Ok(true)
    }

    /// Mark every notification read. Returns how many changed.
    pub async fn mark_all_read(&self) -> Result<usize, CopilotError> {
        let mut state = self.state.lock().await;
        let changed = unread_count(&state.notifications);
        if changed == 0 {
            return Ok(0);
        }
        let mut next = state.notifications.clone();
        next.iter_mut().for_each(|n| n.read = true);
        self.commit(&mut state, next)?;
        Ok(changed)
    }

    /// Remove a notification outright. Returns `false` for unknown ids.
    pub async fn dismiss(&self, id: &str) -> Result<bool, CopilotError> {
        let mut state = self.state.lock().await;
        if !state.notifications.iter().any(|n| n.id == id) {
            debug!(id, "dismiss on unknown id");
            return Ok(false);
        }
        let next: Vec<Notification> = state
            .notifications
            .iter()
            .filter(|n| n.id != id)
            .cloned()
            .collect();
        self.commit(&mut state, next)?;
        Ok(true)
    }

    /// Merge one cycle's candidates into the set.
    ///
    /// `cycle` is the cycle's sequence number. A cycle older than one
    /// already merged is discarded and `Ok(None)` is returned. `resolved`
    /// ids are dropped unless regenerated.
    pub async fn merge_cycle(
        &self,
        cycle: u64,
        candidates: Vec<Notification>,
        resolved: &[String],
    ) -> Result<Option<MergeStats>, CopilotError> {
        let mut state = self.state.lock().await;
        if cycle < state.last_cycle {
            warn!(cycle, last = state.last_cycle, "discarding result of superseded cycle");
            return Ok(None);
        }
        let (next, stats) = merge_notifications(&state.notifications, candidates, resolved, self.cap);
        self.commit(&mut state, next)?;
        state.last_cycle = cycle;
        Ok(Some(stats))
    }

    /// Persist `next`, then swap it in and publish. Nothing changes on failure.
    fn commit(&self, state: &mut StoreState, next: Vec<Notification>) -> Result<(), CopilotError> {
        let bytes = serde_json::to_vec(&next)?;
        self.kv.save(&self.key, &bytes)?;
        state.notifications = next;

        let update = NotificationUpdate {
            unread_count: unread_count(&state.notifications),
            notifications: state.notifications.clone(),
        };
        // No subscribers is fine.
        let _ = self.updates.send(update);
        Ok(())
    }
}
