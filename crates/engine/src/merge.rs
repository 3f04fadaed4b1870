//! Reconciles a fresh candidate batch against the persisted set.
//!
//! Content always comes from the newest candidate, the read flag always
//! comes from the persisted entry. Any persisted entry whose type was
//! produced this cycle but whose id was not is dropped, read or not: only
//! conditions that still hold survive. Types that produced nothing this
//! cycle are left untouched, except for ids the checks report as resolved.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, warn};

use copilot_core::{sort_notifications, Notification, NotificationType};

/// What a merge changed, for logging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeStats {
    pub added: usize,
    pub refreshed: usize,
    pub evicted_stale: usize,
    pub evicted_cap: usize,
}

/// Produce the next persisted set from `previous` and `candidates`.
///
/// `resolved` lists ids whose condition is known to no longer hold; they are
/// dropped from `previous` unless a candidate regenerates them. The result is
/// sorted by display order and holds at most `cap` entries.
pub fn merge_notifications(
    previous: &[Notification],
    candidates: Vec<Notification>,
    resolved: &[String],
    cap: usize,
) -> (Vec<Notification>, MergeStats) {
    let mut stats = MergeStats::default();
    let mut by_id: HashMap<String, Notification> = previous
        .iter()
        .map(|n| (n.id.clone(), n.clone()))
        .collect();

    let mut fresh_ids: HashSet<String> = HashSet::with_capacity(candidates.len());
    let mut touched_types: HashSet<NotificationType> = HashSet::new();

    for mut candidate in candidates {
        if !fresh_ids.insert(candidate.id.clone()) {
            warn!(id = %candidate.id, "duplicate id within one batch, keeping the first");
            continue;
        }
        touched_types.insert(candidate.kind);

        match by_id.get(&candidate.id) {
            Some(existing) => {
                candidate.read = existing.read;
                stats.refreshed += 1;
            }
            None => stats.added += 1,
        }
        by_id.insert(candidate.id.clone(), candidate);
    }

    let before = by_id.len();
    by_id.retain(|id, n| {
        fresh_ids.contains(id) || !(touched_types.contains(&n.kind) || resolved.contains(id))
    });
    stats.evicted_stale = before - by_id.len();

    let mut merged: Vec<Notification> = by_id.into_values().collect();
    sort_notifications(&mut merged);
    if merged.len() > cap {
        stats.evicted_cap = merged.len() - cap;
        merged.truncate(cap);
    }

    debug!(?stats, total = merged.len(), "merged notifications");
    (merged, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use copilot_core::{display_order, Category, Severity};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 8, 0, 0).unwrap()
    }

    fn make(id: &str, kind: NotificationType) -> Notification {
        Notification::new(id, kind, Category::Warning, Severity::Warning, id, "d", t0())
    }

    fn ids(list: &[Notification]) -> Vec<&str> {
        list.iter().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn merging_unchanged_batch_is_idempotent() {
        let batch = vec![
            make("overdue-invoices-2026-06-01", NotificationType::OverdueInvoice),
            make("vat-reminder-2026-06", NotificationType::VatReminder),
        ];
        let (first, _) = merge_notifications(&[], batch.clone(), &[], 20);
        let (second, stats) = merge_notifications(&first, batch, &[], 20);
        assert_eq!(first, second);
        assert_eq!(stats.refreshed, 2);
        assert_eq!(stats.added, 0);
    }

    #[test]
    fn read_state_survives_regeneration() {
        let (mut persisted, _) = merge_notifications(
            &[],
            vec![make("vat-reminder-2026-06", NotificationType::VatReminder)],
            &[],
            20,
        );
        persisted[0].read = true;

        let mut regenerated = make("vat-reminder-2026-06", NotificationType::VatReminder);
        regenerated.description = "updated figures".to_string();
        let (next, _) = merge_notifications(&persisted, vec![regenerated], &[], 20);

        assert!(next[0].read);
        assert_eq!(next[0].description, "updated figures");
    }

    #[test]
    fn stale_ids_of_touched_types_are_evicted_even_when_read() {
        let mut read_old = make("overdue-invoices-2026-05-31", NotificationType::OverdueInvoice);
        read_old.read = true;
        let previous = vec![
            read_old,
            make("unbooked-invoices-2026-05-31", NotificationType::UnbookedInvoice),
        ];
        let (next, stats) = merge_notifications(
            &previous,
            vec![make("overdue-invoices-2026-06-01", NotificationType::OverdueInvoice)],
            &[],
            20,
        );

        let ids = ids(&next);
        assert!(ids.contains(&"overdue-invoices-2026-06-01"));
        assert!(!ids.contains(&"overdue-invoices-2026-05-31"));
        // Not produced this cycle, so left alone.
        assert!(ids.contains(&"unbooked-invoices-2026-05-31"));
        assert_eq!(stats.evicted_stale, 1);
    }

    #[test]
    fn resolved_ids_are_dropped_even_without_a_same_type_candidate() {
        let previous = vec![
            make("suggest-connect-erp", NotificationType::ActionSuggestion),
            make("overdue-invoices-2026-06-01", NotificationType::OverdueInvoice),
        ];
        let (next, stats) = merge_notifications(
            &previous,
            vec![make("overdue-invoices-2026-06-01", NotificationType::OverdueInvoice)],
            &["suggest-connect-erp".to_string()],
            20,
        );
        assert_eq!(ids(&next), vec!["overdue-invoices-2026-06-01"]);
        assert_eq!(stats.evicted_stale, 1);
    }

    #[test]
    fn candidate_wins_over_its_own_resolution() {
        let mut previous = make("suggest-bank-import", NotificationType::ActionSuggestion);
        previous.read = true;
        let (next, stats) = merge_notifications(
            &[previous],
            vec![make("suggest-bank-import", NotificationType::ActionSuggestion)],
            &["suggest-bank-import".to_string()],
            20,
        );
        assert_eq!(next.len(), 1);
        assert!(next[0].read);
        assert_eq!(stats.refreshed, 1);
        assert_eq!(stats.evicted_stale, 0);
    }

    #[test]
    fn empty_batch_changes_nothing() {
        let previous = vec![make("a", NotificationType::OverdueInvoice)];
        let (next, stats) = merge_notifications(&previous, Vec::new(), &[], 20);
        assert_eq!(next, previous);
        assert_eq!(stats, MergeStats::default());
    }

    #[test]
    fn duplicate_ids_in_batch_keep_first() {
        let mut first = make("x", NotificationType::AmountAnomaly);
        first.title = "first".to_string();
        let mut second = make("x", NotificationType::AmountAnomaly);
        second.title = "second".to_string();
        let (next, _) = merge_notifications(&[], vec![first, second], &[], 20);
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].title, "first");
    }

    #[test]
    fn cap_drops_lowest_priority() {
        let mut candidates = Vec::new();
        for i in 0..15 {
            let mut n = make(&format!("suggestion-{i:02}"), NotificationType::ActionSuggestion);
            n.category = Category::Suggestion;
            n.severity = Severity::Info;
            candidates.push(n);
        }
        for i in 0..10 {
            let mut n = make(&format!("critical-{i:02}"), NotificationType::DuplicateInvoice);
            n.severity = Severity::Critical;
            n.created_at = t0() + Duration::minutes(i);
            candidates.push(n);
        }

        let (next, stats) = merge_notifications(&[], candidates.clone(), &[], 20);
        assert_eq!(next.len(), 20);
        assert_eq!(stats.evicted_cap, 5);
        assert_eq!(next[0].id, "critical-09");

        let dropped: Vec<&Notification> = candidates
            .iter()
            .filter(|c| !next.iter().any(|n| n.id == c.id))
            .collect();
        assert_eq!(dropped.len(), 5);
        for d in dropped {
            for kept in &next {
                assert_eq!(display_order(kept, d), std::cmp::Ordering::Less);
            }
        }
    }
}
