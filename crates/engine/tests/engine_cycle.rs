//! End-to-end cycles through file-backed sources and storage.

use std::path::Path;
use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use tempfile::TempDir;

use copilot_core::{CopilotConfig, NotificationType};
use copilot_engine::{Copilot, FileKvStore, JsonFileErp, KvLocalData, KvStore, ManualClock};

struct Fixture {
    data: TempDir,
    erp: TempDir,
    clock: Arc<ManualClock>,
}

impl Fixture {
    fn new() -> Self {
        let fixture = Self {
            data: tempfile::tempdir().unwrap(),
            erp: tempfile::tempdir().unwrap(),
            clock: Arc::new(ManualClock::new(
                Utc.with_ymd_and_hms(2026, 6, 20, 9, 0, 0).unwrap(),
            )),
        };
        fixture.write_erp("erp_status.json", r#""connected""#);
        fixture.write_erp(
            "supplier_invoices.json",
            r#"[
                {"GivenNumber": "101", "SupplierNumber": "S1", "InvoiceNumber": "A-1",
                 "DueDate": "2026-06-01", "Total": 1200.0, "Balance": 1200.0, "Booked": true},
                {"GivenNumber": "102", "SupplierNumber": "S2", "InvoiceNumber": "B-7",
                 "DueDate": "2026-07-01", "Total": 800.0, "Balance": 800.0, "Booked": false}
            ]"#,
        );
        fixture.write_erp("customer_invoices.json", "[]");
        fixture
    }

    fn write_erp(&self, file: &str, body: &str) {
        std::fs::write(self.erp.path().join(file), body).unwrap();
    }

    fn write_data(&self, file: &str, body: &str) {
        std::fs::write(self.data.path().join(file), body).unwrap();
    }

    fn engine(&self) -> Copilot {
        let kv: Arc<dyn KvStore> = Arc::new(FileKvStore::open(self.data.path()).unwrap());
        Copilot::new(
            CopilotConfig::default(),
            Arc::new(JsonFileErp::new(self.erp.path())),
            Arc::new(KvLocalData::new(kv.clone())),
            kv,
            self.clock.clone(),
        )
        .unwrap()
    }
}

fn ids(list: &[copilot_core::Notification]) -> Vec<&str> {
    list.iter().map(|n| n.id.as_str()).collect()
}

fn persisted_file(dir: &Path) -> std::path::PathBuf {
    dir.join("copilot-notifications-default.json")
}

#[tokio::test]
async fn state_survives_restart_with_read_flags() {
    let fixture = Fixture::new();
    let engine = fixture.engine();
    engine.force_check().await.unwrap();

    let list = engine.list().await;
    assert!(ids(&list).contains(&"overdue-invoices-2026-06-20"));
    assert!(ids(&list).contains(&"unbooked-invoices-2026-06-20"));
    assert!(ids(&list).contains(&"suggest-bank-import"));
    assert!(persisted_file(fixture.data.path()).exists());

    assert!(engine.mark_read("overdue-invoices-2026-06-20").await.unwrap());
    let unread_before = engine.unread_count().await;
    drop(engine);

    let reopened = fixture.engine();
    assert_eq!(reopened.list().await, list_with_read(list, "overdue-invoices-2026-06-20"));
    assert_eq!(reopened.unread_count().await, unread_before);
}

fn list_with_read(
    mut list: Vec<copilot_core::Notification>,
    id: &str,
) -> Vec<copilot_core::Notification> {
    for n in &mut list {
        if n.id == id {
            n.read = true;
        }
    }
    list
}

#[tokio::test]
async fn next_day_replaces_stale_ids_even_when_read() {
    let fixture = Fixture::new();
    let engine = fixture.engine();
    engine.force_check().await.unwrap();
    engine.mark_all_read().await.unwrap();

    fixture.clock.advance(Duration::days(1));
    engine.force_check().await.unwrap();

    let list = engine.list().await;
    let ids = ids(&list);
    assert!(ids.contains(&"overdue-invoices-2026-06-21"));
    assert!(!ids.contains(&"overdue-invoices-2026-06-20"));
    // Month-scoped and fixed ids are regenerated in place and stay read.
    let nudge = list.iter().find(|n| n.id == "suggest-bank-import").unwrap();
    assert!(nudge.read);
}

#[tokio::test]
async fn disconnecting_the_erp_keeps_untouched_types() {
    let fixture = Fixture::new();
    let engine = fixture.engine();
    engine.force_check().await.unwrap();

    std::fs::remove_file(fixture.erp.path().join("erp_status.json")).unwrap();
    fixture.clock.advance(Duration::days(1));
    let outcome = engine.force_check().await.unwrap();
    assert!(outcome.report.checks_skipped.len() >= 5);

    let list = engine.list().await;
    let ids = ids(&list);
    // No overdue check ran, so yesterday's entry is not evicted.
    assert!(ids.contains(&"overdue-invoices-2026-06-20"));
    // The suggestion type was produced again, now with the reconnect nudge only.
    assert!(ids.contains(&"suggest-connect-erp"));
    assert!(!ids.contains(&"suggest-bank-import"));
}

#[tokio::test]
async fn local_bookkeeping_files_feed_the_checks() {
    let fixture = Fixture::new();
    fixture.write_data(
        "bank-imports.json",
        r#"[{"period": "2026-04"}, {"period": "2026-05"}, {"period": "2026-05"}]"#,
    );
    fixture.write_data("reconciled-periods.json", r#"["2026-04"]"#);
    fixture.write_data(
        "invoice-inbox.json",
        r#"[{"id": "i1", "amount": 450.0, "status": "new"},
            {"id": "i2", "amount": 99.0, "status": "booked"}]"#,
    );
    let engine = fixture.engine();
    engine.force_check().await.unwrap();

    let list = engine.list().await;
    let reconciliation = list
        .iter()
        .find(|n| n.kind == NotificationType::BankReconciliation)
        .unwrap();
    assert_eq!(reconciliation.title, "1 period to reconcile");
    let inbox = list
        .iter()
        .find(|n| n.kind == NotificationType::InvoiceInbox)
        .unwrap();
    assert_eq!(inbox.title, "1 invoice in the inbox");
    assert!(!ids(&list).contains(&"suggest-bank-import"));
}

#[tokio::test]
async fn corrupt_inputs_do_not_break_the_cycle() {
    let fixture = Fixture::new();
    fixture.write_erp("supplier_invoices.json", "{not json");
    fixture.write_data("invoice-inbox.json", "garbage");
    std::fs::write(persisted_file(fixture.data.path()), "[{").unwrap();

    let engine = fixture.engine();
    assert!(engine.list().await.is_empty());
    let outcome = engine.force_check().await.unwrap();

    assert_eq!(outcome.report.failed_sources.len(), 1);
    assert_eq!(outcome.report.failed_sources[0].0, "supplier_invoices");
    assert!(!engine.list().await.is_empty());
}

#[tokio::test]
async fn throttle_and_force() {
    let fixture = Fixture::new();
    let engine = fixture.engine();

    assert!(engine.run_check().await.is_some());
    assert!(engine.run_check().await.is_none());
    fixture.clock.advance(Duration::minutes(2));
    assert!(engine.run_check().await.is_none());
    assert!(engine.force_check().await.is_some());
    fixture.clock.advance(Duration::minutes(5));
    assert!(engine.run_check().await.is_some());
}

#[tokio::test]
async fn reconnecting_the_erp_retracts_the_reconnect_nudge() {
    let fixture = Fixture::new();
    std::fs::remove_file(fixture.erp.path().join("erp_status.json")).unwrap();
    let engine = fixture.engine();
    engine.force_check().await.unwrap();
    assert!(ids(&engine.list().await).contains(&"suggest-connect-erp"));

    // Back online with imports on file: no suggestion is produced at all.
    fixture.write_erp("erp_status.json", r#""connected""#);
    fixture.write_data("bank-imports.json", r#"[{"period": "2026-06"}]"#);
    fixture.write_data("reconciled-periods.json", r#"["2026-06"]"#);
    let outcome = engine.force_check().await.unwrap();
    assert!(!outcome
        .report
        .candidates
        .iter()
        .any(|n| n.kind == NotificationType::ActionSuggestion));

    let list = engine.list().await;
    assert!(!ids(&list).contains(&"suggest-connect-erp"));
    assert!(ids(&list).contains(&"overdue-invoices-2026-06-20"));
}

#[tokio::test]
async fn first_import_retracts_the_import_nudge() {
    let fixture = Fixture::new();
    let engine = fixture.engine();
    engine.force_check().await.unwrap();
    assert!(ids(&engine.list().await).contains(&"suggest-bank-import"));

    fixture.write_data("bank-imports.json", r#"[{"period": "2026-06"}]"#);
    engine.force_check().await.unwrap();
    assert!(!ids(&engine.list().await).contains(&"suggest-bank-import"));
}
