//! Runs every check for one cycle.
//!
//! The orchestrator fetches each input once, concurrently, then feeds the
//! checks. ERP-backed checks run only against a live connection. A source
//! that fails to load silences just the checks that read it; everything else
//! still runs. An empty candidate list is a normal outcome.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use copilot_core::{ErpStatus, Notification, SourceError};

use crate::checks::{self, CheckContext, CheckKind};
use crate::sources::{ErpSource, LocalDataSource};

/// Outcome of one orchestrated cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub erp_status: ErpStatus,
    pub candidates: Vec<Notification>,
    pub checks_run: Vec<CheckKind>,
    pub checks_skipped: Vec<CheckKind>,
    /// Previously emitted ids whose condition is known to be over.
    pub resolved: Vec<String>,
    /// Sources that failed to load, with the error message.
    pub failed_sources: Vec<(String, String)>,
    pub duration_ms: u64,
}

impl CycleReport {
    fn new(erp_status: ErpStatus) -> Self {
        Self {
            erp_status,
            candidates: Vec::new(),
            checks_run: Vec::new(),
            checks_skipped: Vec::new(),
            resolved: Vec::new(),
            failed_sources: Vec::new(),
            duration_ms: 0,
        }
    }

    fn ran(&mut self, kind: CheckKind, produced: impl IntoIterator<Item = Notification>) {
        let before = self.candidates.len();
        self.candidates.extend(produced);
        debug!(check = %kind, produced = self.candidates.len() - before, "check finished");
        self.checks_run.push(kind);
    }

    fn skipped(&mut self, kinds: &[CheckKind]) {
        for kind in kinds {
            debug!(check = %kind, "check skipped");
            self.checks_skipped.push(*kind);
        }
    }

    /// Unwrap a fetch result, recording and logging a failure.
    fn fetched<T>(&mut self, source: &str, result: Result<T, SourceError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(source, error = %e, "data source failed, dependent checks skipped");
                self.failed_sources.push((source.to_string(), e.to_string()));
                None
            }
        }
    }
}

pub struct CheckOrchestrator {
    erp: Arc<dyn ErpSource>,
    local: Arc<dyn LocalDataSource>,
}

impl CheckOrchestrator {
    pub fn new(erp: Arc<dyn ErpSource>, local: Arc<dyn LocalDataSource>) -> Self {
        Self { erp, local }
    }

    /// Fetch inputs and run all checks once.
    pub async fn run(&self, ctx: &CheckContext) -> CycleReport {
        let start = Instant::now();
        let erp_status = self.erp.status().await;
        let connected = erp_status.is_connected();

        let erp_fetch = async {
            if connected {
                let (payables, receivables) =
                    tokio::join!(self.erp.supplier_invoices(), self.erp.customer_invoices());
                Some((payables, receivables))
            } else {
                None
            }
        };
        let (erp_data, imported, reconciled, inbox) = tokio::join!(
            erp_fetch,
            self.local.imported_periods(),
            self.local.reconciled_periods(),
            self.local.inbox_items(),
        );

        let mut report = CycleReport::new(erp_status);

        // ── ERP-backed checks ─────────────────────────────────
        match erp_data {
            None => {
                debug!(status = ?erp_status, "ERP not connected");
                report.skipped(&CheckKind::ERP_DEPENDENT);
            }
            Some((payables, receivables)) => {
                let payables = report.fetched("supplier_invoices", payables);
                let receivables = report.fetched("customer_invoices", receivables);

                match &payables {
                    Some(payables) => {
                        report.ran(CheckKind::OverdueInvoices, checks::check_overdue_invoices(payables, ctx));
                        report.ran(CheckKind::UnbookedInvoices, checks::check_unbooked_invoices(payables, ctx));
                        report.ran(CheckKind::AmountAnomaly, checks::check_amount_anomalies(payables, ctx));
                        report.ran(CheckKind::DuplicateInvoice, checks::check_duplicate_invoices(payables, ctx));
                    }
                    None => report.skipped(&[
                        CheckKind::OverdueInvoices,
                        CheckKind::UnbookedInvoices,
                        CheckKind::AmountAnomaly,
                        CheckKind::DuplicateInvoice,
                    ]),
                }

                match (&receivables, &payables) {
                    (Some(receivables), Some(payables)) => {
                        report.ran(CheckKind::CashFlow, checks::check_cash_flow(receivables, payables, ctx));
                    }
                    _ => report.skipped(&[CheckKind::CashFlow]),
                }
            }
        }

        // ── Calendar checks ───────────────────────────────────
        report.ran(CheckKind::VatReminder, checks::check_vat_reminder(ctx));
        report.ran(CheckKind::EmployerContributions, checks::check_employer_contributions(ctx));

        // ── Local bookkeeping checks ──────────────────────────
        let imported = report.fetched("bank_imports", imported);
        let reconciled = report.fetched("reconciled_periods", reconciled);
        match (&imported, &reconciled) {
            (Some(imported), Some(reconciled)) => {
                report.ran(
                    CheckKind::BankReconciliation,
                    checks::check_bank_reconciliation(imported, reconciled, ctx),
                );
            }
            _ => report.skipped(&[CheckKind::BankReconciliation]),
        }

        match report.fetched("invoice_inbox", inbox) {
            Some(items) => report.ran(CheckKind::InvoiceInbox, checks::check_invoice_inbox(&items, ctx)),
            None => report.skipped(&[CheckKind::InvoiceInbox]),
        }

        report.ran(
            CheckKind::ActionSuggestions,
            checks::suggest_actions(erp_status, imported.as_ref(), ctx),
        );
        report.resolved = checks::resolved_suggestions(erp_status, imported.as_ref());

        report.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            erp = ?erp_status,
            candidates = report.candidates.len(),
            run = report.checks_run.len(),
            skipped = report.checks_skipped.len(),
            failed_sources = report.failed_sources.len(),
            duration_ms = report.duration_ms,
            "check cycle evaluated"
        );
        report
    }
}
