//! The ten analyzers that turn bookkeeping data into candidate notifications.
//!
//! Every check is a plain function over already-fetched inputs and a
//! [`CheckContext`]. None of them fetch, schedule, or write anything, so the
//! orchestrator can call them in any order and tests can call them directly.

mod anomaly;
mod bookkeeping;
mod deadlines;
mod invoices;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use copilot_core::CheckPolicy;

pub use self::anomaly::{check_amount_anomalies, check_duplicate_invoices};
pub use self::bookkeeping::{
    check_bank_reconciliation, check_invoice_inbox, resolved_suggestions, suggest_actions,
    SUGGEST_BANK_IMPORT_ID, SUGGEST_CONNECT_ERP_ID,
};
pub use self::deadlines::{check_employer_contributions, check_vat_reminder};
pub use self::invoices::{check_cash_flow, check_overdue_invoices, check_unbooked_invoices};

/// Time and policy shared by every check in one cycle.
#[derive(Debug, Clone)]
pub struct CheckContext {
    /// Generation timestamp stamped on every candidate.
    pub now: DateTime<Utc>,
    /// Calendar date used for due-date and deadline arithmetic.
    pub today: NaiveDate,
    pub policy: CheckPolicy,
}

impl CheckContext {
    pub fn new(now: DateTime<Utc>, policy: CheckPolicy) -> Self {
        Self {
            now,
            today: now.date_naive(),
            policy,
        }
    }

    /// `YYYY-MM-DD`, used to scope daily ids.
    pub(crate) fn day_key(&self) -> String {
        self.today.format("%Y-%m-%d").to_string()
    }

    /// `YYYY-MM`, used to scope monthly ids.
    pub(crate) fn month_key(&self) -> String {
        self.today.format("%Y-%m").to_string()
    }
}

/// Identifies a check for cycle reports and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckKind {
    OverdueInvoices,
    UnbookedInvoices,
    CashFlow,
    AmountAnomaly,
    DuplicateInvoice,
    VatReminder,
    EmployerContributions,
    BankReconciliation,
    InvoiceInbox,
    ActionSuggestions,
}

impl CheckKind {
    /// Checks that can only run against a live ERP connection.
    pub const ERP_DEPENDENT: [CheckKind; 5] = [
        CheckKind::OverdueInvoices,
        CheckKind::UnbookedInvoices,
        CheckKind::CashFlow,
        CheckKind::AmountAnomaly,
        CheckKind::DuplicateInvoice,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CheckKind::OverdueInvoices => "overdue_invoices",
            CheckKind::UnbookedInvoices => "unbooked_invoices",
            CheckKind::CashFlow => "cash_flow",
            CheckKind::AmountAnomaly => "amount_anomaly",
            CheckKind::DuplicateInvoice => "duplicate_invoice",
            CheckKind::VatReminder => "vat_reminder",
            CheckKind::EmployerContributions => "employer_contributions",
            CheckKind::BankReconciliation => "bank_reconciliation",
            CheckKind::InvoiceInbox => "invoice_inbox",
            CheckKind::ActionSuggestions => "action_suggestions",
        }
    }
}

impl std::fmt::Display for CheckKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// `1 invoice` / `3 invoices`.
pub(crate) fn plural(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}
