//! Checks over locally tracked bookkeeping state, plus contextual nudges.

use std::collections::BTreeSet;

use copilot_core::{
    format_sek, Category, ErpStatus, InboxItem, Notification, NotificationType, Period, Severity,
};

use super::{plural, CheckContext};

pub const SUGGEST_BANK_IMPORT_ID: &str = "suggest-bank-import";
pub const SUGGEST_CONNECT_ERP_ID: &str = "suggest-connect-erp";

/// Periods with imported bank transactions that are not yet reconciled.
pub fn check_bank_reconciliation(
    imported: &BTreeSet<Period>,
    reconciled: &BTreeSet<Period>,
    ctx: &CheckContext,
) -> Option<Notification> {
    let unreconciled: Vec<&Period> = imported.difference(reconciled).collect();
    if unreconciled.is_empty() {
        return None;
    }

    let count = unreconciled.len();
    let severity = if count >= ctx.policy.reconciliation_warning_periods {
        Severity::Warning
    } else {
        Severity::Info
    };
    let shown: Vec<&str> = unreconciled.iter().take(3).map(|p| p.as_str()).collect();
    let more = if count > shown.len() { ", ..." } else { "" };

    Some(
        Notification::new(
            format!("bank-reconciliation-{}", ctx.day_key()),
            NotificationType::BankReconciliation,
            Category::Suggestion,
            severity,
            format!("{} to reconcile", plural(count, "period", "periods")),
            format!(
                "Bank transactions are imported but not reconciled for {}{}.",
                shown.join(", "),
                more
            ),
            ctx.now,
        )
        .with_prompt("Help me reconcile my imported bank transactions.")
        .with_action("bank-reconciliation"),
    )
}

/// Inbox items still waiting to be booked or paid.
pub fn check_invoice_inbox(items: &[InboxItem], ctx: &CheckContext) -> Option<Notification> {
    let pending: Vec<&InboxItem> = items.iter().filter(|i| i.status.is_pending()).collect();
    if pending.is_empty() {
        return None;
    }

    let total: f64 = pending.iter().map(|i| i.amount).sum();
    let overdue = pending
        .iter()
        .filter(|i| i.due_date.is_some_and(|d| d < ctx.today))
        .count();
    let severity = if overdue > 0 { Severity::Warning } else { Severity::Info };

    let mut description = format!(
        "{} worth {} waiting in the invoice inbox.",
        plural(pending.len(), "invoice", "invoices"),
        format_sek(total)
    );
    if overdue > 0 {
        description.push_str(&format!(" {overdue} of them past due."));
    }

    Some(
        Notification::new(
            format!("invoice-inbox-{}", ctx.day_key()),
            NotificationType::InvoiceInbox,
            Category::Suggestion,
            severity,
            format!("{} in the inbox", plural(pending.len(), "invoice", "invoices")),
            description,
            ctx.now,
        )
        .with_prompt("Go through my invoice inbox and help me book the pending invoices.")
        .with_action("invoice-inbox"),
    )
}

/// Contextual nudges. `imported` is `None` when the import history could
/// not be read, in which case the import nudge is not evaluated.
pub fn suggest_actions(
    erp: ErpStatus,
    imported: Option<&BTreeSet<Period>>,
    ctx: &CheckContext,
) -> Vec<Notification> {
    let mut out = Vec::new();

    if erp.is_connected() && imported.is_some_and(|p| p.is_empty()) {
        out.push(
            Notification::new(
                SUGGEST_BANK_IMPORT_ID,
                NotificationType::ActionSuggestion,
                Category::Suggestion,
                Severity::Info,
                "Import a bank statement",
                "Your ERP is connected but no bank transactions have been imported yet. \
                 Import a statement to start reconciling.",
                ctx.now,
            )
            .with_prompt("Help me import my latest bank statement.")
            .with_action("bank-import"),
        );
    }

    if erp == ErpStatus::Disconnected {
        out.push(
            Notification::new(
                SUGGEST_CONNECT_ERP_ID,
                NotificationType::ActionSuggestion,
                Category::Suggestion,
                Severity::Info,
                "Connect your ERP",
                "Invoice checks are paused until the ERP connection is restored.",
                ctx.now,
            )
            .with_prompt("Help me reconnect my ERP integration.")
            .with_action("erp-settings"),
        );
    }

    out
}

/// Nudge ids whose condition is known to be over.
///
/// A nudge is only retracted on positive evidence: an unreadable import
/// history or an `Unknown` ERP status resolves nothing.
pub fn resolved_suggestions(erp: ErpStatus, imported: Option<&BTreeSet<Period>>) -> Vec<String> {
    let mut resolved = Vec::new();
    if erp.is_connected() {
        resolved.push(SUGGEST_CONNECT_ERP_ID.to_string());
    }
    if imported.is_some_and(|p| !p.is_empty()) {
        resolved.push(SUGGEST_BANK_IMPORT_ID.to_string());
    }
    resolved
}
