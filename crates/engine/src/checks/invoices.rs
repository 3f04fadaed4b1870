//! Ledger checks over open payables and receivables.

use chrono::Duration;

use copilot_core::{format_sek, Category, Invoice, Notification, NotificationType, Severity};

use super::{plural, CheckContext};

/// Open payables whose due date is strictly before today.
pub fn check_overdue_invoices(payables: &[Invoice], ctx: &CheckContext) -> Option<Notification> {
    let overdue: Vec<&Invoice> = payables
        .iter()
        .filter(|i| i.is_outstanding())
        .filter(|i| i.due_date.is_some_and(|d| d < ctx.today))
        .collect();

    if overdue.is_empty() {
        return None;
    }

    let total: f64 = overdue.iter().map(|i| i.balance).sum();
    let oldest_days = overdue
        .iter()
        .filter_map(|i| i.due_date)
        .min()
        .map(|d| (ctx.today - d).num_days());

    let mut description = format!(
        "{} totalling {} are past due.",
        plural(overdue.len(), "supplier invoice", "supplier invoices"),
        format_sek(total)
    );
    if let Some(days) = oldest_days {
        description.push_str(&format!(" The oldest is {days} days overdue."));
    }

    Some(
        Notification::new(
            format!("overdue-invoices-{}", ctx.day_key()),
            NotificationType::OverdueInvoice,
            Category::Warning,
            Severity::Critical,
            format!("{} overdue", plural(overdue.len(), "invoice", "invoices")),
            description,
            ctx.now,
        )
        .with_prompt("Show my overdue supplier invoices and help me plan which to pay first.")
        .with_action("supplier-invoices"),
    )
}

/// Open payables that have not been booked yet.
pub fn check_unbooked_invoices(payables: &[Invoice], ctx: &CheckContext) -> Option<Notification> {
    let unbooked: Vec<&Invoice> = payables
        .iter()
        .filter(|i| i.is_outstanding() && !i.booked)
        .collect();

    if unbooked.is_empty() {
        return None;
    }

    let total: f64 = unbooked.iter().map(|i| i.balance).sum();

    Some(
        Notification::new(
            format!("unbooked-invoices-{}", ctx.day_key()),
            NotificationType::UnbookedInvoice,
            Category::Warning,
            Severity::Warning,
            format!("{} not booked", plural(unbooked.len(), "invoice", "invoices")),
            format!(
                "{} worth {} are registered but not yet booked.",
                plural(unbooked.len(), "supplier invoice", "supplier invoices"),
                format_sek(total)
            ),
            ctx.now,
        )
        .with_prompt("List my unbooked supplier invoices and help me book them.")
        .with_action("supplier-invoices"),
    )
}

/// Net of open receivables against payables falling due within the horizon.
pub fn check_cash_flow(
    receivables: &[Invoice],
    payables: &[Invoice],
    ctx: &CheckContext,
) -> Option<Notification> {
    let incoming: f64 = receivables
        .iter()
        .filter(|i| i.is_outstanding())
        .map(|i| i.balance)
        .sum();

    let horizon = ctx.today + Duration::days(ctx.policy.cashflow_horizon_days);
    let outgoing: f64 = payables
        .iter()
        .filter(|i| i.is_outstanding())
        .filter(|i| i.due_date.is_some_and(|d| d >= ctx.today && d <= horizon))
        .map(|i| i.balance)
        .sum();

    if incoming == 0.0 && outgoing == 0.0 {
        return None;
    }

    let net = incoming - outgoing;
    let severity = if net < 0.0 { Severity::Warning } else { Severity::Info };
    let title = if net < 0.0 {
        "Negative cash flow ahead"
    } else {
        "Cash-flow forecast"
    };

    Some(
        Notification::new(
            format!("cash-flow-{}", ctx.day_key()),
            NotificationType::CashFlowForecast,
            Category::Insight,
            severity,
            title,
            format!(
                "Next {} days: {} incoming, {} outgoing, net {}.",
                ctx.policy.cashflow_horizon_days,
                format_sek(incoming),
                format_sek(outgoing),
                format_sek(net)
            ),
            ctx.now,
        )
        .with_prompt("Give me a cash-flow forecast for the next 30 days based on open invoices.")
        .with_action("cash-flow"),
    )
}
