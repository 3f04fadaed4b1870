//! Outlier and duplicate detection over supplier invoices.
//!
//! Both scans are single-pass per counterparty and keep no state between
//! cycles. The thresholds are fixed policy, not fitted to the data.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use copilot_core::{format_sek, Category, Invoice, Notification, NotificationType, Severity};

use super::CheckContext;

/// Flag a counterparty's most recently due invoice when its total exceeds
/// `anomaly_ratio` times the mean of that counterparty's other invoices.
pub fn check_amount_anomalies(payables: &[Invoice], ctx: &CheckContext) -> Vec<Notification> {
    let mut by_counterparty: BTreeMap<&str, Vec<&Invoice>> = BTreeMap::new();
    for invoice in payables.iter().filter(|i| !i.cancelled) {
        by_counterparty
            .entry(invoice.counterparty.as_str())
            .or_default()
            .push(invoice);
    }

    let mut out = Vec::new();
    for (counterparty, invoices) in by_counterparty {
        if invoices.len() < ctx.policy.anomaly_min_invoices.max(2) {
            continue;
        }

        // Latest due date wins; on ties the later record in the feed.
        let Some((latest_idx, latest)) = invoices
            .iter()
            .enumerate()
            .max_by_key(|(idx, inv)| (inv.due_date, *idx))
        else {
            continue;
        };

        let (sum, count) = invoices
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != latest_idx)
            .fold((0.0, 0usize), |(sum, count), (_, inv)| (sum + inv.total, count + 1));
        let mean = sum / count as f64;
        if mean <= f64::EPSILON {
            continue;
        }

        let ratio = latest.total / mean;
        if ratio <= ctx.policy.anomaly_ratio {
            continue;
        }

        debug!(counterparty, ratio, "amount anomaly");
        out.push(
            Notification::new(
                format!("amount-anomaly-{}-{}", counterparty, latest.given_number),
                NotificationType::AmountAnomaly,
                Category::Warning,
                Severity::Warning,
                format!("Unusual amount from supplier {counterparty}"),
                format!(
                    "Invoice {} is {} which is {:.1}x the usual {} from this supplier.",
                    display_number(latest),
                    format_sek(latest.total),
                    ratio,
                    format_sek(mean)
                ),
                ctx.now,
            )
            .with_prompt(format!(
                "Review supplier invoice {} from supplier {} - the amount is {:.1}x higher than usual.",
                display_number(latest),
                counterparty,
                ratio
            ))
            .with_action("supplier-invoices"),
        );
    }
    out
}

/// Flag the first re-occurrence of a (counterparty, invoice number) pair
/// whose amount is within `duplicate_tolerance` of the first occurrence.
pub fn check_duplicate_invoices(payables: &[Invoice], ctx: &CheckContext) -> Vec<Notification> {
    struct Seen<'a> {
        first: &'a Invoice,
        flagged: bool,
    }

    let mut seen: HashMap<(&str, &str), Seen<'_>> = HashMap::new();
    let mut out = Vec::new();

    for invoice in payables.iter().filter(|i| !i.cancelled) {
        if invoice.invoice_number.is_empty() {
            continue;
        }
        let key = (invoice.counterparty.as_str(), invoice.invoice_number.as_str());
        let Some(entry) = seen.get_mut(&key) else {
            seen.insert(key, Seen { first: invoice, flagged: false });
            continue;
        };

        if entry.flagged || entry.first.given_number == invoice.given_number {
            continue;
        }

        let first = entry.first;
        let tolerance = first.total.abs() * ctx.policy.duplicate_tolerance;
        if (invoice.total - first.total).abs() > tolerance {
            continue;
        }

        entry.flagged = true;
        out.push(
            Notification::new(
                format!(
                    "duplicate-invoice-{}-{}",
                    invoice.counterparty, invoice.invoice_number
                ),
                NotificationType::DuplicateInvoice,
                Category::Warning,
                Severity::Critical,
                format!("Possible duplicate invoice {}", invoice.invoice_number),
                format!(
                    "Supplier {} invoice {} is registered twice ({} and {}) with amounts {} and {}.",
                    invoice.counterparty,
                    invoice.invoice_number,
                    first.given_number,
                    invoice.given_number,
                    format_sek(first.total),
                    format_sek(invoice.total)
                ),
                ctx.now,
            )
            .with_prompt(format!(
                "Check whether supplier invoice {} from supplier {} has been registered twice.",
                invoice.invoice_number, invoice.counterparty
            ))
            .with_action("supplier-invoices"),
        );
    }
    out
}

fn display_number(invoice: &Invoice) -> &str {
    if invoice.invoice_number.is_empty() {
        &invoice.given_number
    } else {
        &invoice.invoice_number
    }
}
