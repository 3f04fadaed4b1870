//! Calendar reminders for the monthly tax deadline.
//!
//! Both VAT and employer contributions are due on the same day of the month.
//! Ids are scoped to year and month, so a reminder refreshes every month and
//! simply stops being emitted once the deadline has passed.

use chrono::{Datelike, NaiveDate};

use copilot_core::{Category, Notification, NotificationType, Severity};

use super::{plural, CheckContext};

/// Days until this month's deadline, or `None` once it has passed.
fn days_until_deadline(ctx: &CheckContext) -> Option<(i64, NaiveDate)> {
    let day = ctx.today.day();
    let deadline_day = ctx.policy.deadline_day;
    if day > deadline_day {
        return None;
    }
    let deadline = ctx.today.with_day(deadline_day)?;
    Some((i64::from(deadline_day - day), deadline))
}

fn days_left_phrase(days: i64) -> String {
    if days == 0 {
        "due today".to_string()
    } else {
        format!("{} left", plural(days as usize, "day", "days"))
    }
}

pub fn check_vat_reminder(ctx: &CheckContext) -> Option<Notification> {
    let (days_left, deadline) = days_until_deadline(ctx)?;
    let severity = if days_left <= ctx.policy.vat_critical_days {
        Severity::Critical
    } else {
        Severity::Warning
    };

    Some(
        Notification::new(
            format!("vat-reminder-{}", ctx.month_key()),
            NotificationType::VatReminder,
            Category::Warning,
            severity,
            format!("VAT return {}", days_left_phrase(days_left)),
            format!(
                "The VAT return and payment are due on {}. {}.",
                deadline.format("%Y-%m-%d"),
                capitalize(&days_left_phrase(days_left))
            ),
            ctx.now,
        )
        .with_prompt("Help me prepare this month's VAT return.")
        .with_action("vat-report"),
    )
}

pub fn check_employer_contributions(ctx: &CheckContext) -> Option<Notification> {
    let (days_left, deadline) = days_until_deadline(ctx)?;
    if days_left > ctx.policy.employer_window_days {
        return None;
    }
    let severity = if days_left <= ctx.policy.employer_warning_days {
        Severity::Warning
    } else {
        Severity::Info
    };

    Some(
        Notification::new(
            format!("employer-contributions-{}", ctx.month_key()),
            NotificationType::DeadlineReminder,
            Category::Warning,
            severity,
            format!("Employer contributions {}", days_left_phrase(days_left)),
            format!(
                "The employer declaration and contributions are due on {}.",
                deadline.format("%Y-%m-%d")
            ),
            ctx.now,
        )
        .with_prompt("Help me prepare the employer declaration for this month.")
        .with_action("payroll"),
    )
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
