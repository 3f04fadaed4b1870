//! The proactive notification value type and its display order.
//!
//! Notifications are ordered by category, then severity, then recency, with
//! the id as a final tiebreaker so the order is total. The same order drives
//! both what consumers see first and which entries are evicted at the cap.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which analyzer produced a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationType {
    OverdueInvoice,
    UnbookedInvoice,
    VatReminder,
    CashFlowForecast,
    BankReconciliation,
    InvoiceInbox,
    AmountAnomaly,
    DuplicateInvoice,
    DeadlineReminder,
    ActionSuggestion,
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationType::OverdueInvoice => write!(f, "overdue-invoice"),
            NotificationType::UnbookedInvoice => write!(f, "unbooked-invoice"),
            NotificationType::VatReminder => write!(f, "vat-reminder"),
            NotificationType::CashFlowForecast => write!(f, "cash-flow-forecast"),
            NotificationType::BankReconciliation => write!(f, "bank-reconciliation"),
            NotificationType::InvoiceInbox => write!(f, "invoice-inbox"),
            NotificationType::AmountAnomaly => write!(f, "amount-anomaly"),
            NotificationType::DuplicateInvoice => write!(f, "duplicate-invoice"),
            NotificationType::DeadlineReminder => write!(f, "deadline-reminder"),
            NotificationType::ActionSuggestion => write!(f, "action-suggestion"),
        }
    }
}

/// Coarse triage bucket. Declaration order is display priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Warning,
    Insight,
    Suggestion,
}

/// Urgency. Declaration order is display priority (critical first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    Critical,
    Warning,
    Info,
    Success,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Critical => write!(f, "critical"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
            Severity::Success => write!(f, "success"),
        }
    }
}

/// A single actionable alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Deterministic id: check type plus a date or natural key.
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub category: Category,
    pub severity: Severity,
    pub title: String,
    /// Human-readable summary carrying the computed figures.
    pub description: String,
    /// Instruction handed to the assistant when the user acts on this alert.
    pub prompt: String,
    /// Symbolic tool/screen reference; the UI owns the mapping.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
}

impl Notification {
    /// Start a new unread notification. Use the `with_*` helpers to fill in
    /// the prompt and action.
    pub fn new(
        id: impl Into<String>,
        kind: NotificationType,
        category: Category,
        severity: Severity,
        title: impl Into<String>,
        description: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            category,
            severity,
            title: title.into(),
            description: description.into(),
            prompt: String::new(),
            action: None,
            created_at,
            read: false,
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }
}

/// Display order: category, severity, newest first, then id.
pub fn display_order(a: &Notification, b: &Notification) -> Ordering {
    a.category
        .cmp(&b.category)
        .then(a.severity.cmp(&b.severity))
        .then(b.created_at.cmp(&a.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Sort in place by [`display_order`].
pub fn sort_notifications(notifications: &mut [Notification]) {
    notifications.sort_by(display_order);
}

/// Number of unread entries.
pub fn unread_count(notifications: &[Notification]) -> usize {
    notifications.iter().filter(|n| !n.read).count()
}
