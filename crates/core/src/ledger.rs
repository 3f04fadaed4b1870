//! Bookkeeping records the checks read.
//!
//! These mirror what the ERP and the local caches hand over. Field aliases
//! accept the ERP's PascalCase payloads as well as our own camelCase.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Bank statement period key, `YYYY-MM`.
pub type Period = String;

/// A supplier (payable) or customer (receivable) invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    /// ERP-internal number, distinct for every invoice record.
    #[serde(alias = "GivenNumber", alias = "DocumentNumber")]
    pub given_number: String,
    /// Supplier or customer number.
    #[serde(alias = "SupplierNumber", alias = "CustomerNumber", alias = "supplier")]
    pub counterparty: String,
    /// Number printed on the invoice by the counterparty.
    #[serde(default, alias = "InvoiceNumber")]
    pub invoice_number: String,
    #[serde(default, alias = "DueDate")]
    pub due_date: Option<NaiveDate>,
    #[serde(alias = "Total")]
    pub total: f64,
    /// Outstanding amount.
    #[serde(alias = "Balance")]
    pub balance: f64,
    #[serde(default, alias = "Booked")]
    pub booked: bool,
    #[serde(default, alias = "Cancelled")]
    pub cancelled: bool,
}

impl Invoice {
    /// Open and not cancelled.
    pub fn is_outstanding(&self) -> bool {
        !self.cancelled && self.balance > 0.0
    }
}

/// Processing state of an invoice-inbox item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InboxStatus {
    New,
    Processing,
    Review,
    Approved,
    Booked,
    Paid,
    Rejected,
}

impl InboxStatus {
    /// Still needs someone to act on it.
    pub fn is_pending(self) -> bool {
        !matches!(self, InboxStatus::Booked | InboxStatus::Paid | InboxStatus::Rejected)
    }
}

/// A locally tracked supplier invoice awaiting booking or payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxItem {
    pub id: String,
    #[serde(default)]
    pub supplier_name: Option<String>,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    pub status: InboxStatus,
}

/// Result of the ERP connectivity probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErpStatus {
    Connected,
    Disconnected,
    #[default]
    Unknown,
}

impl ErpStatus {
    pub fn is_connected(self) -> bool {
        self == ErpStatus::Connected
    }
}

/// Format an amount in whole kronor with space-grouped thousands: `-12 345 kr`.
pub fn format_sek(amount: f64) -> String {
    let rounded = amount.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }
    let sign = if rounded < 0 { "-" } else { "" };
    format!("{sign}{grouped} kr")
}
