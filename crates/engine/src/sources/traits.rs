use std::collections::BTreeSet;

use async_trait::async_trait;

use copilot_core::{ErpStatus, InboxItem, Invoice, Period, SourceError};

/// The remote ERP: connectivity probe and invoice ledgers.
#[async_trait]
pub trait ErpSource: Send + Sync {
    /// Probe whether the ERP connection is live.
    async fn status(&self) -> ErpStatus;

    /// Payables.
    async fn supplier_invoices(&self) -> Result<Vec<Invoice>, SourceError>;

    /// Receivables.
    async fn customer_invoices(&self) -> Result<Vec<Invoice>, SourceError>;
}

/// Locally persisted bookkeeping state that does not need the ERP.
#[async_trait]
pub trait LocalDataSource: Send + Sync {
    /// Periods with at least one imported bank transaction.
    async fn imported_periods(&self) -> Result<BTreeSet<Period>, SourceError>;

    /// Periods marked as reconciled.
    async fn reconciled_periods(&self) -> Result<BTreeSet<Period>, SourceError>;

    /// Invoice-inbox items in any status.
    async fn inbox_items(&self) -> Result<Vec<InboxItem>, SourceError>;
}
