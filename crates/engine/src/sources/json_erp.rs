//! [`ErpSource`] reading exported ERP snapshots from a directory.
//!
//! Expected files, all optional:
//! - `erp_status.json`: `"connected"`, `"disconnected"` or `"unknown"`
//! - `supplier_invoices.json`: array of invoices (payables)
//! - `customer_invoices.json`: array of invoices (receivables)
//!
//! A missing status file means the ERP is not connected. A missing or
//! unreadable invoice file is a source failure for that ledger.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use copilot_core::{ErpStatus, Invoice, SourceError};

use super::ErpSource;

pub struct JsonFileErp {
    dir: PathBuf,
}

impl JsonFileErp {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    async fn read_invoices(&self, file: &str) -> Result<Vec<Invoice>, SourceError> {
        let path = self.dir.join(file);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| SourceError::unavailable(file, format!("{}: {e}", path.display())))?;
        let invoices: Vec<Invoice> =
            serde_json::from_slice(&bytes).map_err(|e| SourceError::malformed(file, e.to_string()))?;
        debug!(file, count = invoices.len(), "loaded invoices");
        Ok(invoices)
    }
}

#[async_trait]
impl ErpSource for JsonFileErp {
    async fn status(&self) -> ErpStatus {
        match tokio::fs::read(self.dir.join("erp_status.json")).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or(ErpStatus::Unknown),
            Err(_) => ErpStatus::Disconnected,
        }
    }

    async fn supplier_invoices(&self) -> Result<Vec<Invoice>, SourceError> {
        self.read_invoices("supplier_invoices.json").await
    }

    async fn customer_invoices(&self) -> Result<Vec<Invoice>, SourceError> {
        self.read_invoices("customer_invoices.json").await
    }
}
