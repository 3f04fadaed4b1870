//! [`LocalDataSource`] backed by JSON blobs in a [`KvStore`].
//!
//! Blobs that are missing or fail to parse read as empty, so a corrupted
//! cache only silences the checks that depend on it.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::warn;

use copilot_core::{InboxItem, Period, SourceError};

use super::LocalDataSource;
use crate::storage::KvStore;

pub const BANK_IMPORTS_KEY: &str = "bank-imports";
pub const RECONCILED_PERIODS_KEY: &str = "reconciled-periods";
pub const INVOICE_INBOX_KEY: &str = "invoice-inbox";

/// One imported bank transaction; only its period matters here.
#[derive(Debug, Deserialize)]
struct ImportedTransaction {
    period: Period,
}

pub struct KvLocalData {
    store: Arc<dyn KvStore>,
}

impl KvLocalData {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    fn read_json<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T, SourceError> {
        let bytes = self
            .store
            .load(key)
            .map_err(|e| SourceError::unavailable(key, e.to_string()))?;
        let Some(bytes) = bytes else {
            return Ok(T::default());
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!(key, error = %e, "unparsable cached data, treating as empty");
                Ok(T::default())
            }
        }
    }
}

#[async_trait]
impl LocalDataSource for KvLocalData {
    async fn imported_periods(&self) -> Result<BTreeSet<Period>, SourceError> {
        let transactions: Vec<ImportedTransaction> = self.read_json(BANK_IMPORTS_KEY)?;
        Ok(transactions.into_iter().map(|t| t.period).collect())
    }

    async fn reconciled_periods(&self) -> Result<BTreeSet<Period>, SourceError> {
        self.read_json(RECONCILED_PERIODS_KEY)
    }

    async fn inbox_items(&self) -> Result<Vec<InboxItem>, SourceError> {
        self.read_json(INVOICE_INBOX_KEY)
    }
}
