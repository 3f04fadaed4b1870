//! Data sources the checks read from.
//!
//! The engine never talks to the ERP or the local caches directly; it goes
//! through these traits so test doubles and other backends can be swapped in.

mod json_erp;
mod kv_local;
mod traits;

pub use self::json_erp::JsonFileErp;
pub use self::kv_local::{KvLocalData, BANK_IMPORTS_KEY, INVOICE_INBOX_KEY, RECONCILED_PERIODS_KEY};
pub use self::traits::{ErpSource, LocalDataSource};
