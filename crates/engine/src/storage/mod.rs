//! Durable key-value storage behind the persisted notification set.
//!
//! The engine only ever loads and saves opaque byte blobs, so any backend
//! that can do that (a directory, an embedded database, a server-side KV)
//! can sit behind [`KvStore`].

mod error;
mod file;
mod memory;

pub use self::error::StoreError;
pub use self::file::FileKvStore;
pub use self::memory::MemoryKvStore;

/// Opaque blob storage keyed by string.
pub trait KvStore: Send + Sync {
    /// Read a blob. `Ok(None)` when the key has never been written.
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Replace the blob stored under `key`.
    fn save(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;
}
