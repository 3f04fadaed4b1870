use thiserror::Error;

use copilot_core::CopilotError;

/// Errors raised by [`KvStore`](super::KvStore) backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O error for key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for CopilotError {
    fn from(e: StoreError) -> Self {
        CopilotError::Storage(e.to_string())
    }
}
