use thiserror::Error;

#[derive(Error, Debug)]
pub enum CopilotError {
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Config error: {0}")]
    Config(String),
}

/// Failure of one upstream data source (ERP or local cache).
///
/// A `SourceError` never aborts a check cycle; the orchestrator logs it and
/// skips the checks that depend on the failing source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("{source_name} unavailable: {message}")]
    Unavailable { source_name: String, message: String },

    #[error("{source_name} returned malformed data: {message}")]
    Malformed { source_name: String, message: String },
}

impl SourceError {
    pub fn unavailable(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unavailable {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    pub fn malformed(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Malformed {
            source_name: source_name.into(),
            message: message.into(),
        }
    }
}
