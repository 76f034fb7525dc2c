use thiserror::Error;

use super::{PluginError, SamplingError};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Observation for '{container}' is older than the newest retained one ({newest} > {actual}).")]
    OutOfOrderTimestamp {
        container: String,
        newest: String,
        actual: String,
    },
    #[error("Percentile {value} is out of range (0-100).")]
    InvalidPercentile { value: u8 },
    #[error("Invalid cache settings: {message}")]
    InvalidSettings { message: &'static str },
    #[error("Unknown container '{container}'.")]
    NotFound { container: String },
    #[error("No observations retained for '{container}'.")]
    InsufficientData { container: String },
    #[error("Unknown storage backend '{engine}' (known: {known}).")]
    UnknownBackend { engine: String, known: String },
    #[error("Invalid configuration for storage backend '{engine}': {message}")]
    InvalidConfig {
        engine: &'static str,
        message: String,
    },
    #[error("Storage backend '{engine}' is closed.")]
    Closed { engine: String },
    #[error("I/O error during {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("Serialization error during {context}: {source}")]
    Serialize {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("Storage backend '{engine}' failed: {message}")]
    Driver { engine: String, message: String },
    #[error(transparent)]
    Sampling(#[from] SamplingError),
    #[error(transparent)]
    Plugin(#[from] PluginError),
    #[cfg(test)]
    #[error("Test expectation failed: {message}")]
    TestExpectation { message: &'static str },
    #[cfg(test)]
    #[error("Test expectation failed: {message}: {value}")]
    TestExpectationValue {
        message: &'static str,
        value: String,
    },
}

pub type StorageResult<T> = Result<T, StorageError>;

impl StorageError {
    /// Negative query results that callers handle as "nothing to report".
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::InsufficientData { .. })
    }

    #[must_use]
    pub const fn is_transport_failure(&self) -> bool {
        matches!(self, Self::Plugin(err) if err.is_transport_failure())
    }
}
