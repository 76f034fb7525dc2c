use thiserror::Error;

use super::{ConfigError, PluginError, SamplingError, StorageError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("CLI error: {source}")]
    Clap {
        #[from]
        source: clap::Error,
    },
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
    #[error("Join error: {source}")]
    Join {
        #[from]
        source: tokio::task::JoinError,
    },
    #[error("Invalid observation on line {line}: {source}")]
    InvalidObservationLine {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Sampling error: {0}")]
    Sampling(#[from] SamplingError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Plugin error: {0}")]
    Plugin(#[from] PluginError),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn config<E>(error: E) -> Self
    where
        E: Into<ConfigError>,
    {
        error.into().into()
    }

    pub fn storage<E>(error: E) -> Self
    where
        E: Into<StorageError>,
    {
        error.into().into()
    }

    pub fn plugin<E>(error: E) -> Self
    where
        E: Into<PluginError>,
    {
        error.into().into()
    }

    /// Whether this error means a plugin session died mid-call.
    #[must_use]
    pub const fn is_transport_failure(&self) -> bool {
        match self {
            Self::Plugin(err) => err.is_transport_failure(),
            Self::Storage(err) => err.is_transport_failure(),
            Self::Io { .. }
            | Self::Clap { .. }
            | Self::Json { .. }
            | Self::Join { .. }
            | Self::InvalidObservationLine { .. }
            | Self::Config(_)
            | Self::Sampling(_) => false,
        }
    }
}
