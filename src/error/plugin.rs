use std::path::PathBuf;

use thiserror::Error;

use super::StorageError;

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("Connection error to {path}: {source}")]
    Connection {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Timed out connecting to {path} after {timeout_ms}ms.")]
    ConnectTimeout { path: PathBuf, timeout_ms: u64 },
    #[error("Bind error on {path}: {source}")]
    Bind {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Incompatible plugin version (expected {expected}, got {actual}).")]
    IncompatibleVersion {
        expected: &'static str,
        actual: String,
    },
    #[error("Plugin transport failed during {context}: {message}")]
    TransportFailure {
        context: &'static str,
        message: String,
    },
    #[error("Plugin request carried no container info.")]
    InvalidRequest,
    #[error("Plugin request carried no stats.")]
    EmptyBatch,
    #[error("Plugin reported {kind} error: {message}")]
    Remote { kind: String, message: String },
    #[error("Plugin connection is closed.")]
    Closed,
    #[error("I/O error during {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("Connection closed.")]
    ConnectionClosed,
    #[error("Wire message exceeded max size ({max_bytes} bytes).")]
    WireMessageTooLarge { max_bytes: usize },
    #[error("Wire message was not valid UTF-8: {source}")]
    WireMessageInvalidUtf8 {
        #[source]
        source: std::str::Utf8Error,
    },
    #[error("Serialization error during {context}: {source}")]
    Serialize {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("Deserialization error during {context}: {source}")]
    Deserialize {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to remove plugin socket {path}: {source}")]
    ListenerClose {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Wrapped driver failed to close: {source}")]
    DriverClose {
        #[source]
        source: Box<StorageError>,
    },
    #[error("Plugin server close failed: listener: {listener}; driver: {driver}")]
    Close {
        listener: Box<PluginError>,
        driver: Box<StorageError>,
    },
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

impl PluginError {
    #[must_use]
    pub const fn is_transport_failure(&self) -> bool {
        matches!(self, Self::TransportFailure { .. })
    }

    /// Wire-level kind reported to clients in error replies.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::EmptyBatch => "empty_batch",
            Self::IncompatibleVersion { .. } => "incompatible_version",
            Self::Remote { .. } | Self::DriverClose { .. } | Self::Close { .. } => "driver",
            Self::Connection { .. }
            | Self::ConnectTimeout { .. }
            | Self::Bind { .. }
            | Self::TransportFailure { .. }
            | Self::Closed
            | Self::Io { .. }
            | Self::ConnectionClosed
            | Self::WireMessageTooLarge { .. }
            | Self::WireMessageInvalidUtf8 { .. }
            | Self::Serialize { .. }
            | Self::Deserialize { .. }
            | Self::ListenerClose { .. } => "internal",
            #[cfg(test)]
            Self::TestExpectation { .. } | Self::TestExpectationValue { .. } => "internal",
        }
    }
}
