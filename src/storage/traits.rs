use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{ContainerReference, ContainerStats};
use crate::error::StorageResult;

use super::DriverConfig;

/// A storage backend, linked in-process or reached through the plugin bridge.
///
/// `add_stats` may be called concurrently; implementations that cannot accept
/// parallel writes serialize internally.
#[async_trait]
pub trait StorageDriver: Send + Sync {
    /// Registry name of the engine backing this driver.
    fn engine(&self) -> &str;

    /// Stores one stats record for `reference`.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend rejects or fails to persist the
    /// record.
    async fn add_stats(
        &self,
        reference: &ContainerReference,
        stats: &ContainerStats,
    ) -> StorageResult<()>;

    /// Releases backend resources. Calling it more than once is allowed.
    ///
    /// # Errors
    ///
    /// Returns an error when buffered data cannot be flushed or the backend
    /// fails to shut down.
    async fn close(&self) -> StorageResult<()>;
}

/// Builds drivers for one engine name.
#[async_trait]
pub trait DriverFactory: Send + Sync {
    fn engine(&self) -> &str;

    /// Creates a driver, performing any connection or authentication the
    /// backend needs.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration is unusable or the backend
    /// cannot be reached.
    async fn create(&self, config: &DriverConfig) -> StorageResult<Arc<dyn StorageDriver>>;
}
