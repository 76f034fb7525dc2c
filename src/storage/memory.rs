use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::cache::{CacheSettings, PercentileReport, StatsRetentionCache};
use crate::domain::{ContainerReference, ContainerStats, Observation};
use crate::error::{StorageError, StorageResult};

use super::{DriverConfig, DriverFactory, StorageDriver};

pub const MEMORY_ENGINE: &str = "memory";

/// Query-side storage: one retention cache per container, with every
/// accepted observation forwarded to an optional backend driver.
pub struct MemoryStorage {
    settings: CacheSettings,
    containers: RwLock<HashMap<String, Arc<StatsRetentionCache>>>,
    backend: Option<Arc<dyn StorageDriver>>,
}

impl MemoryStorage {
    /// # Errors
    ///
    /// Returns an error when the cache settings are invalid.
    pub fn new(settings: CacheSettings) -> StorageResult<Self> {
        settings.validate()?;
        Ok(Self {
            settings,
            containers: RwLock::new(HashMap::new()),
            backend: None,
        })
    }

    #[must_use]
    pub fn with_backend(mut self, backend: Arc<dyn StorageDriver>) -> Self {
        self.backend = Some(backend);
        self
    }

    #[must_use]
    pub const fn settings(&self) -> CacheSettings {
        self.settings
    }

    #[must_use]
    pub fn backend(&self) -> Option<&Arc<dyn StorageDriver>> {
        self.backend.as_ref()
    }

    /// Retains `stats` for the container, then hands it to the backend.
    ///
    /// The observation stays retained even when the backend fails.
    ///
    /// # Errors
    ///
    /// Returns an error when the stats are out of order for the container or
    /// the backend rejects them.
    pub async fn record(
        &self,
        reference: &ContainerReference,
        stats: ContainerStats,
    ) -> StorageResult<Observation> {
        let cache = self.cache_or_insert(&reference.id)?;
        let observation = cache.add(stats)?;
        if let Some(backend) = self.backend.as_ref() {
            backend.add_stats(reference, observation.stats()).await?;
        }
        Ok(observation)
    }

    /// Most recent observations for a container, oldest first. A negative
    /// `num_stats` returns everything retained.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown container.
    pub fn recent_stats(&self, container: &str, num_stats: i32) -> StorageResult<Vec<Observation>> {
        let limit = usize::try_from(num_stats).ok();
        Ok(self.cache(container)?.recent_stats(limit))
    }

    /// # Errors
    ///
    /// Returns `NotFound` for an unknown container.
    pub fn samples(&self, container: &str, num_samples: usize) -> StorageResult<Vec<Observation>> {
        Ok(self.cache(container)?.samples(num_samples))
    }

    /// # Errors
    ///
    /// Returns `NotFound` for an unknown container, `InsufficientData` when
    /// nothing is retained, or `InvalidPercentile` for values above 100.
    pub fn percentiles(
        &self,
        container: &str,
        cpu: &[u8],
        memory: &[u8],
    ) -> StorageResult<PercentileReport> {
        self.cache(container)?.percentiles(cpu, memory)
    }

    /// Forgets a container. Returns whether it was known.
    #[must_use]
    pub fn remove_container(&self, container: &str) -> bool {
        self.containers.write().remove(container).is_some()
    }

    /// Known container ids, sorted.
    #[must_use]
    pub fn containers(&self) -> Vec<String> {
        let mut containers: Vec<String> = self.containers.read().keys().cloned().collect();
        containers.sort_unstable();
        containers
    }

    fn cache(&self, container: &str) -> StorageResult<Arc<StatsRetentionCache>> {
        self.containers
            .read()
            .get(container)
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                container: container.to_owned(),
            })
    }

    fn cache_or_insert(&self, container: &str) -> StorageResult<Arc<StatsRetentionCache>> {
        if let Some(cache) = self.containers.read().get(container) {
            return Ok(Arc::clone(cache));
        }
        let mut containers = self.containers.write();
        if let Some(cache) = containers.get(container) {
            return Ok(Arc::clone(cache));
        }
        let cache = Arc::new(StatsRetentionCache::new(container, self.settings)?);
        containers.insert(container.to_owned(), Arc::clone(&cache));
        tracing::debug!("Tracking container {}", container);
        Ok(cache)
    }
}

#[async_trait]
impl StorageDriver for MemoryStorage {
    fn engine(&self) -> &str {
        MEMORY_ENGINE
    }

    async fn add_stats(
        &self,
        reference: &ContainerReference,
        stats: &ContainerStats,
    ) -> StorageResult<()> {
        self.record(reference, stats.clone()).await.map(|_| ())
    }

    async fn close(&self) -> StorageResult<()> {
        match self.backend.as_ref() {
            Some(backend) => backend.close().await,
            None => Ok(()),
        }
    }
}

pub(super) struct MemoryFactory;

#[async_trait]
impl DriverFactory for MemoryFactory {
    fn engine(&self) -> &str {
        MEMORY_ENGINE
    }

    async fn create(&self, config: &DriverConfig) -> StorageResult<Arc<dyn StorageDriver>> {
        let defaults = CacheSettings::default();
        let settings = CacheSettings {
            recent: size_param(config, "recent", defaults.recent)?,
            samples: size_param(config, "samples", defaults.samples)?,
            window: size_param(config, "window", defaults.window)?,
        };
        Ok(Arc::new(MemoryStorage::new(settings)?))
    }
}

fn size_param(config: &DriverConfig, key: &str, default: usize) -> StorageResult<usize> {
    match config.param(key) {
        Some(value) => value
            .trim()
            .parse::<usize>()
            .map_err(|err| StorageError::InvalidConfig {
                engine: MEMORY_ENGINE,
                message: format!("param '{}' = '{}': {}", key, value, err),
            }),
        None => Ok(default),
    }
}
