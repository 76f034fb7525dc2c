use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use crate::error::{StorageError, StorageResult};

use super::builtins;
use super::{DriverConfig, DriverFactory, StorageDriver};

/// Engine name to factory map. Entries are only ever added or replaced.
#[derive(Default)]
pub struct DriverRegistry {
    factories: RwLock<HashMap<String, Arc<dyn DriverFactory>>>,
}

impl DriverRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        for builtin in builtins::builtins() {
            registry.register_shared(builtin);
        }
        registry
    }

    /// Registers a factory under its engine name, replacing any earlier
    /// factory with the same name.
    pub fn register<F>(&self, factory: F)
    where
        F: DriverFactory + 'static,
    {
        self.register_shared(Arc::new(factory));
    }

    pub fn register_shared(&self, factory: Arc<dyn DriverFactory>) {
        let engine = factory.engine().to_owned();
        let replaced = self
            .factories
            .write()
            .insert(engine.clone(), factory)
            .is_some();
        if replaced {
            tracing::debug!("Replaced storage driver factory: {}", engine);
        }
    }

    #[must_use]
    pub fn contains(&self, engine: &str) -> bool {
        self.factories.read().contains_key(engine)
    }

    #[must_use]
    pub fn engines(&self) -> Vec<String> {
        let mut engines: Vec<String> = self.factories.read().keys().cloned().collect();
        engines.sort_unstable();
        engines
    }

    #[must_use]
    pub fn engines_csv(&self) -> String {
        self.engines().join(", ")
    }

    /// Builds the driver named by `config.engine`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownBackend` when no factory is registered under the name,
    /// otherwise whatever the factory reports.
    pub async fn create(&self, config: &DriverConfig) -> StorageResult<Arc<dyn StorageDriver>> {
        let factory = self.factories.read().get(config.engine.as_str()).cloned();
        let Some(factory) = factory else {
            return Err(StorageError::UnknownBackend {
                engine: config.engine.clone(),
                known: self.engines_csv(),
            });
        };
        let driver = factory.create(config).await?;
        tracing::info!("Storage driver ready: {}", driver.engine());
        Ok(driver)
    }
}

/// Process-wide registry holding the builtin drivers. Only the binary's
/// composition code should reach for it; everything else takes a registry.
#[must_use]
pub fn driver_registry() -> &'static DriverRegistry {
    static REGISTRY: OnceLock<DriverRegistry> = OnceLock::new();
    REGISTRY.get_or_init(DriverRegistry::with_builtins)
}
