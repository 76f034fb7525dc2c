use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{StorageError, StorageResult};
use crate::storage::{DriverConfig, DriverFactory, StorageDriver};

use super::{ClientOptions, DEFAULT_SOCKET_PATH, PluginClient};

pub const PLUGIN_ENGINE: &str = "plugin";

/// Registry entry for out-of-process drivers. `host` names the socket path;
/// `connect_timeout_ms` and `call_timeout_ms` params override the client
/// timeouts.
pub struct PluginDriverFactory;

#[async_trait]
impl DriverFactory for PluginDriverFactory {
    fn engine(&self) -> &str {
        PLUGIN_ENGINE
    }

    async fn create(&self, config: &DriverConfig) -> StorageResult<Arc<dyn StorageDriver>> {
        let socket_path = match config.host.trim() {
            "" => DEFAULT_SOCKET_PATH,
            host => host,
        };
        let mut options = ClientOptions::new(socket_path);
        if let Some(timeout) = timeout_param(config, "connect_timeout_ms")? {
            options = options.with_connect_timeout(timeout);
        }
        if let Some(timeout) = timeout_param(config, "call_timeout_ms")? {
            options = options.with_call_timeout(timeout);
        }
        Ok(Arc::new(PluginClient::connect(options).await?))
    }
}

fn timeout_param(config: &DriverConfig, key: &str) -> StorageResult<Option<Duration>> {
    let Some(value) = config.param(key) else {
        return Ok(None);
    };
    match value.trim().parse::<u64>() {
        Ok(0) => Err(StorageError::InvalidConfig {
            engine: PLUGIN_ENGINE,
            message: format!("param '{}' must be greater than 0", key),
        }),
        Ok(ms) => Ok(Some(Duration::from_millis(ms))),
        Err(err) => Err(StorageError::InvalidConfig {
            engine: PLUGIN_ENGINE,
            message: format!("param '{}' = '{}': {}", key, value, err),
        }),
    }
}
