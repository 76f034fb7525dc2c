use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Top-level config file. Every section is optional; CLI flags win over
/// anything set here.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub cache: Option<CacheConfig>,
    pub storage: Option<StorageConfig>,
    pub plugin: Option<PluginConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CacheConfig {
    pub recent: Option<usize>,
    pub samples: Option<usize>,
    pub window: Option<usize>,
}

/// Mirrors the registry's driver configuration.
#[derive(Debug, Default, Deserialize)]
pub struct StorageConfig {
    pub engine: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub params: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PluginConfig {
    pub socket: Option<String>,
    pub connect_timeout: Option<DurationValue>,
    pub call_timeout: Option<DurationValue>,
}

/// Either whole seconds or a string with a unit (`500ms`, `5s`, `2m`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    pub(crate) fn to_duration(&self, field: &'static str) -> Result<Duration, ConfigError> {
        let parsed = match self {
            Self::Seconds(0) => Err("Duration must be > 0.".to_owned()),
            Self::Seconds(secs) => Ok(Duration::from_secs(*secs)),
            Self::Text(text) => super::parse_duration_value(text),
        };
        parsed.map_err(|message| ConfigError::InvalidDuration { field, message })
    }
}
