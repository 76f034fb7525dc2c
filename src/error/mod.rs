mod app;
mod config;
mod plugin;
mod sampling;
mod storage;

#[cfg(test)]
mod test_support;

pub use app::{AppError, AppResult};
pub use config::ConfigError;
pub use plugin::PluginError;
pub use sampling::SamplingError;
pub use storage::{StorageError, StorageResult};
