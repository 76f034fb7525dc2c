use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config '{path}': {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML config '{path}': {source}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to parse JSON config '{path}': {source}")]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Unsupported config extension '{ext}'. Use .toml or .json.")]
    UnsupportedExtension { ext: String },
    #[error("Config file must have .toml or .json extension.")]
    MissingExtension,
    #[error("Config '{field}' must be >= 1.")]
    FieldMustBePositive { field: &'static str },
    #[error("Config cache.samples ({samples}) must not exceed cache.window ({window}).")]
    SamplesExceedWindow { samples: usize, window: usize },
    #[error("Invalid number '{value}'. Expected a positive integer.")]
    InvalidNumber { value: String },
    #[error("Invalid duration for '{field}': {message}")]
    InvalidDuration {
        field: &'static str,
        message: String,
    },
    #[error("No storage backend configured for {command} (set --backend or [storage].engine).")]
    MissingBackend { command: &'static str },
    #[error("Invalid driver param '{value}'. Expected 'key=value'.")]
    InvalidParam { value: String },
    #[error("Invalid percentile '{value}'. Expected an integer in 0-100.")]
    InvalidPercentile { value: String },
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
