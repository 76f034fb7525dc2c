use super::{ConfigError, PluginError, SamplingError, StorageError};

impl From<&'static str> for ConfigError {
    fn from(message: &'static str) -> Self {
        ConfigError::TestExpectation { message }
    }
}

impl From<String> for ConfigError {
    fn from(value: String) -> Self {
        ConfigError::TestExpectationValue {
            message: "Test expectation failed",
            value,
        }
    }
}

impl From<&'static str> for PluginError {
    fn from(message: &'static str) -> Self {
        PluginError::TestExpectation { message }
    }
}

impl From<String> for PluginError {
    fn from(value: String) -> Self {
        PluginError::TestExpectationValue {
            message: "Test expectation failed",
            value,
        }
    }
}

impl From<&'static str> for SamplingError {
    fn from(message: &'static str) -> Self {
        SamplingError::TestExpectation { message }
    }
}

impl From<String> for SamplingError {
    fn from(value: String) -> Self {
        SamplingError::TestExpectationValue {
            message: "Test expectation failed",
            value,
        }
    }
}

impl From<&'static str> for StorageError {
    fn from(message: &'static str) -> Self {
        StorageError::TestExpectation { message }
    }
}

impl From<String> for StorageError {
    fn from(value: String) -> Self {
        StorageError::TestExpectationValue {
            message: "Test expectation failed",
            value,
        }
    }
}

impl From<&'static str> for super::AppError {
    fn from(message: &'static str) -> Self {
        Self::Config(ConfigError::from(message))
    }
}

impl From<String> for super::AppError {
    fn from(value: String) -> Self {
        Self::Config(ConfigError::from(value))
    }
}
