use crate::error::ConfigError;

/// # Errors
///
/// Returns an error unless the input is an integer >= 1.
pub fn parse_positive_usize(s: &str) -> Result<usize, ConfigError> {
    match s.trim().parse::<usize>() {
        Ok(value) if value > 0 => Ok(value),
        Ok(_) | Err(_) => Err(ConfigError::InvalidNumber { value: s.to_owned() }),
    }
}

/// # Errors
///
/// Returns an error unless the input is an integer in 0-100.
pub fn parse_percentile(s: &str) -> Result<u8, ConfigError> {
    match s.trim().parse::<u8>() {
        Ok(value) if value <= 100 => Ok(value),
        Ok(_) | Err(_) => Err(ConfigError::InvalidPercentile {
            value: s.to_owned(),
        }),
    }
}

/// Parses a `key=value` backend parameter. The value may be empty and may
/// itself contain `=`.
///
/// # Errors
///
/// Returns an error when there is no `=` or the key is empty.
pub fn parse_param(s: &str) -> Result<(String, String), ConfigError> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_owned(), value.trim().to_owned()))
        }
        Some(_) | None => Err(ConfigError::InvalidParam {
            value: s.to_owned(),
        }),
    }
}
