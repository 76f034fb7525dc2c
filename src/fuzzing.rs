use std::sync::Arc;
use std::time::Duration;

use clap::{CommandFactory, FromArgMatches};

use crate::args::{Cli, parse_param, parse_percentile, parse_positive_usize};
use crate::config::types::ConfigFile;
use crate::config::{apply_config, parse_duration_value};
use crate::domain::{ContainerStats, CpuStats, MemoryStats, Observation};
use crate::error::{AppError, AppResult, ConfigError};
use crate::sampling::WindowSampler;

/// Decodes one plugin wire line, discarding the result.
pub fn decode_plugin_line(line: &[u8]) {
    crate::plugin::fuzz_decode_line(line);
}

/// Parses a duration value from config.
///
/// # Errors
///
/// Returns an error when the duration is invalid.
pub fn parse_duration_value_input(input: &str) -> AppResult<Duration> {
    parse_duration_value(input).map_err(|message| {
        AppError::config(ConfigError::InvalidDuration {
            field: "duration",
            message,
        })
    })
}

/// Parses a positive usize string value.
///
/// # Errors
///
/// Returns an error when the value is invalid or zero.
pub fn parse_positive_usize_input(input: &str) -> AppResult<usize> {
    parse_positive_usize(input).map_err(AppError::from)
}

/// Parses a percentile in `0..=100`.
///
/// # Errors
///
/// Returns an error when the value is out of range.
pub fn parse_percentile_input(input: &str) -> AppResult<u8> {
    parse_percentile(input).map_err(AppError::from)
}

/// Parses a `key=value` backend parameter.
///
/// # Errors
///
/// Returns an error when the parameter is malformed.
pub fn parse_param_input(input: &str) -> AppResult<(String, String)> {
    parse_param(input).map_err(AppError::from)
}

/// Parses TOML config and applies it to a default `ingest` invocation.
///
/// # Errors
///
/// Returns an error when parsing or validation fails.
pub fn apply_config_from_toml(input: &str) -> AppResult<Cli> {
    let config: ConfigFile = toml::from_str(input).map_err(|err| {
        AppError::config(ConfigError::ParseToml {
            path: std::path::PathBuf::from("<input>"),
            source: err,
        })
    })?;
    apply_config_to_defaults(&config)
}

/// Parses JSON config and applies it to a default `ingest` invocation.
///
/// # Errors
///
/// Returns an error when parsing or validation fails.
pub fn apply_config_from_json(input: &[u8]) -> AppResult<Cli> {
    let config: ConfigFile = serde_json::from_slice(input)?;
    apply_config_to_defaults(&config)
}

fn apply_config_to_defaults(config: &ConfigFile) -> AppResult<Cli> {
    let matches = Cli::command().try_get_matches_from(["statkeep", "ingest"])?;
    let mut cli = Cli::from_arg_matches(&matches)?;
    apply_config(&mut cli, &matches, config)?;
    Ok(cli)
}

/// Feeds arbitrary sequence numbers through a sampler and returns the
/// sequence numbers of the final snapshot. Rejected additions are skipped.
///
/// # Errors
///
/// Returns an error when `samples` and `window` are not a valid pair.
pub fn sample_sequence_input(
    samples: usize,
    window: usize,
    seed: u64,
    sequences: &[u64],
) -> AppResult<Vec<u64>> {
    let mut sampler = WindowSampler::<Observation>::with_seed(samples, window, seed)?;
    let stats = ContainerStats {
        timestamp: chrono::DateTime::<chrono::Utc>::UNIX_EPOCH,
        cpu: CpuStats::default(),
        memory: MemoryStats::default(),
    };
    let id: Arc<str> = Arc::from("fuzz");
    for sequence in sequences {
        let item = Observation::new(Arc::clone(&id), *sequence, stats.clone());
        if let Err(err) = sampler.add(item) {
            tracing::trace!("Rejected sequence {}: {}", sequence, err);
        }
    }
    Ok(sampler
        .snapshot()
        .iter()
        .map(Observation::sequence_number)
        .collect())
}
