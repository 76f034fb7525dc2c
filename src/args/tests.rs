use clap::Parser;

use super::*;
use crate::error::{AppError, AppResult, ConfigError};
use crate::plugin::DEFAULT_SOCKET_PATH;

#[test]
fn ingest_defaults_match_cache_defaults() -> AppResult<()> {
    let cli = Cli::try_parse_from(["statkeep", "ingest"])?;
    let Command::Ingest(ingest) = cli.command else {
        return Err(AppError::from("Expected ingest subcommand"));
    };
    if ingest.input != "-" || ingest.output.is_some() {
        return Err(AppError::from("Unexpected input/output defaults"));
    }
    if ingest.cache.settings() != crate::cache::CacheSettings::default() {
        return Err(format!("Unexpected cache defaults: {:?}", ingest.cache).into());
    }
    if ingest.cpu_percentiles != vec![50, 90, 95] || ingest.memory_percentiles != vec![50, 90, 95] {
        return Err(AppError::from("Unexpected percentile defaults"));
    }
    if ingest.backend.driver_config().is_some() {
        return Err(AppError::from("No backend is selected by default"));
    }
    Ok(())
}

#[test]
fn ingest_parses_backend_and_cache_flags() -> AppResult<()> {
    let cli = Cli::try_parse_from([
        "statkeep",
        "--verbose",
        "ingest",
        "--input",
        "stats.jsonl",
        "--recent",
        "5",
        "--samples",
        "2",
        "--window",
        "8",
        "--cpu-percentiles",
        "50,99",
        "--backend",
        "jsonl",
        "--backend-param",
        "path=/tmp/out.jsonl",
        "--backend-param",
        "query=a=b",
    ])?;
    if !cli.verbose {
        return Err(AppError::from("Expected global --verbose"));
    }
    let Command::Ingest(ingest) = cli.command else {
        return Err(AppError::from("Expected ingest subcommand"));
    };
    if ingest.cache.recent != 5 || ingest.cache.samples != 2 || ingest.cache.window != 8 {
        return Err(format!("Unexpected cache args: {:?}", ingest.cache).into());
    }
    if ingest.cpu_percentiles != vec![50, 99] {
        return Err(format!("Unexpected cpu percentiles: {:?}", ingest.cpu_percentiles).into());
    }
    let config = ingest
        .backend
        .driver_config()
        .ok_or_else(|| AppError::from("Expected a driver config"))?;
    if config.engine != "jsonl"
        || config.param("path") != Some("/tmp/out.jsonl")
        || config.param("query") != Some("a=b")
    {
        return Err(format!("Unexpected driver config: {:?}", config).into());
    }
    Ok(())
}

#[test]
fn serve_plugin_defaults_to_the_standard_socket() -> AppResult<()> {
    let cli = Cli::try_parse_from(["statkeep", "serve-plugin", "--backend", "memory"])?;
    let Command::ServePlugin(serve) = cli.command else {
        return Err(AppError::from("Expected serve-plugin subcommand"));
    };
    if serve.socket != DEFAULT_SOCKET_PATH {
        return Err(format!("Unexpected socket: {}", serve.socket).into());
    }
    if serve.backend.engine.as_deref() != Some("memory") {
        return Err(AppError::from("Unexpected backend"));
    }
    Ok(())
}

#[test]
fn invalid_values_are_rejected_by_clap() -> AppResult<()> {
    for argv in [
        vec!["statkeep", "ingest", "--recent", "0"],
        vec!["statkeep", "ingest", "--cpu-percentiles", "101"],
        vec!["statkeep", "ingest", "--backend-param", "novalue"],
        vec!["statkeep"],
    ] {
        if Cli::try_parse_from(&argv).is_ok() {
            return Err(format!("Expected {:?} to be rejected", argv).into());
        }
    }
    Ok(())
}

#[test]
fn parsers_report_the_offending_input() -> AppResult<()> {
    match parse_param("=x") {
        Err(ConfigError::InvalidParam { value }) if value == "=x" => {}
        other => return Err(format!("Expected InvalidParam, got {:?}", other).into()),
    }
    if parse_param("key=")? != ("key".to_owned(), String::new()) {
        return Err(AppError::from("Empty values are allowed"));
    }
    match parse_percentile("abc") {
        Err(ConfigError::InvalidPercentile { value }) if value == "abc" => {}
        other => return Err(format!("Expected InvalidPercentile, got {:?}", other).into()),
    }
    if parse_percentile(" 100 ")? != 100 || parse_positive_usize("7")? != 7 {
        return Err(AppError::from("Expected valid values to parse"));
    }
    Ok(())
}
