use std::time::Duration;

use clap::{CommandFactory, FromArgMatches};
use tempfile::tempdir;

use super::types::{ConfigFile, DurationValue};
use super::{apply_config, load_config_file, parse_duration_value};
use crate::args::{Cli, Command};
use crate::error::ConfigError;

fn write_config(name: &str, content: &str) -> Result<(tempfile::TempDir, std::path::PathBuf), ConfigError> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = dir.path().join(name);
    std::fs::write(&path, content).map_err(|err| format!("write failed: {}", err))?;
    Ok((dir, path))
}

fn parse_with_config(argv: &[&str], config: &ConfigFile) -> Result<Cli, ConfigError> {
    let matches = Cli::command()
        .try_get_matches_from(argv)
        .map_err(|err| format!("clap failed: {}", err))?;
    let mut cli = Cli::from_arg_matches(&matches).map_err(|err| format!("clap failed: {}", err))?;
    apply_config(&mut cli, &matches, config)?;
    Ok(cli)
}

#[test]
fn parse_toml_config_sections() -> Result<(), ConfigError> {
    let (_dir, path) = write_config(
        "statkeep.toml",
        r#"
[cache]
recent = 30
samples = 4
window = 40

[storage]
engine = "jsonl"
database = "/var/lib/statkeep/stats.jsonl"

[storage.params]
flush = "always"

[plugin]
socket = "/run/statkeep.sock"
connect_timeout = "250ms"
call_timeout = 10
"#,
    )?;
    let config = load_config_file(&path)?;
    let cache = config.cache.as_ref().ok_or("Expected cache section")?;
    if cache.recent != Some(30) || cache.samples != Some(4) || cache.window != Some(40) {
        return Err(format!("Unexpected cache section: {:?}", cache).into());
    }
    let storage = config.storage.as_ref().ok_or("Expected storage section")?;
    if storage.engine.as_deref() != Some("jsonl")
        || storage
            .params
            .as_ref()
            .and_then(|params| params.get("flush"))
            .map(String::as_str)
            != Some("always")
    {
        return Err(format!("Unexpected storage section: {:?}", storage).into());
    }
    let plugin = config.plugin.as_ref().ok_or("Expected plugin section")?;
    let connect = plugin
        .connect_timeout
        .as_ref()
        .ok_or("Expected connect timeout")?
        .to_duration("plugin.connect_timeout")?;
    let call = plugin
        .call_timeout
        .as_ref()
        .ok_or("Expected call timeout")?
        .to_duration("plugin.call_timeout")?;
    if connect != Duration::from_millis(250) || call != Duration::from_secs(10) {
        return Err(format!("Unexpected timeouts: {:?} {:?}", connect, call).into());
    }
    Ok(())
}

#[test]
fn parse_json_config_sections() -> Result<(), ConfigError> {
    let (_dir, path) = write_config(
        "statkeep.json",
        r#"{"cache": {"samples": 2}, "storage": {"engine": "plugin"}}"#,
    )?;
    let config = load_config_file(&path)?;
    if config.cache.and_then(|cache| cache.samples) != Some(2) {
        return Err("Expected cache.samples = 2".into());
    }
    if config.storage.and_then(|storage| storage.engine).as_deref() != Some("plugin") {
        return Err("Expected storage.engine = plugin".into());
    }
    if config.plugin.is_some() {
        return Err("Missing sections must stay None".into());
    }
    Ok(())
}

#[test]
fn unsupported_extensions_are_rejected() -> Result<(), ConfigError> {
    let (_dir, path) = write_config("statkeep.yaml", "cache: {}")?;
    match load_config_file(&path) {
        Err(ConfigError::UnsupportedExtension { ext }) if ext == "yaml" => {}
        other => return Err(format!("Expected UnsupportedExtension, got {:?}", other).into()),
    }
    let (_dir, path) = write_config("statkeep", "")?;
    match load_config_file(&path) {
        Err(ConfigError::MissingExtension) => Ok(()),
        other => Err(format!("Expected MissingExtension, got {:?}", other).into()),
    }
}

#[test]
fn malformed_toml_reports_the_path() -> Result<(), ConfigError> {
    let (_dir, path) = write_config("statkeep.toml", "[cache\nrecent = 1")?;
    match load_config_file(&path) {
        Err(ConfigError::ParseToml { path: reported, .. }) if reported == path => Ok(()),
        other => Err(format!("Expected ParseToml, got {:?}", other).into()),
    }
}

#[test]
fn config_fills_unset_ingest_args() -> Result<(), ConfigError> {
    let config: ConfigFile = toml::from_str(
        r#"
[cache]
recent = 30
window = 50

[storage]
engine = "jsonl"

[storage.params]
path = "/from/config.jsonl"
mode = "append"
"#,
    )
    .map_err(|err| format!("toml failed: {}", err))?;
    let cli = parse_with_config(
        &[
            "statkeep",
            "ingest",
            "--recent",
            "7",
            "--backend-param",
            "path=/from/cli.jsonl",
        ],
        &config,
    )?;
    let Command::Ingest(ingest) = cli.command else {
        return Err("Expected ingest".into());
    };
    if ingest.cache.recent != 7 || ingest.cache.window != 50 || ingest.cache.samples != 10 {
        return Err(format!("CLI must win over config: {:?}", ingest.cache).into());
    }
    let driver = ingest
        .backend
        .driver_config()
        .ok_or("Expected a backend from config")?;
    if driver.engine != "jsonl"
        || driver.param("path") != Some("/from/cli.jsonl")
        || driver.param("mode") != Some("append")
    {
        return Err(format!("Unexpected driver config: {:?}", driver).into());
    }
    Ok(())
}

#[test]
fn storage_section_is_ignored_for_a_different_cli_engine() -> Result<(), ConfigError> {
    let config: ConfigFile = toml::from_str(
        r#"
[storage]
engine = "jsonl"
database = "/from/config.jsonl"
"#,
    )
    .map_err(|err| format!("toml failed: {}", err))?;
    let cli = parse_with_config(&["statkeep", "ingest", "--backend", "memory"], &config)?;
    let Command::Ingest(ingest) = cli.command else {
        return Err("Expected ingest".into());
    };
    if ingest.backend.database.is_some() {
        return Err("Settings for another engine must not leak".into());
    }
    Ok(())
}

#[test]
fn plugin_section_configures_plugin_backend_and_server() -> Result<(), ConfigError> {
    let config: ConfigFile = toml::from_str(
        r#"
[storage]
engine = "plugin"

[plugin]
socket = "/run/statkeep/plugin.sock"
connect_timeout = "2s"
call_timeout = "1m"
"#,
    )
    .map_err(|err| format!("toml failed: {}", err))?;

    let cli = parse_with_config(&["statkeep", "ingest"], &config)?;
    let Command::Ingest(ingest) = cli.command else {
        return Err("Expected ingest".into());
    };
    let driver = ingest
        .backend
        .driver_config()
        .ok_or("Expected a plugin backend")?;
    if driver.host != "/run/statkeep/plugin.sock"
        || driver.param("connect_timeout_ms") != Some("2000")
        || driver.param("call_timeout_ms") != Some("60000")
    {
        return Err(format!("Unexpected plugin driver config: {:?}", driver).into());
    }

    let cli = parse_with_config(&["statkeep", "serve-plugin", "--backend", "memory"], &config)?;
    let Command::ServePlugin(serve) = cli.command else {
        return Err("Expected serve-plugin".into());
    };
    if serve.socket != "/run/statkeep/plugin.sock" {
        return Err(format!("Unexpected socket: {}", serve.socket).into());
    }
    Ok(())
}

#[test]
fn invalid_cache_values_are_rejected() -> Result<(), ConfigError> {
    for (content, expected) in [
        ("[cache]\nrecent = 0", "recent"),
        ("[cache]\nsamples = 20\nwindow = 10", "samples"),
    ] {
        let config: ConfigFile =
            toml::from_str(content).map_err(|err| format!("toml failed: {}", err))?;
        match parse_with_config(&["statkeep", "ingest"], &config) {
            Err(ConfigError::FieldMustBePositive { field }) if field.ends_with(expected) => {}
            Err(ConfigError::SamplesExceedWindow { samples: 20, window: 10 }) if expected == "samples" => {}
            Err(err) => return Err(format!("Unexpected error for {}: {}", content, err).into()),
            Ok(_) => return Err(format!("Expected {} to be rejected", content).into()),
        }
    }
    Ok(())
}

#[test]
fn durations_accept_units_and_bare_seconds() -> Result<(), ConfigError> {
    let cases = [
        ("500ms", Duration::from_millis(500)),
        ("5", Duration::from_secs(5)),
        ("5s", Duration::from_secs(5)),
        ("2m", Duration::from_secs(120)),
        ("1h", Duration::from_secs(3_600)),
    ];
    for (input, expected) in cases {
        let parsed = parse_duration_value(input)?;
        if parsed != expected {
            return Err(format!("{} parsed as {:?}", input, parsed).into());
        }
    }
    for input in ["", "ms", "0s", "5d", "99999999999999999999h"] {
        if parse_duration_value(input).is_ok() {
            return Err(format!("Expected '{}' to be rejected", input).into());
        }
    }
    if DurationValue::Seconds(0).to_duration("x").is_ok() {
        return Err("Zero seconds must be rejected".into());
    }
    Ok(())
}
