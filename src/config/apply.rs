use clap::ArgMatches;
use clap::parser::ValueSource;

use crate::args::{BackendArgs, CacheArgs, Cli, Command};
use crate::error::ConfigError;
use crate::plugin::PLUGIN_ENGINE;

use super::types::{CacheConfig, ConfigFile, PluginConfig, StorageConfig};

/// Applies configuration values to CLI arguments. Values given on the
/// command line (or through their env var) are left alone.
///
/// # Errors
///
/// Returns an error when config values are invalid.
pub fn apply_config(
    cli: &mut Cli,
    matches: &ArgMatches,
    config: &ConfigFile,
) -> Result<(), ConfigError> {
    let Some((_, sub_matches)) = matches.subcommand() else {
        return Ok(());
    };
    match &mut cli.command {
        Command::Ingest(args) => {
            if let Some(cache) = config.cache.as_ref() {
                apply_cache(&mut args.cache, sub_matches, cache)?;
            }
            apply_backend(&mut args.backend, sub_matches, config)?;
        }
        Command::ServePlugin(args) => {
            if !is_explicit(sub_matches, "socket")
                && let Some(socket) = config.plugin.as_ref().and_then(|plugin| plugin.socket.clone())
            {
                args.socket = socket;
            }
            apply_backend(&mut args.backend, sub_matches, config)?;
        }
    }
    Ok(())
}

fn apply_cache(
    args: &mut CacheArgs,
    matches: &ArgMatches,
    cache: &CacheConfig,
) -> Result<(), ConfigError> {
    if !is_explicit(matches, "recent")
        && let Some(recent) = cache.recent
    {
        args.recent = ensure_positive(recent, "cache.recent")?;
    }
    if !is_explicit(matches, "samples")
        && let Some(samples) = cache.samples
    {
        args.samples = ensure_positive(samples, "cache.samples")?;
    }
    if !is_explicit(matches, "window")
        && let Some(window) = cache.window
    {
        args.window = ensure_positive(window, "cache.window")?;
    }
    if args.samples > args.window {
        return Err(ConfigError::SamplesExceedWindow {
            samples: args.samples,
            window: args.window,
        });
    }
    Ok(())
}

fn apply_backend(
    args: &mut BackendArgs,
    matches: &ArgMatches,
    config: &ConfigFile,
) -> Result<(), ConfigError> {
    if let Some(storage) = config.storage.as_ref() {
        apply_storage(args, matches, storage);
    }
    if args.engine.as_deref() == Some(PLUGIN_ENGINE)
        && let Some(plugin) = config.plugin.as_ref()
    {
        apply_plugin(args, plugin)?;
    }
    Ok(())
}

/// Fills unset backend fields from `[storage]`, unless the command line
/// picked a different engine.
fn apply_storage(args: &mut BackendArgs, matches: &ArgMatches, storage: &StorageConfig) {
    match (args.engine.as_deref(), storage.engine.as_deref()) {
        (Some(cli), Some(file)) if cli != file => return,
        (Some(_), Some(_) | None) => {}
        (None, file) => args.engine = file.map(str::to_owned),
    }
    fill(&mut args.host, matches, "host", storage.host.as_ref());
    if !is_explicit(matches, "port") && args.port.is_none() {
        args.port = storage.port;
    }
    fill(&mut args.username, matches, "username", storage.username.as_ref());
    fill(&mut args.password, matches, "password", storage.password.as_ref());
    fill(&mut args.database, matches, "database", storage.database.as_ref());
    if let Some(params) = storage.params.as_ref() {
        prepend_params(args, params.iter().map(|(key, value)| (key.clone(), value.clone())));
    }
}

fn apply_plugin(args: &mut BackendArgs, plugin: &PluginConfig) -> Result<(), ConfigError> {
    if args.host.is_none() {
        args.host.clone_from(&plugin.socket);
    }
    let mut timeouts = Vec::new();
    if let Some(timeout) = plugin.connect_timeout.as_ref() {
        let timeout = timeout.to_duration("plugin.connect_timeout")?;
        timeouts.push(("connect_timeout_ms".to_owned(), timeout.as_millis().to_string()));
    }
    if let Some(timeout) = plugin.call_timeout.as_ref() {
        let timeout = timeout.to_duration("plugin.call_timeout")?;
        timeouts.push(("call_timeout_ms".to_owned(), timeout.as_millis().to_string()));
    }
    prepend_params(args, timeouts);
    Ok(())
}

/// Later params win when the driver config is built, so file values go first.
fn prepend_params<I>(args: &mut BackendArgs, params: I)
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut merged: Vec<(String, String)> = params.into_iter().collect();
    merged.append(&mut args.params);
    args.params = merged;
}

fn fill(slot: &mut Option<String>, matches: &ArgMatches, name: &str, value: Option<&String>) {
    if !is_explicit(matches, name) && slot.is_none() {
        *slot = value.cloned();
    }
}

fn is_explicit(matches: &ArgMatches, name: &str) -> bool {
    matches!(
        matches.value_source(name),
        Some(ValueSource::CommandLine | ValueSource::EnvVariable)
    )
}

fn ensure_positive(value: usize, field: &'static str) -> Result<usize, ConfigError> {
    if value == 0 {
        return Err(ConfigError::FieldMustBePositive { field });
    }
    Ok(value)
}
