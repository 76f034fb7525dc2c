use clap::{Args, Parser, Subcommand};

use crate::cache::{CacheSettings, DEFAULT_RECENT, DEFAULT_SAMPLES, DEFAULT_WINDOW};
use crate::plugin::DEFAULT_SOCKET_PATH;
use crate::storage::DriverConfig;

use super::parsers::{parse_param, parse_percentile, parse_positive_usize};

const DEFAULT_PERCENTILES: [u8; 3] = [50, 90, 95];

#[derive(Debug, Parser, Clone)]
#[clap(
    name = "statkeep",
    version,
    about = "Windowed sampling and retention of container resource stats, with pluggable and out-of-process storage backends."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to config file (TOML or JSON). Defaults to ./statkeep.toml or ./statkeep.json
    #[arg(long, short = 'c', global = true, env = "STATKEEP_CONFIG")]
    pub config: Option<String>,

    /// Enable debug logging (overridden by STATKEEP_LOG / RUST_LOG)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Disable ANSI colors in log output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Feed a JSON-lines observation file through the retention caches and print a report
    Ingest(IngestArgs),
    /// Host a storage backend behind the plugin socket until interrupted
    ServePlugin(ServePluginArgs),
}

#[derive(Debug, Args, Clone)]
pub struct IngestArgs {
    /// JSON-lines input, one ContainerInfo object per line ("-" reads stdin)
    #[arg(long, short = 'i', default_value = "-")]
    pub input: String,

    #[command(flatten)]
    pub cache: CacheArgs,

    #[command(flatten)]
    pub backend: BackendArgs,

    /// CPU percentiles to report, comma-separated (0-100)
    #[arg(
        long = "cpu-percentiles",
        value_delimiter = ',',
        value_parser = parse_percentile,
        default_values_t = DEFAULT_PERCENTILES
    )]
    pub cpu_percentiles: Vec<u8>,

    /// Memory percentiles to report, comma-separated (0-100)
    #[arg(
        long = "memory-percentiles",
        value_delimiter = ',',
        value_parser = parse_percentile,
        default_values_t = DEFAULT_PERCENTILES
    )]
    pub memory_percentiles: Vec<u8>,

    /// Windowed samples to include per container in the report
    #[arg(long = "report-samples", default_value_t = 0)]
    pub report_samples: usize,

    /// Write the JSON report to this file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct ServePluginArgs {
    /// Unix socket to listen on
    #[arg(long, default_value = DEFAULT_SOCKET_PATH)]
    pub socket: String,

    #[command(flatten)]
    pub backend: BackendArgs,
}

#[derive(Debug, Args, Clone, PartialEq, Eq)]
pub struct CacheArgs {
    /// Recent observations kept per container
    #[arg(long, default_value_t = DEFAULT_RECENT, value_parser = parse_positive_usize)]
    pub recent: usize,

    /// Sampler slots per container (k)
    #[arg(long, default_value_t = DEFAULT_SAMPLES, value_parser = parse_positive_usize)]
    pub samples: usize,

    /// Sampler window per container, in observations (W)
    #[arg(long, default_value_t = DEFAULT_WINDOW, value_parser = parse_positive_usize)]
    pub window: usize,
}

impl CacheArgs {
    #[must_use]
    pub const fn settings(&self) -> CacheSettings {
        CacheSettings {
            recent: self.recent,
            samples: self.samples,
            window: self.window,
        }
    }
}

#[derive(Debug, Args, Clone, Default, PartialEq, Eq)]
pub struct BackendArgs {
    /// Storage backend engine (memory, jsonl, plugin)
    #[arg(long = "backend")]
    pub engine: Option<String>,

    /// Backend host; the socket path for the plugin engine
    #[arg(long = "backend-host")]
    pub host: Option<String>,

    /// Backend port
    #[arg(long = "backend-port")]
    pub port: Option<u16>,

    /// Backend user name
    #[arg(long = "backend-user")]
    pub username: Option<String>,

    /// Backend password
    #[arg(
        long = "backend-password",
        env = "STATKEEP_BACKEND_PASSWORD",
        hide_env_values = true
    )]
    pub password: Option<String>,

    /// Backend database; the output file for the jsonl engine
    #[arg(long = "backend-database")]
    pub database: Option<String>,

    /// Extra backend parameter as key=value (repeatable)
    #[arg(long = "backend-param", value_parser = parse_param)]
    pub params: Vec<(String, String)>,
}

impl BackendArgs {
    /// Registry configuration for the selected engine, if any.
    #[must_use]
    pub fn driver_config(&self) -> Option<DriverConfig> {
        let engine = self.engine.as_deref()?;
        let mut config = DriverConfig::new(engine);
        config.host = self.host.clone().unwrap_or_default();
        config.port = self.port;
        config.username = self.username.clone().unwrap_or_default();
        config.password = self.password.clone().unwrap_or_default();
        config.database = self.database.clone().unwrap_or_default();
        config.params = self.params.iter().cloned().collect();
        Some(config)
    }
}
