use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Installs the global subscriber. `STATKEEP_LOG` takes precedence over
/// `RUST_LOG`; without either the level follows `verbose`.
pub fn init_logging(verbose: bool, no_color: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = std::env::var("STATKEEP_LOG")
        .or_else(|_missing| std::env::var("RUST_LOG"))
        .map_or_else(
            |_missing| EnvFilter::new(default_level),
            |value| {
                EnvFilter::try_new(&value).unwrap_or_else(|err| {
                    eprintln!("Ignoring invalid log filter '{}': {}", value, err);
                    EnvFilter::new(default_level)
                })
            },
        );

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_ansi(!no_color)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set global default subscriber: {}", err);
    }
}
