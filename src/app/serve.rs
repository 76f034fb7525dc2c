use tracing::{debug, info};

use statkeep::args::ServePluginArgs;
use statkeep::error::{AppResult, ConfigError};
use statkeep::plugin::{PluginServer, ServerOptions};
use statkeep::shutdown::{setup_signal_shutdown_handler, shutdown_channel};
use statkeep::storage::DriverRegistry;

/// Hosts the configured driver behind the plugin socket until Ctrl+C or
/// SIGTERM, then closes the server and the driver.
pub(crate) async fn run_serve_plugin(
    args: &ServePluginArgs,
    registry: &DriverRegistry,
) -> AppResult<()> {
    let config = args
        .backend
        .driver_config()
        .ok_or(ConfigError::MissingBackend {
            command: "serve-plugin",
        })?;
    let driver = registry.create(&config).await?;
    let server = PluginServer::start(ServerOptions::new(&args.socket), driver).await?;

    let (shutdown_tx, mut shutdown_rx) = shutdown_channel();
    let signal_handle = setup_signal_shutdown_handler(&shutdown_tx);
    info!(
        "Serving storage engine '{}' on {}; press Ctrl+C to stop",
        config.engine, args.socket
    );
    if let Err(err) = shutdown_rx.recv().await {
        debug!("Shutdown channel closed: {}", err);
    }
    signal_handle.await?;

    info!("Shutting down storage plugin");
    server.close().await?;
    Ok(())
}
