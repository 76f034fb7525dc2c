use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::BufReader;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Mutex;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use crate::domain::ContainerInfo;
use crate::error::{PluginError, StorageError};
use crate::shutdown::{ShutdownReceiver, ShutdownSender, shutdown_channel};
use crate::storage::StorageDriver;

use super::protocol::{
    AckMessage, Envelope, ErrorMessage, VersionReplyMessage, WireMessage, read_message,
    send_message,
};
use super::{DEFAULT_SOCKET_PATH, PROTOCOL_VERSION};

/// Pause after a failed accept so a persistent error does not spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerOptions {
    pub socket_path: PathBuf,
    pub version: String,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self::new(DEFAULT_SOCKET_PATH)
    }
}

impl ServerOptions {
    #[must_use]
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            version: PROTOCOL_VERSION.to_owned(),
        }
    }

    /// Reports `version` in handshakes instead of [`PROTOCOL_VERSION`].
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }
}

/// Serves a storage driver to plugin clients over a Unix socket.
pub struct PluginServer {
    socket_path: PathBuf,
    driver: Arc<dyn StorageDriver>,
    shutdown_tx: ShutdownSender,
    accept_handle: Mutex<Option<JoinHandle<()>>>,
}

impl PluginServer {
    /// Binds the socket and starts accepting connections in the background.
    ///
    /// A stale socket file at the path is removed first and the parent
    /// directory is created when missing.
    ///
    /// # Errors
    ///
    /// Returns `Bind` when the socket cannot be prepared or bound.
    pub async fn start(
        options: ServerOptions,
        driver: Arc<dyn StorageDriver>,
    ) -> Result<Self, PluginError> {
        let ServerOptions {
            socket_path,
            version,
        } = options;
        let bind_error = |source: std::io::Error| PluginError::Bind {
            path: socket_path.clone(),
            source,
        };

        match tokio::fs::remove_file(&socket_path).await {
            Ok(()) => debug!("Removed stale plugin socket {}", socket_path.display()),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(bind_error(err)),
        }
        if let Some(parent) = socket_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
        {
            tokio::fs::create_dir_all(parent).await.map_err(bind_error)?;
        }
        let listener = UnixListener::bind(&socket_path).map_err(bind_error)?;
        info!(
            "Storage plugin listening on {} (driver {}, version {})",
            socket_path.display(),
            driver.engine(),
            version
        );

        let (shutdown_tx, shutdown_rx) = shutdown_channel();
        let accept_handle = tokio::spawn(accept_loop(
            listener,
            Arc::clone(&driver),
            Arc::from(version),
            shutdown_tx.clone(),
            shutdown_rx,
        ));
        Ok(Self {
            socket_path,
            driver,
            shutdown_tx,
            accept_handle: Mutex::new(Some(accept_handle)),
        })
    }

    #[must_use]
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Stops accepting, waits for open connections to finish their current
    /// request, removes the socket file and closes the wrapped driver.
    /// Idempotent.
    ///
    /// # Errors
    ///
    /// Returns `ListenerClose` or `DriverClose` when one step fails and
    /// `Close` carrying both errors when both do.
    pub async fn close(&self) -> Result<(), PluginError> {
        let Some(accept_handle) = self.accept_handle.lock().await.take() else {
            return Ok(());
        };
        drop(self.shutdown_tx.send(()));
        if let Err(err) = accept_handle.await {
            warn!("Plugin accept loop ended abnormally: {}", err);
        }

        let listener = match tokio::fs::remove_file(&self.socket_path).await {
            Ok(()) => None,
            Err(err) if err.kind() == ErrorKind::NotFound => None,
            Err(err) => Some(PluginError::ListenerClose {
                path: self.socket_path.clone(),
                source: err,
            }),
        };
        let driver = self.driver.close().await.err();
        info!("Storage plugin on {} closed", self.socket_path.display());

        match (listener, driver) {
            (None, None) => Ok(()),
            (Some(listener), None) => Err(listener),
            (None, Some(driver)) => Err(PluginError::DriverClose {
                source: Box::new(driver),
            }),
            (Some(listener), Some(driver)) => Err(PluginError::Close {
                listener: Box::new(listener),
                driver: Box::new(driver),
            }),
        }
    }
}

/// Signals shutdown and removes the socket file when [`PluginServer::close`]
/// was never called. Connections wind down in the background and the driver
/// stays open; call `close` to wait for both.
impl Drop for PluginServer {
    fn drop(&mut self) {
        if self.accept_handle.get_mut().take().is_none() {
            return;
        }
        drop(self.shutdown_tx.send(()));
        match std::fs::remove_file(&self.socket_path) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => warn!(
                "Failed to remove plugin socket {}: {}",
                self.socket_path.display(),
                err
            ),
        }
        debug!(
            "Storage plugin on {} dropped without close",
            self.socket_path.display()
        );
    }
}

async fn accept_loop(
    listener: UnixListener,
    driver: Arc<dyn StorageDriver>,
    version: Arc<str>,
    shutdown_tx: ShutdownSender,
    mut shutdown_rx: ShutdownReceiver,
) {
    let mut connections = JoinSet::new();
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            accepted = listener.accept() => {
                let stream = match accepted {
                    Ok((stream, _addr)) => stream,
                    Err(err) => {
                        warn!("Plugin accept failed: {}", err);
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                        continue;
                    }
                };
                // Subscribe before re-checking so a concurrent close reaches
                // either this loop or the new connection.
                let connection_rx = shutdown_tx.subscribe();
                if !shutdown_rx.is_empty() {
                    break;
                }
                debug!("Plugin client connected");
                connections.spawn(serve_connection(
                    stream,
                    Arc::clone(&driver),
                    Arc::clone(&version),
                    connection_rx,
                ));
            }
            Some(finished) = connections.join_next(), if !connections.is_empty() => {
                if let Err(err) = finished {
                    warn!("Plugin connection task failed: {}", err);
                }
            }
        }
    }
    while let Some(finished) = connections.join_next().await {
        if let Err(err) = finished {
            warn!("Plugin connection task failed: {}", err);
        }
    }
}

async fn serve_connection(
    stream: UnixStream,
    driver: Arc<dyn StorageDriver>,
    version: Arc<str>,
    mut shutdown_rx: ShutdownReceiver,
) {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    loop {
        let request = tokio::select! {
            _ = shutdown_rx.recv() => break,
            request = read_message(&mut reader) => request,
        };
        let reply = match request {
            Ok(request) => Envelope {
                id: request.id,
                message: handle_request(request.message, driver.as_ref(), &version).await,
            },
            Err(PluginError::ConnectionClosed) => {
                debug!("Plugin client disconnected");
                break;
            }
            Err(err @ PluginError::Deserialize { .. }) => Envelope {
                id: 0,
                message: WireMessage::Error(ErrorMessage::new("invalid_request", err.to_string())),
            },
            Err(err) => {
                debug!("Dropping plugin connection: {}", err);
                break;
            }
        };
        if let Err(err) = send_message(&mut write_half, &reply).await {
            debug!("Failed to reply to plugin client: {}", err);
            break;
        }
    }
}

async fn handle_request(
    message: WireMessage,
    driver: &dyn StorageDriver,
    version: &str,
) -> WireMessage {
    match message {
        WireMessage::Version(_) => WireMessage::VersionReply(VersionReplyMessage {
            version: version.to_owned(),
        }),
        WireMessage::AddStats(request) => match forward_stats(driver, request.info).await {
            Ok(()) => WireMessage::Ack(AckMessage {}),
            Err(reply) => WireMessage::Error(reply),
        },
        other @ (WireMessage::VersionReply(_) | WireMessage::Ack(_) | WireMessage::Error(_)) => {
            WireMessage::Error(ErrorMessage::new(
                "invalid_request",
                format!("{} is not a request", other.name()),
            ))
        }
    }
}

/// Hands every stats element to the driver in order, stopping at the first
/// failure.
async fn forward_stats(
    driver: &dyn StorageDriver,
    info: Option<ContainerInfo>,
) -> Result<(), ErrorMessage> {
    let info = info.ok_or_else(|| ErrorMessage::from(&PluginError::InvalidRequest))?;
    if info.stats.is_empty() {
        return Err(ErrorMessage::from(&PluginError::EmptyBatch));
    }
    for stats in &info.stats {
        driver
            .add_stats(&info.reference, stats)
            .await
            .map_err(|err: StorageError| ErrorMessage::new("driver", err.to_string()))?;
    }
    Ok(())
}
