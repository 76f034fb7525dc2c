use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tracing::{debug, info};

use crate::domain::{ContainerInfo, ContainerReference, ContainerStats};
use crate::error::{PluginError, StorageResult};
use crate::storage::StorageDriver;

use super::protocol::{
    AddStatsMessage, Envelope, VersionMessage, WireMessage, read_message, send_message,
};
use super::{DEFAULT_SOCKET_PATH, PLUGIN_ENGINE, PROTOCOL_VERSION};

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    pub socket_path: PathBuf,
    pub connect_timeout: Duration,
    pub call_timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self::new(DEFAULT_SOCKET_PATH)
    }
}

impl ClientOptions {
    #[must_use]
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Disconnected,
    Connecting,
    VersionChecking,
    Ready,
    /// A call lost the transport; every later call fails fast.
    Failed,
    Closed,
}

#[derive(Debug)]
struct Status {
    state: ClientState,
    failure: Option<String>,
}

struct Connection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    next_id: u64,
}

/// Storage driver living in another process, reached over a Unix socket.
///
/// One client owns one connection and runs at most one RPC at a time. There
/// is no queuing, batching or retry: a lost transport moves the client to
/// [`ClientState::Failed`] for good.
pub struct PluginClient {
    options: ClientOptions,
    status: parking_lot::Mutex<Status>,
    connection: tokio::sync::Mutex<Option<Connection>>,
}

impl PluginClient {
    /// Dials the plugin socket and checks the protocol version.
    ///
    /// # Errors
    ///
    /// Returns `Connection`/`ConnectTimeout` when the socket cannot be
    /// reached, `IncompatibleVersion` when the server reports anything other
    /// than [`PROTOCOL_VERSION`], or `TransportFailure` when the handshake
    /// breaks.
    pub async fn connect(options: ClientOptions) -> Result<Self, PluginError> {
        let client = Self {
            options,
            status: parking_lot::Mutex::new(Status {
                state: ClientState::Disconnected,
                failure: None,
            }),
            connection: tokio::sync::Mutex::new(None),
        };
        client.open().await?;
        Ok(client)
    }

    #[must_use]
    pub fn state(&self) -> ClientState {
        self.status.lock().state
    }

    #[must_use]
    pub fn socket_path(&self) -> &Path {
        &self.options.socket_path
    }

    #[must_use]
    pub const fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Sends one observation and waits for the plugin to acknowledge it.
    ///
    /// # Errors
    ///
    /// Returns `Remote` when the plugin's driver rejected the stats,
    /// `TransportFailure` when the connection broke (now or on an earlier
    /// call), or `Closed` after [`PluginClient::close`].
    pub async fn add_stats(
        &self,
        reference: &ContainerReference,
        stats: &ContainerStats,
    ) -> Result<(), PluginError> {
        let mut guard = self.connection.lock().await;
        let Some(connection) = guard.as_mut() else {
            return Err(self.unavailable());
        };
        let message = WireMessage::AddStats(Box::new(AddStatsMessage {
            info: Some(ContainerInfo {
                reference: reference.clone(),
                stats: vec![stats.clone()],
            }),
        }));
        let outcome = match self.call(connection, message, "add_stats").await {
            Ok(WireMessage::Ack(_)) => return Ok(()),
            Ok(WireMessage::Error(reply)) => {
                return Err(PluginError::Remote {
                    kind: reply.kind,
                    message: reply.message,
                });
            }
            Ok(other) => transport_failure("add_stats", format!("unexpected {} reply", other.name())),
            Err(err) => err,
        };
        *guard = None;
        self.fail(&outcome);
        Err(outcome)
    }

    /// Shuts down the write half of the connection. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket shutdown fails; the client is closed
    /// either way.
    pub async fn close(&self) -> Result<(), PluginError> {
        let connection = self.connection.lock().await.take();
        self.set_state(ClientState::Closed);
        let Some(mut connection) = connection else {
            return Ok(());
        };
        debug!(
            "Closing plugin connection {}",
            self.options.socket_path.display()
        );
        connection
            .writer
            .shutdown()
            .await
            .map_err(|err| PluginError::Io {
                context: "close plugin connection",
                source: err,
            })
    }

    async fn open(&self) -> Result<(), PluginError> {
        let path = self.options.socket_path.clone();
        self.set_state(ClientState::Connecting);
        let stream = match tokio::time::timeout(
            self.options.connect_timeout,
            UnixStream::connect(&path),
        )
        .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(err)) => {
                self.set_state(ClientState::Disconnected);
                return Err(PluginError::Connection { path, source: err });
            }
            Err(_elapsed) => {
                self.set_state(ClientState::Disconnected);
                return Err(PluginError::ConnectTimeout {
                    path,
                    timeout_ms: duration_ms(self.options.connect_timeout),
                });
            }
        };
        let (read_half, writer) = stream.into_split();
        let mut connection = Connection {
            reader: BufReader::new(read_half),
            writer,
            next_id: 0,
        };

        self.set_state(ClientState::VersionChecking);
        let version = match self
            .call(
                &mut connection,
                WireMessage::Version(VersionMessage::default()),
                "version check",
            )
            .await
        {
            Ok(WireMessage::VersionReply(reply)) => reply.version,
            Ok(WireMessage::Error(reply)) => {
                self.set_state(ClientState::Closed);
                return Err(PluginError::Remote {
                    kind: reply.kind,
                    message: reply.message,
                });
            }
            Ok(other) => {
                let err = transport_failure(
                    "version check",
                    format!("unexpected {} reply", other.name()),
                );
                self.fail(&err);
                return Err(err);
            }
            Err(err) => {
                self.fail(&err);
                return Err(err);
            }
        };
        if version != PROTOCOL_VERSION {
            self.set_state(ClientState::Closed);
            drop(connection.writer.shutdown().await);
            return Err(PluginError::IncompatibleVersion {
                expected: PROTOCOL_VERSION,
                actual: version,
            });
        }

        *self.connection.lock().await = Some(connection);
        self.set_state(ClientState::Ready);
        info!(
            "Connected to storage plugin {} (version {})",
            path.display(),
            version
        );
        Ok(())
    }

    /// One request/reply exchange bounded by the call timeout. Every error
    /// is a `TransportFailure`.
    async fn call(
        &self,
        connection: &mut Connection,
        message: WireMessage,
        context: &'static str,
    ) -> Result<WireMessage, PluginError> {
        let id = connection.next_id.wrapping_add(1);
        connection.next_id = id;
        let request = Envelope { id, message };
        let exchange = async {
            send_message(&mut connection.writer, &request).await?;
            read_message(&mut connection.reader).await
        };
        let reply = match tokio::time::timeout(self.options.call_timeout, exchange).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(err)) => return Err(transport_failure(context, err.to_string())),
            Err(_elapsed) => {
                return Err(transport_failure(
                    context,
                    format!(
                        "no reply within {}ms",
                        duration_ms(self.options.call_timeout)
                    ),
                ));
            }
        };
        if reply.id != id {
            return Err(transport_failure(
                context,
                format!("reply id {} does not match request id {}", reply.id, id),
            ));
        }
        Ok(reply.message)
    }

    fn set_state(&self, state: ClientState) {
        self.status.lock().state = state;
    }

    fn fail(&self, err: &PluginError) {
        tracing::error!("Storage plugin transport failed: {}", err);
        let mut status = self.status.lock();
        status.state = ClientState::Failed;
        status.failure = Some(err.to_string());
    }

    fn unavailable(&self) -> PluginError {
        let status = self.status.lock();
        match status.state {
            ClientState::Failed => transport_failure(
                "plugin call",
                format!(
                    "connection failed earlier: {}",
                    status.failure.as_deref().unwrap_or("unknown error")
                ),
            ),
            ClientState::Disconnected
            | ClientState::Connecting
            | ClientState::VersionChecking
            | ClientState::Ready
            | ClientState::Closed => PluginError::Closed,
        }
    }
}

#[async_trait]
impl StorageDriver for PluginClient {
    fn engine(&self) -> &str {
        PLUGIN_ENGINE
    }

    async fn add_stats(
        &self,
        reference: &ContainerReference,
        stats: &ContainerStats,
    ) -> StorageResult<()> {
        Ok(Self::add_stats(self, reference, stats).await?)
    }

    async fn close(&self) -> StorageResult<()> {
        Ok(Self::close(self).await?)
    }
}

fn transport_failure(context: &'static str, message: String) -> PluginError {
    PluginError::TransportFailure { context, message }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
