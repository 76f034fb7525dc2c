use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::{
    fs::{File, OpenOptions},
    io::{AsyncWriteExt, BufWriter},
    sync::Mutex,
};

use crate::domain::{ContainerReference, ContainerStats};
use crate::error::{StorageError, StorageResult};

use super::{DriverConfig, DriverFactory, StorageDriver};

pub const JSONL_ENGINE: &str = "jsonl";

/// One line of a `jsonl` sink file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonLinesRecord {
    pub reference: ContainerReference,
    pub stats: ContainerStats,
}

/// Appends one JSON object per observation to a file, flushing after each.
pub struct JsonLinesDriver {
    path: PathBuf,
    writer: Mutex<Option<BufWriter<File>>>,
}

impl JsonLinesDriver {
    /// Opens `path` for appending, creating it and its parent directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be created.
    pub async fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| StorageError::Io {
                    context: "create jsonl directory",
                    source: err,
                })?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|err| StorageError::Io {
                context: "open jsonl file",
                source: err,
            })?;
        Ok(Self {
            path,
            writer: Mutex::new(Some(BufWriter::new(file))),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl StorageDriver for JsonLinesDriver {
    fn engine(&self) -> &str {
        JSONL_ENGINE
    }

    async fn add_stats(
        &self,
        reference: &ContainerReference,
        stats: &ContainerStats,
    ) -> StorageResult<()> {
        let record = JsonLinesRecord {
            reference: reference.clone(),
            stats: stats.clone(),
        };
        let mut line = serde_json::to_vec(&record).map_err(|err| StorageError::Serialize {
            context: "encode jsonl record",
            source: err,
        })?;
        line.push(b'\n');

        let mut guard = self.writer.lock().await;
        let Some(writer) = guard.as_mut() else {
            return Err(StorageError::Closed {
                engine: JSONL_ENGINE.to_owned(),
            });
        };
        writer
            .write_all(&line)
            .await
            .map_err(|err| StorageError::Io {
                context: "write jsonl record",
                source: err,
            })?;
        writer.flush().await.map_err(|err| StorageError::Io {
            context: "flush jsonl file",
            source: err,
        })
    }

    async fn close(&self) -> StorageResult<()> {
        let Some(mut writer) = self.writer.lock().await.take() else {
            return Ok(());
        };
        writer.shutdown().await.map_err(|err| StorageError::Io {
            context: "close jsonl file",
            source: err,
        })?;
        tracing::debug!("Closed jsonl sink {}", self.path.display());
        Ok(())
    }
}

pub(super) struct JsonLinesFactory;

#[async_trait]
impl DriverFactory for JsonLinesFactory {
    fn engine(&self) -> &str {
        JSONL_ENGINE
    }

    async fn create(&self, config: &DriverConfig) -> StorageResult<Arc<dyn StorageDriver>> {
        let path = config
            .param("path")
            .unwrap_or(config.database.as_str())
            .trim();
        if path.is_empty() {
            return Err(StorageError::InvalidConfig {
                engine: JSONL_ENGINE,
                message: "set params.path or database to the output file".to_owned(),
            });
        }
        Ok(Arc::new(JsonLinesDriver::open(path).await?))
    }
}
