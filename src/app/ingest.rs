use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

use statkeep::args::IngestArgs;
use statkeep::domain::ContainerInfo;
use statkeep::error::{AppError, AppResult, StorageError};
use statkeep::storage::{DriverRegistry, MemoryStorage, StorageDriver};

use super::report::{build_report, write_report};

/// Line and observation counters for one ingest run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct IngestCounts {
    pub(crate) lines: usize,
    pub(crate) accepted: u64,
    pub(crate) rejected: u64,
}

/// Reads the observation stream, feeds it through the retention caches and
/// the configured backend, then writes the report.
///
/// Out-of-order observations are skipped with a warning. Any other storage
/// failure, a lost plugin connection included, stops the run with an error.
pub(crate) async fn run_ingest(args: &IngestArgs, registry: &DriverRegistry) -> AppResult<()> {
    let mut storage = MemoryStorage::new(args.cache.settings())?;
    if let Some(config) = args.backend.driver_config() {
        storage = storage.with_backend(registry.create(&config).await?);
    }

    let ingested = if args.input == "-" {
        ingest_lines(&storage, BufReader::new(tokio::io::stdin())).await
    } else {
        match tokio::fs::File::open(&args.input).await {
            Ok(file) => ingest_lines(&storage, BufReader::new(file)).await,
            Err(err) => {
                error!("Failed to open input {}: {}", args.input, err);
                Err(AppError::from(err))
            }
        }
    };
    let closed = storage.close().await;
    let counts = ingested?;
    closed?;

    info!(
        "Ingested {} observations from {} lines ({} rejected, {} containers)",
        counts.accepted,
        counts.lines,
        counts.rejected,
        storage.containers().len()
    );
    let report = build_report(&storage, counts, args)?;
    write_report(&report, args.output.as_deref()).await
}

pub(crate) async fn ingest_lines<R>(storage: &MemoryStorage, reader: R) -> AppResult<IngestCounts>
where
    R: AsyncBufRead + Unpin,
{
    let mut counts = IngestCounts::default();
    let mut lines = reader.lines();
    while let Some(raw) = lines.next_line().await? {
        counts.lines = counts.lines.saturating_add(1);
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        let info: ContainerInfo =
            serde_json::from_str(trimmed).map_err(|err| AppError::InvalidObservationLine {
                line: counts.lines,
                source: err,
            })?;
        for stats in info.stats {
            match storage.record(&info.reference, stats).await {
                Ok(_) => counts.accepted = counts.accepted.saturating_add(1),
                Err(err @ StorageError::OutOfOrderTimestamp { .. }) => {
                    warn!("Skipping line {}: {}", counts.lines, err);
                    counts.rejected = counts.rejected.saturating_add(1);
                }
                Err(err) => {
                    if err.is_transport_failure() {
                        error!("Storage plugin connection lost; stopping ingest");
                    }
                    return Err(err.into());
                }
            }
        }
    }
    Ok(counts)
}
