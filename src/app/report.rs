use serde::Serialize;
use tokio::io::AsyncWriteExt;

use statkeep::args::IngestArgs;
use statkeep::cache::PercentileReport;
use statkeep::domain::ContainerStats;
use statkeep::error::AppResult;
use statkeep::storage::MemoryStorage;

use super::ingest::IngestCounts;

#[derive(Debug, Serialize)]
pub(crate) struct IngestReport {
    pub(crate) lines: usize,
    pub(crate) accepted: u64,
    pub(crate) rejected: u64,
    pub(crate) backend: Option<String>,
    pub(crate) containers: Vec<ContainerReport>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ContainerReport {
    pub(crate) id: String,
    pub(crate) retained: usize,
    pub(crate) newest_sequence: Option<u64>,
    pub(crate) percentiles: PercentileReport,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(crate) samples: Vec<SampleReport>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SampleReport {
    pub(crate) sequence_number: u64,
    pub(crate) stats: ContainerStats,
}

pub(crate) fn build_report(
    storage: &MemoryStorage,
    counts: IngestCounts,
    args: &IngestArgs,
) -> AppResult<IngestReport> {
    let mut containers = Vec::new();
    for id in storage.containers() {
        let recent = storage.recent_stats(&id, -1)?;
        let percentiles =
            storage.percentiles(&id, &args.cpu_percentiles, &args.memory_percentiles)?;
        let samples = if args.report_samples == 0 {
            Vec::new()
        } else {
            storage
                .samples(&id, args.report_samples)?
                .into_iter()
                .map(|observation| SampleReport {
                    sequence_number: observation.sequence_number(),
                    stats: observation.stats().clone(),
                })
                .collect()
        };
        containers.push(ContainerReport {
            retained: recent.len(),
            newest_sequence: recent.last().map(|observation| observation.sequence_number()),
            id,
            percentiles,
            samples,
        });
    }
    Ok(IngestReport {
        lines: counts.lines,
        accepted: counts.accepted,
        rejected: counts.rejected,
        backend: storage
            .backend()
            .map(|backend| backend.engine().to_owned()),
        containers,
    })
}

pub(crate) async fn write_report(report: &IngestReport, output: Option<&str>) -> AppResult<()> {
    let mut json = serde_json::to_string_pretty(report)?;
    json.push('\n');
    match output {
        Some(path) => tokio::fs::write(path, json).await?,
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(json.as_bytes()).await?;
            stdout.flush().await?;
        }
    }
    Ok(())
}
