use std::sync::Arc;

use clap::Parser;

use statkeep::args::{Cli, Command, IngestArgs};
use statkeep::cache::CacheSettings;
use statkeep::error::AppError;
use statkeep::plugin::{ClientOptions, PluginClient, PluginServer, ServerOptions};
use statkeep::storage::{DriverRegistry, MemoryStorage, StorageDriver};

use super::ingest::{IngestCounts, ingest_lines};
use super::report::build_report;

fn run_async_test<F>(future: F) -> Result<(), String>
where
    F: std::future::Future<Output = Result<(), String>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| format!("Failed to build runtime: {}", err))?;
    runtime.block_on(future)
}

fn line(id: &str, second: u64, cpu_ns: u64, memory: u64) -> String {
    format!(
        r#"{{"reference":{{"id":"{}","name":"{}"}},"stats":[{{"timestamp":"{}","cpu":{{"total_ns":{}}},"memory":{{"usage_bytes":{}}}}}]}}"#,
        id,
        id,
        chrono::DateTime::<chrono::Utc>::from_timestamp(i64::try_from(second).unwrap_or(0), 0)
            .map(|ts| ts.to_rfc3339())
            .unwrap_or_default(),
        cpu_ns,
        memory
    )
}

fn ingest_args(extra: &[&str]) -> Result<IngestArgs, String> {
    let mut argv = vec!["statkeep", "ingest"];
    argv.extend_from_slice(extra);
    let cli = Cli::try_parse_from(argv).map_err(|err| err.to_string())?;
    match cli.command {
        Command::Ingest(args) => Ok(args),
        Command::ServePlugin(_) => Err("Expected ingest args".to_owned()),
    }
}

#[test]
fn ingest_builds_per_container_reports() -> Result<(), String> {
    run_async_test(async {
        let args = ingest_args(&["--recent", "3", "--samples", "2", "--window", "4", "--report-samples", "2"])?;
        let storage = MemoryStorage::new(args.cache.settings()).map_err(|err| err.to_string())?;
        let mut input = String::new();
        for second in 1..=5_u64 {
            input.push_str(&line(
                "web",
                second,
                second.saturating_mul(1_000_000_000),
                second.saturating_mul(100),
            ));
            input.push('\n');
        }
        input.push_str("\n   \n");
        input.push_str(&line("db", 1, 0, 42));
        input.push('\n');

        let counts = ingest_lines(&storage, input.as_bytes())
            .await
            .map_err(|err| err.to_string())?;
        let expected = IngestCounts {
            lines: 8,
            accepted: 6,
            rejected: 0,
        };
        if counts != expected {
            return Err(format!("Unexpected counts: {:?}", counts));
        }

        let report = build_report(&storage, counts, &args).map_err(|err| err.to_string())?;
        let ids: Vec<&str> = report.containers.iter().map(|c| c.id.as_str()).collect();
        if ids != vec!["db", "web"] || report.backend.is_some() {
            return Err(format!("Unexpected report: {:?}", report));
        }
        let web = report
            .containers
            .iter()
            .find(|container| container.id == "web")
            .ok_or("missing web report")?;
        if web.retained != 3 || web.newest_sequence != Some(5) || web.samples.len() != 2 {
            return Err(format!("Unexpected web report: {:?}", web));
        }
        if web.percentiles.cpu_millicores.get(50) != Some(1_000) {
            return Err(format!("Expected one full core, got {:?}", web.percentiles));
        }
        if web.percentiles.memory_bytes.max != 500 {
            return Err(format!("Unexpected memory max: {:?}", web.percentiles));
        }
        Ok(())
    })
}

#[test]
fn ingest_skips_out_of_order_observations() -> Result<(), String> {
    run_async_test(async {
        let storage = MemoryStorage::new(CacheSettings::default()).map_err(|err| err.to_string())?;
        let input = format!(
            "{}\n{}\n{}\n",
            line("web", 10, 0, 1),
            line("web", 9, 0, 2),
            line("web", 11, 0, 3)
        );
        let counts = ingest_lines(&storage, input.as_bytes())
            .await
            .map_err(|err| err.to_string())?;
        if counts.accepted != 2 || counts.rejected != 1 {
            return Err(format!("Unexpected counts: {:?}", counts));
        }
        Ok(())
    })
}

#[test]
fn malformed_lines_report_their_line_number() -> Result<(), String> {
    run_async_test(async {
        let storage = MemoryStorage::new(CacheSettings::default()).map_err(|err| err.to_string())?;
        let input = format!("{}\nnot json\n", line("web", 1, 0, 1));
        match ingest_lines(&storage, input.as_bytes()).await {
            Err(AppError::InvalidObservationLine { line: 2, .. }) => Ok(()),
            other => Err(format!("Expected line 2 to fail, got {:?}", other)),
        }
    })
}

#[test]
fn lost_plugin_backend_stops_ingest() -> Result<(), String> {
    run_async_test(async {
        let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
        let socket = dir.path().join("plugin.sock");
        let hosted = MemoryStorage::new(CacheSettings::default()).map_err(|err| err.to_string())?;
        let server = PluginServer::start(ServerOptions::new(&socket), Arc::new(hosted))
            .await
            .map_err(|err| err.to_string())?;
        let client = PluginClient::connect(ClientOptions::new(&socket))
            .await
            .map_err(|err| err.to_string())?;
        let storage = MemoryStorage::new(CacheSettings::default())
            .map_err(|err| err.to_string())?
            .with_backend(Arc::new(client));

        let first = format!("{}\n", line("web", 1, 0, 1));
        ingest_lines(&storage, first.as_bytes())
            .await
            .map_err(|err| err.to_string())?;

        server.close().await.map_err(|err| err.to_string())?;
        let second = format!("{}\n", line("web", 2, 0, 1));
        match ingest_lines(&storage, second.as_bytes()).await {
            Err(err) if err.is_transport_failure() => {}
            other => return Err(format!("Expected transport failure, got {:?}", other)),
        }
        storage.close().await.map_err(|err| err.to_string())
    })
}

#[test]
fn unknown_backend_fails_before_reading_input() -> Result<(), String> {
    run_async_test(async {
        let args = ingest_args(&["--backend", "influxdb", "--input", "/nonexistent/input.jsonl"])?;
        match super::run_ingest(&args, &DriverRegistry::with_builtins()).await {
            Err(AppError::Storage(err)) if err.to_string().contains("influxdb") => Ok(()),
            other => Err(format!("Expected UnknownBackend, got {:?}", other)),
        }
    })
}
