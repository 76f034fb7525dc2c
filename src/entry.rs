use clap::{ArgMatches, CommandFactory, FromArgMatches};

use statkeep::args::{Cli, Command};
use statkeep::config::{apply_config, load_config};
use statkeep::error::AppResult;
use statkeep::storage::driver_registry;

use crate::app::{run_ingest, run_serve_plugin};
use crate::logger::init_logging;

pub(crate) fn run() -> AppResult<()> {
    let matches = Cli::command().get_matches();
    let mut cli = Cli::from_arg_matches(&matches)?;

    init_logging(cli.verbose, cli.no_color);
    apply_file_config(&mut cli, &matches)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run_async(cli))
}

fn apply_file_config(cli: &mut Cli, matches: &ArgMatches) -> AppResult<()> {
    if let Some(config) = load_config(cli.config.as_deref())? {
        apply_config(cli, matches, &config)?;
    }
    Ok(())
}

async fn run_async(cli: Cli) -> AppResult<()> {
    let registry = driver_registry();
    match &cli.command {
        Command::Ingest(args) => run_ingest(args, registry).await,
        Command::ServePlugin(args) => run_serve_plugin(args, registry).await,
    }
}
