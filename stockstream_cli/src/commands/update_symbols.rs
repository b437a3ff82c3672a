//! The `update-symbols` subcommand: archive the directory and partition it.

use std::time::Instant;

use anyhow::Result;
use clap::Args;
use stockstream_lib::{
    run_symbol_refresh, Config, DirectoryClient, RefreshReport, SampleDirectory, StockStreamError,
    SymbolArchive, DEFAULT_BATCH_SIZE,
};

use crate::output::{print_failure, print_refresh_report, FailureReport, OutputFormat};

#[derive(Args)]
pub struct UpdateSymbolsArgs {
    /// Symbols per fetch batch
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Use the built-in sample listing instead of downloading the directory
    #[arg(long)]
    pub mock_source: bool,

    /// Archive date (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub date: Option<String>,
}

pub async fn run(args: &UpdateSymbolsArgs, config: &Config, format: &OutputFormat) -> Result<()> {
    let start = Instant::now();
    match refresh(args, config).await {
        Ok(report) => {
            print_refresh_report(&report, format);
            Ok(())
        }
        Err(err) => {
            print_failure(&FailureReport::new(&err, start.elapsed()), format);
            Err(err.into())
        }
    }
}

async fn refresh(args: &UpdateSymbolsArgs, config: &Config) -> Result<RefreshReport, StockStreamError> {
    let date = super::resolve_date(args.date.as_deref())?;
    let archive = SymbolArchive::new(config.open_store()?, &config.symbols_prefix);

    if args.mock_source {
        run_symbol_refresh(&SampleDirectory, &archive, date, args.batch_size).await
    } else {
        let client = DirectoryClient::new()?;
        run_symbol_refresh(&client, &archive, date, args.batch_size).await
    }
}
