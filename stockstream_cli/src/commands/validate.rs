//! The `validate` subcommand: re-run the batch checks on a stored object.

use anyhow::{anyhow, Result};
use clap::Args;
use stockstream_lib::validation::validate_batch_with;
use stockstream_lib::{Config, RawDataStore};

use crate::output::{print_findings, OutputFormat};

#[derive(Args)]
pub struct ValidateArgs {
    /// Object key of the batch; defaults to the most recent one
    #[arg(long)]
    pub key: Option<String>,
}

pub fn run(args: &ValidateArgs, config: &Config, format: &OutputFormat) -> Result<()> {
    let raw = RawDataStore::new(config.open_store()?, &config.raw_data_prefix);

    let key = match &args.key {
        Some(key) => key.clone(),
        None => raw
            .latest()?
            .map(|info| info.key)
            .ok_or_else(|| anyhow!("no batches stored under {}", raw.prefix()))?,
    };

    let frame = raw.download_frame(&key)?;
    let report = validate_batch_with(&frame, &config.thresholds);
    tracing::info!(key = %key, rows = frame.len(), findings = report.len(), "Validated batch");

    print_findings(&key, frame.len(), &report, format);
    Ok(())
}
