//! The `split` subcommand: print fetch partitions as JSON.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use stockstream_lib::{load_symbols_from_file, split_into_batches, DEFAULT_BATCH_SIZE};

use crate::output::print_json;

#[derive(Args)]
pub struct SplitArgs {
    /// Symbols per batch
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// JSON file of the form {"symbols": [...]}
    #[arg(long, default_value = super::fetch::DEFAULT_SYMBOLS_FILE)]
    pub symbols_file: PathBuf,
}

/// Prints JSON regardless of `--output`.
pub fn run(args: &SplitArgs) -> Result<()> {
    let symbols = load_symbols_from_file(&args.symbols_file)?;
    let batches = split_into_batches(&symbols, args.batch_size)?;
    print_json(&batches);
    Ok(())
}
