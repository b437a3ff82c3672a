mod commands;
mod output;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use stockstream_lib::{Config, LogFormat};
use tracing_subscriber::filter::{Directive, EnvFilter};

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "stockstream")]
#[command(about = "Fetch, validate and store daily stock prices")]
struct Cli {
    /// Output format: table or json
    #[arg(long, default_value = "table", global = true)]
    output: String,

    /// Log format: text or json (defaults to LOG_FORMAT)
    #[arg(long, global = true)]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch one day of prices for a batch of symbols and store them
    Fetch(commands::fetch::FetchArgs),
    /// Refresh the symbol universe from the exchange directory
    UpdateSymbols(commands::update_symbols::UpdateSymbolsArgs),
    /// Re-validate a stored batch
    Validate(commands::validate::ValidateArgs),
    /// Split a symbol list into fetch batches
    Split(commands::split::SplitArgs),
}

fn init_tracing(log_format: Option<&str>) -> Result<()> {
    let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let default_directive: Directive = level
        .to_lowercase()
        .parse()
        .with_context(|| format!("invalid LOG_LEVEL {:?}", level))?;
    let filter = EnvFilter::builder()
        .with_default_directive(default_directive)
        .from_env_lossy();

    let format = match log_format {
        Some(raw) => raw.to_string(),
        None => std::env::var("LOG_FORMAT").unwrap_or_default(),
    };
    let format: LogFormat = format.parse().map_err(|e: String| anyhow!(e))?;

    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.log_format.as_deref())?;

    let format = OutputFormat::parse(&cli.output);
    let config = || Config::from_env().context("failed to load configuration");

    match &cli.command {
        Commands::Fetch(args) => commands::fetch::run(args, &config()?, &format).await?,
        Commands::UpdateSymbols(args) => {
            commands::update_symbols::run(args, &config()?, &format).await?
        }
        Commands::Validate(args) => commands::validate::run(args, &config()?, &format)?,
        Commands::Split(args) => commands::split::run(args)?,
    }

    Ok(())
}
