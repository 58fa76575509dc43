//! regsweep - scheduled container registry cleanup.
//!
//! Deletes old or excess images from a remote container registry to keep
//! storage cost bounded. Images older than the age threshold go first; if
//! the registry still exceeds its byte budget, the largest remaining images
//! are deleted until it fits.
//!
//! Designed to run from cron or CI on a schedule; `--dry-run` prints the
//! plan without deleting anything.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
mod error;
mod output;
mod sweep;

use output::OutputFormat;
use regsweep_registry::HttpRegistry;
use sweep::SweepOptions;

/// Clean old or excess images out of a container registry.
#[derive(Debug, Parser)]
#[command(name = "regsweep")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Registry host to clean (e.g. myregistry.azurecr.io).
    registry: String,

    /// Maximum image age in days; older images are deleted.
    #[arg(short = 'a', long, value_name = "DAYS", default_value_t = 90)]
    max_age: u32,

    /// Maximum total size in bytes the registry may grow to.
    #[arg(short = 'l', long, value_name = "BYTES", default_value_t = 2_000_000_000_000)]
    limit: u64,

    /// Only consider repositories whose name contains this filter (repeatable).
    #[arg(long = "repository", value_name = "NAME")]
    repositories: Vec<String>,

    /// Delete images from repositories whose name contains this CI marker,
    /// regardless of age or size (repeatable).
    #[arg(long = "ci", value_name = "NAME")]
    ci: Vec<String>,

    /// Compute and print the plan without deleting anything.
    #[arg(long)]
    dry_run: bool,

    /// Delete every manifest regardless of age or size.
    #[arg(long, conflicts_with = "dry_run")]
    purge: bool,

    /// Output format (table or json).
    #[arg(long, default_value = "table")]
    format: String,

    /// Debug-level logging.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so `--format json` stays pipeable.
    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(cli).await {
        error::print_error(&e);
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let format: OutputFormat = cli.format.parse().map_err(error::CliError::InvalidConfig)?;

    let config = config::Config::from_env(&cli.registry);
    let registry = HttpRegistry::new(config.registry_config()).map_err(error::CliError::from)?;

    let options = SweepOptions {
        max_age_days: cli.max_age,
        limit_bytes: cli.limit,
        repositories: cli.repositories,
        ci: cli.ci,
        dry_run: cli.dry_run,
        purge: cli.purge,
    };

    sweep::run(&registry, &options, format).await?;
    Ok(())
}
