//! Tropemap main entry point

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tropemap::config::{load_config_with_hash, Config};
use tropemap::crawler::run_crawl;

/// Tropemap: a wiki crawl engine
///
/// Crawls the configured wiki host, recording every article and the links
/// between articles into a SQLite store. Interrupted crawls resume from the
/// store on the next run.
#[derive(Parser, Debug)]
#[command(name = "tropemap")]
#[command(version)]
#[command(about = "Crawl a wiki into a SQLite store", long_about = None)]
struct Cli {
    /// Path to TOML configuration file; defaults apply if the file is absent
    #[arg(long, value_name = "CONFIG", default_value = "tropemap.toml")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = if cli.config.exists() {
        let (config, hash) = load_config_with_hash(&cli.config)
            .with_context(|| format!("loading {}", cli.config.display()))?;
        tracing::info!(
            "loaded configuration from {} (hash: {})",
            cli.config.display(),
            hash
        );
        config
    } else {
        tracing::info!(
            "no configuration file at {}, using defaults",
            cli.config.display()
        );
        Config::default()
    };

    tracing::info!(
        "crawling {}://{} into {}",
        config.site.scheme,
        config.site.host,
        config.output.database_path
    );

    run_crawl(config).await.context("crawl failed")?;
    Ok(())
}

/// Sets up the tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("tropemap=info,warn"),
            1 => EnvFilter::new("tropemap=debug,info"),
            2 => EnvFilter::new("tropemap=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
