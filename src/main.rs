//! Webmark main entry point
//!
//! This is the command-line interface for the Webmark website-to-markdown
//! harvester.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use webmark::config::{load_config_with_hash, validate, Config, Robots403Policy};
use webmark::output::print_statistics;
use webmark::{Coordinator, WebmarkError};

/// Webmark: a polite website-to-markdown harvester
///
/// Webmark discovers a site's pages through its sitemaps (or by crawling
/// when there are none), extracts the main content of each page and saves
/// it as markdown, while respecting robots.txt and spacing out requests.
#[derive(Parser, Debug)]
#[command(name = "webmark")]
#[command(version = "1.0.0")]
#[command(about = "A polite website-to-markdown harvester", long_about = None)]
struct Cli {
    /// Base URL of the website to harvest
    #[arg(value_name = "URL")]
    url: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory the markdown files are written to
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<String>,

    /// Maximum link depth when crawling
    #[arg(short, long, value_name = "N")]
    depth: Option<u32>,

    /// Minimum seconds between requests to one domain
    #[arg(long, value_name = "S")]
    delay: Option<f64>,

    /// Upper bound in seconds for the backoff after a server error
    #[arg(long, value_name = "S")]
    max_delay: Option<f64>,

    /// Do not fetch or obey robots.txt
    #[arg(long)]
    ignore_robots: bool,

    /// User-Agent header sent with every request
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Only use sitemaps, never fall back to crawling
    #[arg(long)]
    sitemap_only: bool,

    /// How to treat a domain whose robots.txt answers 403
    #[arg(long, value_enum, value_name = "POLICY")]
    robots_403_policy: Option<Robots403Policy>,

    /// Number of pages processed at the same time
    #[arg(long, value_name = "N")]
    concurrency: Option<u32>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Discover pages and list them without processing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = build_config(&cli)?;
    validate(&config).context("Invalid configuration")?;

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    let coordinator = Coordinator::new(config, cancel.clone())?;

    if cli.dry_run {
        return handle_dry_run(&coordinator).await;
    }

    match coordinator.run().await {
        Ok(stats) => {
            println!();
            print_statistics(&stats);
            if stats.interrupted {
                tracing::warn!("Run interrupted, partial results reported");
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e @ WebmarkError::NothingToProcess { .. }) => {
            if cancel.is_cancelled() {
                tracing::warn!("Interrupted before any page was discovered");
            }
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Loads the configuration file, if any, and applies command-line overrides
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if let Some(url) = &cli.url {
        config.site.base_url = url.clone();
    }
    if let Some(dir) = &cli.output_dir {
        config.output.directory = dir.clone();
    }
    if let Some(depth) = cli.depth {
        config.crawler.max_depth = depth;
    }
    if let Some(delay) = cli.delay {
        config.crawler.request_delay = delay;
    }
    if let Some(max_delay) = cli.max_delay {
        config.crawler.max_backoff_delay = max_delay;
    }
    if cli.ignore_robots {
        config.crawler.respect_robots = false;
    }
    if let Some(user_agent) = &cli.user_agent {
        config.user_agent.name = user_agent.clone();
    }
    if cli.sitemap_only {
        config.crawler.sitemap_only = true;
    }
    if let Some(policy) = cli.robots_403_policy {
        config.crawler.robots_403_policy = policy;
    }
    if let Some(concurrency) = cli.concurrency {
        config.crawler.max_concurrent_pages = concurrency;
    }

    if config.site.base_url.is_empty() {
        anyhow::bail!("No URL given: pass one on the command line or set site.base-url");
    }

    Ok(config)
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("webmark=info,warn"),
            1 => EnvFilter::new("webmark=debug,info"),
            2 => EnvFilter::new("webmark=trace,debug"),
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

/// Cancels the run on the first Ctrl-C
fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight pages");
            cancel.cancel();
        }
    });
}

/// Handles the --dry-run mode: lists what would be processed
async fn handle_dry_run(coordinator: &Coordinator) -> anyhow::Result<ExitCode> {
    let discovery = coordinator.discover().await?;

    println!("=== Webmark Dry Run ===\n");
    println!("Site: {}", coordinator.base_url());
    println!("Strategy: {}", discovery.strategy);
    println!("\nPages ({}):", discovery.pages.len());
    for page in &discovery.pages {
        println!("  - {}", page.url);
    }

    Ok(ExitCode::SUCCESS)
}
