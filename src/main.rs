//! Prerender-Crawl main entry point
//!
//! Command-line interface for crawling a locally-served application with
//! the bundled HTTP session provider.

use clap::Parser;
use prerender_crawl::config::load_config;
use prerender_crawl::crawler::crawl;
use prerender_crawl::session::HttpBrowser;
use prerender_crawl::{Config, CrawlError};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Prerender-Crawl: crawl a locally-served app for static pre-rendering
///
/// Seeds a frontier from the configured entry points, fetches every
/// discovered same-origin page with a bounded number of concurrent
/// sessions, and reports the console/error output captured per URL.
#[derive(Parser, Debug)]
#[command(name = "prerender-crawl")]
#[command(version = "1.0.0")]
#[command(about = "Crawl a locally-served app for static pre-rendering", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Override the configured concurrency
    #[arg(long)]
    concurrency: Option<usize>,

    /// Validate config and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let mut config = load_config(&cli.config)?;

    if let Some(concurrency) = cli.concurrency {
        if concurrency == 0 {
            anyhow::bail!("--concurrency must be positive");
        }
        config.options.concurrency = concurrency;
    }

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("prerender_crawl=info,warn"),
            1 => EnvFilter::new("prerender_crawl=debug,info"),
            2 => EnvFilter::new("prerender_crawl=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Prerender-Crawl Dry Run ===\n");

    println!("Crawl target:");
    println!("  Base path: {}", config.crawl.base_path);
    println!("  Public path: {}", config.crawl.public_path);
    println!("  Source dir: {}", config.crawl.source_dir.display());

    println!("\nOptions:");
    println!("  Follow links: {}", config.options.follow_links);
    println!("  Concurrency: {}", config.options.concurrency);
    println!("  User agent: {}", config.options.user_agent);
    println!(
        "  Skip third-party requests: {}",
        config.options.skip_third_party_requests
    );
    println!("  Ignore page errors: {}", config.options.ignore_page_errors);
    if let Some(viewport) = &config.options.viewport {
        println!("  Viewport: {}x{}", viewport.width, viewport.height);
    }
    if let Some(wait_for) = config.options.wait_for {
        println!("  Wait after navigation: {}ms", wait_for);
    }

    println!("\nBrowser passthrough:");
    println!("  Headless: {}", config.browser.headless);
    println!("  Cache: {}", config.browser.cache);
    if let Some(path) = &config.browser.executable_path {
        println!("  Executable: {}", path.display());
    }

    println!("\nSeed paths ({}):", config.options.include.len());
    for path in &config.options.include {
        println!("  - {}", path);
    }

    println!("\nExclusions ({}):", config.options.exclude.len());
    for pattern in &config.options.exclude {
        println!("  - {}", pattern);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    let browser = Arc::new(HttpBrowser::new()?);

    match crawl(config, browser).await {
        Ok(records) => {
            let entries: usize = records.iter().map(|record| record.entries.len()).sum();
            tracing::info!(
                "Crawl succeeded: {} page(s), {} captured log entr{}",
                records.len(),
                entries,
                if entries == 1 { "y" } else { "ies" }
            );
            Ok(())
        }
        Err(CrawlError::Aborted) => {
            tracing::error!("Crawl aborted; no output was produced");
            std::process::exit(1);
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
