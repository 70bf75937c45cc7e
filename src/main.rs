//! shopcrawl main entry point
//!
//! This is the command-line interface for the shopcrawl listing and detail
//! crawler.

use anyhow::Context;
use clap::Parser;
use shopcrawl::config::{load_config_with_hash, resolve_proxy, validate, Config};
use shopcrawl::crawler::{plan, Coordinator};
use shopcrawl::output::print_summary;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// shopcrawl: a storefront listing and detail crawler
///
/// shopcrawl visits the search-result pages of each configured query in
/// bounded concurrent batches, writes every product it finds to
/// `<query>.csv`, then visits each product page and writes its details to
/// `<title>.csv`.
#[derive(Parser, Debug)]
#[command(name = "shopcrawl")]
#[command(version = "1.0.0")]
#[command(about = "A storefront listing and detail crawler", long_about = None)]
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

    /// Search term to crawl instead of the configured ones (repeatable)
    #[arg(long = "query", value_name = "TERM")]
    queries: Vec<String>,

    /// Number of listing pages per query
    #[arg(long)]
    pages: Option<u32>,

    /// Maximum number of listing pages fetched at once
    #[arg(long)]
    concurrency: Option<u32>,

    /// Country passed to the proxy
    #[arg(long)]
    country: Option<String>,

    /// Only run the listing phase
    #[arg(long)]
    skip_details: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    apply_overrides(&mut config, &cli);
    validate(&config).context("invalid configuration after command-line overrides")?;

    if cli.dry_run {
        return handle_dry_run(&config);
    }

    handle_crawl(config, config_hash).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("shopcrawl=info,warn"),
            1 => EnvFilter::new("shopcrawl=debug,info"),
            2 => EnvFilter::new("shopcrawl=trace,debug"),
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

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if !cli.queries.is_empty() {
        config.crawler.queries = cli.queries.clone();
    }
    if let Some(pages) = cli.pages {
        config.crawler.pages = pages;
    }
    if let Some(concurrency) = cli.concurrency {
        config.crawler.concurrency = concurrency;
    }
    if let Some(country) = &cli.country {
        match config.proxy.as_mut() {
            Some(proxy) => proxy.country = country.clone(),
            None => tracing::warn!("--country has no effect without a [proxy] section"),
        }
    }
    if cli.skip_details {
        config.pipeline.details = false;
    }
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== shopcrawl Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Pages per query: {}", config.crawler.pages);
    println!("  Concurrency: {}", config.crawler.concurrency);
    println!("  Attempts per page: {}", config.crawler.max_retries);
    match config.crawler.listing_timeout_secs {
        Some(secs) => println!("  Listing timeout: {}s", secs),
        None => println!("  Listing timeout: backend default"),
    }
    println!("  Detail timeout: {}s", config.crawler.detail_timeout_secs);

    println!("\nPipeline:");
    println!("  Paginate: {}", config.pipeline.paginate);
    println!("  Persist: {}", config.pipeline.persist);
    println!("  Details: {}", config.pipeline.details);

    println!("\nBrowser: {:?}", config.browser.backend);
    match &config.proxy {
        Some(proxy) => println!(
            "Proxy: {} (country {}, key from ${})",
            proxy.endpoint, proxy.country, proxy.api_key_env
        ),
        None => println!("Proxy: none"),
    }

    println!("\nOutput:");
    println!("  Records: {}", config.output.directory.display());
    println!("  Snapshots: {}", config.output.snapshot_directory.display());

    for query_plan in plan(config)? {
        println!("\nQuery '{}':", query_plan.query);
        if let Some(file) = &query_plan.listing_file {
            println!("  Listing file: {}", file.display());
        }
        for (index, batch) in query_plan.batches.iter().enumerate() {
            println!("  Batch {}:", index + 1);
            for url in batch {
                println!("    * {}", url);
            }
        }
        if query_plan.details {
            println!("  Then: visit every listed product page");
        }
    }

    println!("\n✓ Configuration is valid");
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, config_hash: String) -> anyhow::Result<()> {
    let proxy = resolve_proxy(&config)?;
    let coordinator = Coordinator::from_config(config, proxy)
        .await?
        .with_config_hash(config_hash);

    let cancel = coordinator.cancel_signal();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received; finishing in-flight pages");
            cancel.cancel();
        }
    });

    match coordinator.run().await {
        Ok(summary) => {
            print_summary(&summary);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
