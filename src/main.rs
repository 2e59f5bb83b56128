//! Polwatch main entry point
//!
//! This is the command-line interface for the polwatch news pipeline.

use clap::Parser;
use futures::StreamExt;
use polwatch::config::load_config_with_hash;
use polwatch::discovery::{backfill_loop, crawl, poll_loop, SearchClient};
use polwatch::enrich::Enricher;
use polwatch::fetch::{ChromeRenderer, Fetcher, Render};
use polwatch::ingest::Ingestor;
use polwatch::storage::{ArticleStore, SqliteStore};
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Polwatch: an unattended government/politics news pipeline
///
/// Polwatch discovers article URLs from outlet homepages and a search API,
/// fetches them static-first with a headless-render fallback, enriches them
/// with summaries and topics, and persists them once each.
#[derive(Parser, Debug)]
#[command(name = "polwatch")]
#[command(version = "0.1.0")]
#[command(about = "Unattended news discovery and enrichment pipeline", long_about = None)]
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

    /// Validate config and show what would run without running it
    #[arg(long, conflicts_with_all = ["stats", "crawl_once", "backfill_only"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "crawl_once", "backfill_only"])]
    stats: bool,

    /// Run a single homepage crawl pass and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats", "backfill_only"])]
    crawl_once: bool,

    /// Run only the historical backfill miner
    #[arg(long, conflicts_with_all = ["dry_run", "stats", "crawl_once"])]
    backfill_only: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, _config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.crawl_once {
        handle_crawl_once(config).await?;
    } else {
        handle_run(config, cli.backfill_only).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("polwatch=info,warn"),
            1 => EnvFilter::new("polwatch=debug,info"),
            2 => EnvFilter::new("polwatch=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would run
fn handle_dry_run(config: &polwatch::config::Config) {
    println!("=== Polwatch Dry Run ===\n");

    println!("Store:");
    println!("  Database: {}", config.store.database_path);

    println!("\nCrawler:");
    println!("  Seeds ({}):", config.crawler.seeds.len());
    for seed in &config.crawler.seeds {
        println!("    - {}", seed);
    }
    println!("  Keywords: {}", config.crawler.keywords.join(", "));
    println!("  Max links per pass: {}", config.crawler.max_links);
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Pass interval: {}s", config.crawler.interval_secs);

    println!("\nSearch API:");
    println!("  Endpoint: {}", config.search.endpoint);
    println!("  Keys: {}", config.search.keys.len());
    println!("  Query: {}", config.search.query);
    println!("  Poll interval: {}s", config.search.poll_interval_secs);
    println!(
        "  Backfill window: {}h",
        config.search.backfill_window_hours
    );

    println!("\nGenerative API:");
    println!("  Endpoint: {}", config.generative.endpoint);
    println!("  Keys: {}", config.generative.keys.len());
    match &config.generative.model_override {
        Some(model) => println!("  Model: {} (pinned)", model),
        None => println!("  Model: resolved from service listing"),
    }

    println!("\nFetch:");
    println!("  Thin threshold: {} chars", config.fetch.thin_threshold);
    println!(
        "  Render fallback: {}",
        if config.fetch.render_enabled {
            "enabled"
        } else {
            "disabled"
        }
    );

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows article counts from the database
fn handle_stats(config: &polwatch::config::Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("Database: {}\n", config.store.database_path);

    let store = SqliteStore::new(Path::new(&config.store.database_path))?;

    let total = store.article_count()?;
    println!("Articles stored: {}", total);

    let by_domain = store.counts_by_domain()?;
    if !by_domain.is_empty() {
        println!("\nBy source domain:");
        for (domain, count) in by_domain {
            println!("  {:>6}  {}", count, domain);
        }
    }

    Ok(())
}

/// Handles the --crawl-once mode: one homepage pass, ingest, exit
async fn handle_crawl_once(
    config: polwatch::config::Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let http = polwatch::fetch::build_http_client(&config.fetch)?;
    let ingestor = build_ingestor(&config, http.clone())?;

    crawl_pass(&http, &config.crawler, &ingestor).await;

    tracing::info!("Crawl pass complete");
    Ok(())
}

/// Handles the long-running mode: crawl, poll, and backfill forever
async fn handle_run(
    config: polwatch::config::Config,
    backfill_only: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let http = polwatch::fetch::build_http_client(&config.fetch)?;
    let ingestor = build_ingestor(&config, http.clone())?;
    let search = Arc::new(SearchClient::new(http.clone(), &config.search));

    let mut tasks = Vec::new();

    if !backfill_only {
        let crawler_config = config.crawler.clone();
        let crawl_http = http.clone();
        let crawl_ingestor = Arc::clone(&ingestor);
        tasks.push(tokio::spawn(async move {
            loop {
                crawl_pass(&crawl_http, &crawler_config, &crawl_ingestor).await;
                tokio::time::sleep(Duration::from_secs(crawler_config.interval_secs)).await;
            }
        }));

        let poll_search = Arc::clone(&search);
        let poll_ingestor = Arc::clone(&ingestor);
        let poll_config = config.search.clone();
        tasks.push(tokio::spawn(poll_loop(
            poll_search,
            poll_ingestor,
            poll_config,
        )));
    }

    let backfill_config = config.search.clone();
    tasks.push(tokio::spawn(backfill_loop(
        search,
        ingestor,
        backfill_config,
    )));

    tracing::info!(
        "Pipeline running ({} tasks), press Ctrl-C to stop",
        tasks.len()
    );

    // The loops never return; block until one panics or the process is killed
    for task in tasks {
        task.await?;
    }

    Ok(())
}

/// Builds the shared ingest coordinator from configuration
fn build_ingestor(
    config: &polwatch::config::Config,
    http: Client,
) -> Result<Arc<Ingestor>, Box<dyn std::error::Error>> {
    let store = SqliteStore::new(Path::new(&config.store.database_path))?;
    let store: Arc<Mutex<dyn ArticleStore + Send>> = Arc::new(Mutex::new(store));

    let renderer: Option<Box<dyn Render>> = if config.fetch.render_enabled {
        Some(Box::new(ChromeRenderer::new(Duration::from_secs(
            config.fetch.render_timeout_secs,
        ))))
    } else {
        None
    };
    let fetcher = Arc::new(Fetcher::with_client(
        config.fetch.clone(),
        http.clone(),
        renderer,
    ));

    let enricher = Arc::new(Enricher::new(http, &config.generative));

    Ok(Arc::new(Ingestor::new(
        store,
        fetcher,
        enricher,
        config.crawler.keywords.clone(),
        config.fetch.min_content_chars,
    )))
}

/// Runs one homepage crawl pass and ingests everything it finds
async fn crawl_pass(
    http: &Client,
    config: &polwatch::config::CrawlerConfig,
    ingestor: &Arc<Ingestor>,
) {
    tracing::info!("Starting homepage crawl pass ({} seeds)", config.seeds.len());

    let found = crawl(
        http,
        &config.seeds,
        &config.keywords,
        config.max_links,
        config.max_depth,
        config.concurrency,
    )
    .await;

    tracing::info!("Crawl pass found {} candidate URLs", found.len());

    futures::stream::iter(found)
        .for_each_concurrent(config.concurrency, |url| {
            let ingestor = Arc::clone(ingestor);
            async move {
                ingestor.ingest(&url).await;
            }
        })
        .await;
}
