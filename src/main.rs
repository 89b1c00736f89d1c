//! Book-Ingest main entry point
//!
//! This is the command-line interface for the Book-Ingest catalog pipeline.

use anyhow::Context;
use book_ingest::config::{load_config_with_hash, Config};
use book_ingest::crawler::{run_ingestion, ListingSelectors, ListingWalker};
use book_ingest::output::{load_statistics, print_books, print_statistics};
use book_ingest::storage::{BookStore, SqliteStorage};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Book-Ingest: a catalog listing ingestion pipeline
///
/// Book-Ingest walks the listing pages of a book catalog, enriches each
/// record from its detail page, and upserts the results into SQLite.
#[derive(Parser, Debug)]
#[command(name = "book-ingest")]
#[command(version)]
#[command(about = "Crawls a paginated book catalog into SQLite", long_about = None)]
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

    /// Validate config and show which listing pages would be walked
    #[arg(long, conflicts_with_all = ["stats", "search", "show"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "search", "show"])]
    stats: bool,

    /// Search stored books by title, author or subject and exit
    #[arg(long, value_name = "QUERY", conflicts_with_all = ["dry_run", "stats", "show"])]
    search: Option<String>,

    /// Show one stored book as JSON and exit
    #[arg(long, value_name = "ID", conflicts_with_all = ["dry_run", "stats", "search"])]
    show: Option<String>,

    /// Maximum number of search results
    #[arg(long, default_value_t = 20)]
    limit: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.stats {
        handle_stats(&config)
    } else if let Some(query) = &cli.search {
        handle_search(&config, query, cli.limit)
    } else if let Some(id) = &cli.show {
        handle_show(&config, id)
    } else {
        handle_ingest(&config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("book_ingest=info,warn"),
            1 => EnvFilter::new("book_ingest=debug,info"),
            2 => EnvFilter::new("book_ingest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

fn open_store(config: &Config) -> anyhow::Result<SqliteStorage> {
    SqliteStorage::new(Path::new(&config.output.database_path))
        .with_context(|| format!("failed to open database {}", config.output.database_path))
}

/// Handles the --dry-run mode: validates config and lists the pages to walk
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Book-Ingest Dry Run ===\n");

    println!("Source:");
    println!("  Base URL: {}", config.source.base_url);
    println!("  Readiness selector: {}", config.source.readiness_selector);

    println!("\nCrawler:");
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Max records: {}", config.crawler.max_records);
    println!(
        "  Attempts: {} ({}ms apart)",
        config.crawler.max_attempts, config.crawler.retry_delay_ms
    );
    println!("  Navigation timeout: {}ms", config.crawler.navigation_timeout_ms);

    println!("\nEnrichment:");
    if config.enrichment.enabled {
        println!(
            "  Batches of {} ({}ms apart)",
            config.enrichment.batch_size, config.enrichment.batch_delay_ms
        );
    } else {
        println!("  Disabled");
    }

    println!("\nUser Agent: {}", config.user_agent.header_value());
    println!("Database: {}", config.output.database_path);

    let selectors = ListingSelectors::from_config(&config.selectors)?;
    let walker = ListingWalker::new(&config.source, &config.crawler, selectors)?;
    println!("\nListing pages (at most):");
    for page in 1..=config.crawler.max_pages {
        println!("  {}. {}", page, walker.page_url(page)?);
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = open_store(config)?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

fn handle_search(config: &Config, query: &str, limit: usize) -> anyhow::Result<()> {
    let storage = open_store(config)?;
    let books = storage.search_books(query, limit)?;
    print_books(&books);
    Ok(())
}

fn handle_show(config: &Config, id: &str) -> anyhow::Result<()> {
    let storage = open_store(config)?;
    match storage.get_book(id)? {
        Some(book) => println!("{}", serde_json::to_string_pretty(&book)?),
        None => anyhow::bail!("no book with id '{}'", id),
    }
    Ok(())
}

/// Handles the default mode: one ingestion run, report printed as JSON
async fn handle_ingest(config: &Config) -> anyhow::Result<()> {
    match run_ingestion(config).await {
        Ok(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Ingestion failed: {}", e);
            anyhow::bail!("ingestion failed")
        }
    }
}
