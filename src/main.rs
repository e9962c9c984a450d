//! Parts-Crawler main entry point
//!
//! This is the command-line interface for the Parts-Crawler catalog harvester.

use anyhow::Context;
use clap::{ArgGroup, Parser};
use parts_crawler::config::{load_config_with_hash, Config};
use parts_crawler::crawler::Coordinator;
use parts_crawler::storage::{
    open_storage, Pagination, ProductFilter, SqliteStorage, Storage, DEFAULT_PAGE_SIZE,
    MAX_PAGE_SIZE,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Parts-Crawler: a vendor parts catalog harvester
///
/// Parts-Crawler walks a parts catalog from its makes down through categories
/// and models to individual parts, and stores every part it finds in SQLite.
/// The stored catalog can then be listed, summarised and pruned.
#[derive(Parser, Debug)]
#[command(name = "parts-crawler")]
#[command(version = "1.0.0")]
#[command(about = "A vendor parts catalog harvester", long_about = None)]
#[command(group(
    ArgGroup::new("mode")
        .args(["dry_run", "stats", "export_summary", "list", "delete_id", "delete_part_number"])
        .multiple(false)
))]
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

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long)]
    stats: bool,

    /// Generate markdown summary from existing data and exit
    #[arg(long)]
    export_summary: bool,

    /// List stored products as JSON and exit
    #[arg(long)]
    list: bool,

    /// Only list products of this make
    #[arg(long, requires = "list")]
    make: Option<String>,

    /// Only list products in this category
    #[arg(long, requires = "list")]
    category: Option<String>,

    /// Only list products of this model
    #[arg(long, requires = "list")]
    model: Option<String>,

    /// Only list products with this part number
    #[arg(long, requires = "list")]
    part_number: Option<String>,

    /// Only list products with this part type
    #[arg(long, requires = "list")]
    part_type: Option<String>,

    /// Page to list (starting at 1)
    #[arg(long, default_value_t = 1, requires = "list",
          value_parser = clap::value_parser!(u32).range(1..))]
    page: u32,

    /// Products per page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE, requires = "list",
          value_parser = clap::value_parser!(u32).range(1..=MAX_PAGE_SIZE as i64))]
    size: u32,

    /// Delete the product with this ID and exit
    #[arg(long, value_name = "ID")]
    delete_id: Option<i64>,

    /// Delete every product with this part number and exit
    #[arg(long, value_name = "PART_NUMBER")]
    delete_part_number: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.export_summary {
        handle_export_summary(&config)?;
    } else if cli.list {
        handle_list(&config, &cli)?;
    } else if let Some(id) = cli.delete_id {
        handle_delete_id(&config, id)?;
    } else if let Some(part_number) = &cli.delete_part_number {
        handle_delete_part_number(&config, part_number)?;
    } else {
        handle_crawl(config, &config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("parts_crawler=info,warn"),
            1 => EnvFilter::new("parts_crawler=debug,info"),
            2 => EnvFilter::new("parts_crawler=trace,debug"),
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

fn open_database(config: &Config) -> anyhow::Result<SqliteStorage> {
    let path = Path::new(&config.output.database_path);
    open_storage(path).with_context(|| format!("Failed to open database {}", path.display()))
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Parts-Crawler Dry Run ===\n");

    println!("Crawler Configuration:");
    println!(
        "  Concurrent requests: {}",
        config.crawler.concurrent_requests
    );
    println!("  Request timeout: {}ms", config.crawler.request_timeout);
    println!(
        "  Start delay: {}-{}ms",
        config.crawler.start_delay_min, config.crawler.start_delay_max
    );

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    println!("\nSelectors:");
    println!("  Makes: {}", config.selectors.makes);
    println!("  Categories: {}", config.selectors.categories);
    println!("  Models: {}", config.selectors.models);
    println!("  Parts: {}", config.selectors.parts);
    println!("  Link: {}", config.selectors.link);
    println!("  Part type: {}", config.selectors.part_type);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  Summary: {}", config.output.summary_path);

    println!("\nStart URLs ({}):", config.catalog.start_urls.len());
    for url in &config.catalog.start_urls {
        println!("  - {}", url);
    }

    if config.catalog.allowed_domains.is_empty() {
        println!("\nAllowed Domains: any");
    } else {
        println!(
            "\nAllowed Domains ({}):",
            config.catalog.allowed_domains.len()
        );
        for domain in &config.catalog.allowed_domains {
            println!("  - {}", domain);
        }
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would start crawling from {} start URL(s)",
        config.catalog.start_urls.len()
    );
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    use parts_crawler::output::{load_statistics, print_statistics};

    println!("Database: {}\n", config.output.database_path);

    let storage = open_database(config)?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --export-summary mode: generates markdown summary
fn handle_export_summary(config: &Config) -> anyhow::Result<()> {
    use parts_crawler::output::{generate_markdown_summary, generate_summary};

    println!("=== Exporting Catalog Summary ===\n");
    println!("Database: {}", config.output.database_path);
    println!("Output: {}", config.output.summary_path);
    println!();

    let storage = open_database(config)?;

    tracing::info!("Loading catalog data from database...");
    let report = generate_summary(&storage)?;

    tracing::info!("Generating markdown summary...");
    generate_markdown_summary(&report, Path::new(&config.output.summary_path))
        .with_context(|| format!("Failed to write {}", config.output.summary_path))?;

    println!("✓ Summary exported to: {}", config.output.summary_path);

    Ok(())
}

/// Handles the --list mode: prints one page of products as JSON
fn handle_list(config: &Config, cli: &Cli) -> anyhow::Result<()> {
    let storage = open_database(config)?;

    let filter = ProductFilter {
        make: cli.make.clone(),
        category: cli.category.clone(),
        model: cli.model.clone(),
        part_number: cli.part_number.clone(),
        part_type: cli.part_type.clone(),
    };
    let pagination = Pagination::new(cli.page, cli.size)?;

    let page = storage.query_products(&filter, &pagination)?;
    println!("{}", serde_json::to_string_pretty(&page)?);

    Ok(())
}

/// Handles the --delete-id mode
fn handle_delete_id(config: &Config, id: i64) -> anyhow::Result<()> {
    let mut storage = open_database(config)?;
    let response = storage.delete_product(id)?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

/// Handles the --delete-part-number mode
fn handle_delete_part_number(config: &Config, part_number: &str) -> anyhow::Result<()> {
    let mut storage = open_database(config)?;
    let response = storage.delete_products_by_part_number(part_number)?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

/// Handles the main crawl operation
///
/// Ctrl-C closes the crawl early with reason "shutdown"; everything scraped up
/// to that point is still stored.
async fn handle_crawl(config: Config, config_hash: &str) -> anyhow::Result<()> {
    tracing::info!(
        "Start URLs: {}, allowed domains: {}",
        config.catalog.start_urls.len(),
        config.catalog.allowed_domains.len()
    );

    let mut coordinator = Coordinator::new(config, config_hash)?;

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    match coordinator.run_until(shutdown).await {
        Ok(summary) => {
            tracing::info!(
                "Crawl {} ({}): {} items scraped, {} stored",
                summary.run_id,
                summary.reason,
                summary.items_scraped,
                summary.items_written
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
