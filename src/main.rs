//! Doc-Harvest main entry point
//!
//! This is the command-line interface for the Doc-Harvest document collector.

use anyhow::Context;
use clap::Parser;
use doc_harvest::config::{load_config_with_hash, Config};
use doc_harvest::crawler::{harvest, Shutdown};
use doc_harvest::output::{print_checkpoint, print_summary, write_markdown_summary};
use doc_harvest::storage::{load_queue, CheckpointStore};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Doc-Harvest: a resumable, polite document collector
///
/// Doc-Harvest walks a `label,url` list, downloads the documents and pages
/// each entry points at, and checkpoints its progress so an interrupted run
/// picks up where it stopped.
#[derive(Parser, Debug)]
#[command(name = "doc-harvest")]
#[command(version)]
#[command(about = "A resumable, polite document collector", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG", default_value = "harvest.toml")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Discard the saved checkpoint and start from the first entry
    #[arg(long)]
    fresh: bool,

    /// Validate config and show the queue without fetching anything
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show the saved checkpoint and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.stats {
        handle_stats(&config)
    } else {
        handle_harvest(config, &config_hash, cli.fresh).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("doc_harvest=info,warn"),
            1 => EnvFilter::new("doc_harvest=debug,info"),
            2 => EnvFilter::new("doc_harvest=trace,debug"),
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

/// Handles the --dry-run mode: validates config and lists the queue
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Doc-Harvest Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Fetcher: {:?}", config.crawler.fetcher);
    println!(
        "  Rate limit: {}-{}ms",
        config.crawler.rate_limit_min_ms, config.crawler.rate_limit_max_ms
    );
    println!("  Max retries: {}", config.crawler.max_retries);
    println!("  Download attempts: {}", config.crawler.download_attempts);
    println!(
        "  Link volume threshold: {}",
        config.crawler.link_volume_threshold
    );

    println!("\nUser Agent:");
    println!("  Default: {}", config.user_agent.header_value());
    println!(
        "  Rotation: every {} page fetches from {} agents",
        config.crawler.user_agent_rotation,
        config.user_agent.rotation_pool.len()
    );

    println!("\nOutput:");
    println!("  Base directory: {}", config.output.base_dir);
    println!("  Checkpoint: {}", config.output.checkpoint_path);
    println!("  Outliers: {}", config.output.outliers_path);
    println!("  Failures: {}", config.output.failures_path);
    if let Some(summary_path) = &config.output.summary_path {
        println!("  Summary: {}", summary_path);
    }

    if !config.literals.is_empty() {
        println!("\nLiteral Labels ({}):", config.literals.len());
        for literal in &config.literals {
            println!("  - {} -> {}", literal.label, literal.file_name);
        }
    }

    let queue_path = Path::new(&config.input.urls_path);
    let queue = load_queue(queue_path)
        .with_context(|| format!("Failed to read queue {}", queue_path.display()))?;
    let checkpoint = CheckpointStore::new(&config.output.checkpoint_path).load();

    println!("\nQueue ({} entries):", queue.len());
    for (index, entry) in queue.iter().enumerate() {
        let marker = if checkpoint.is_processed(&entry.url) {
            "done"
        } else if index < checkpoint.current_index() {
            "skip"
        } else {
            "todo"
        };
        println!("  [{}] {:>4} {} - {}", marker, index, entry.label, entry.url);
    }

    println!("\nConfiguration is valid");
    Ok(())
}

/// Handles the --stats mode: shows the saved checkpoint
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let store = CheckpointStore::new(&config.output.checkpoint_path);
    println!("Checkpoint: {}\n", store.path().display());

    let checkpoint = store
        .try_load()
        .with_context(|| format!("Failed to read checkpoint {}", store.path().display()))?
        .unwrap_or_default();

    let total = load_queue(Path::new(&config.input.urls_path))
        .ok()
        .map(|queue| queue.len());
    print_checkpoint(&checkpoint, total);

    Ok(())
}

/// Handles the main harvest run
async fn handle_harvest(config: Config, config_hash: &str, fresh: bool) -> anyhow::Result<()> {
    if fresh {
        tracing::info!("Starting fresh run (ignoring saved checkpoint)");
    } else {
        tracing::info!("Starting run (will resume from saved checkpoint)");
    }

    let summary_path = config.output.summary_path.clone();
    let shutdown = Shutdown::new();
    let listener = shutdown.listen_for_ctrl_c();

    let result = harvest(config, fresh, shutdown).await;
    listener.abort();

    let summary = match result {
        Ok(summary) => summary,
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            return Err(e.into());
        }
    };

    print_summary(&summary);

    if let Some(path) = summary_path {
        write_markdown_summary(&summary, Some(config_hash), Path::new(&path))
            .with_context(|| format!("Failed to write summary {}", path))?;
        println!("\nSummary written to: {}", path);
    }

    Ok(())
}
