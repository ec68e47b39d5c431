//! Crawler module for fetching and dispatching queue entries
//!
//! This module contains the core harvesting logic, including:
//! - Per-domain rate limiting
//! - Page fetching through a pluggable fetcher
//! - Challenge detection and link classification
//! - Per-entry retry with backoff
//! - Overall run coordination and cooperative shutdown

#[cfg(feature = "browser")]
mod browser;
mod challenge;
mod classifier;
mod context;
mod controller;
mod coordinator;
mod fetcher;
mod parser;
mod rate_limiter;
mod shutdown;

#[cfg(feature = "browser")]
pub use browser::{BrowserFetcher, BrowserFetcherFactory};
pub use challenge::{inspect, ChallengeDetector, ChallengeSignal};
pub use classifier::{Link, LinkClassifier, LinkKind, LinkSet};
pub use context::HarvestContext;
pub use controller::{EntryJob, RetryController};
pub use coordinator::Coordinator;
pub use fetcher::{
    build_fetcher_factory, build_http_client, FetchError, FetchedPage, Fetcher, FetcherFactory,
    HttpFetcher, HttpFetcherFactory,
};
pub use parser::{extract_hrefs, extract_main_content, extract_title, resolve_link};
pub use rate_limiter::{random_delay, RateLimiter};
pub use shutdown::Shutdown;

use crate::config::Config;
use crate::output::RunSummary;
use crate::HarvestError;

/// Runs a complete harvest with the configured fetcher
///
/// This is the main entry point for starting a run. It will:
/// 1. Load (or discard, when `fresh`) the checkpoint
/// 2. Truncate the outlier and failure ledgers
/// 3. Read the queue and process it from the saved cursor
/// 4. Save the checkpoint and return the run summary
pub async fn harvest(
    config: Config,
    fresh: bool,
    shutdown: Shutdown,
) -> Result<RunSummary, HarvestError> {
    let mut coordinator = Coordinator::new(config, fresh)?;
    coordinator.run_from_input(shutdown).await
}
