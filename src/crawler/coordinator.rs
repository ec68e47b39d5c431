//! Harvest coordinator - main run loop
//!
//! Walks the queue from the checkpoint's cursor, one entry at a time:
//! - Skips URLs already processed and domains already blocked
//! - Writes literal artifacts for configured labels
//! - Hands everything else to the retry controller
//! - Records the outcome in the ledgers and saves the checkpoint
//!
//! The coordinator is the only owner of the [`Checkpoint`]. A shutdown
//! request abandons the entry in flight (it is retried on the next run) and
//! still saves progress.

use super::context::HarvestContext;
use super::controller::{EntryJob, RetryController};
use super::fetcher::{build_fetcher_factory, FetcherFactory};
use super::shutdown::Shutdown;
use crate::config::{Config, LiteralEntry};
use crate::output::RunSummary;
use crate::persist::sanitize_label;
use crate::state::{Checkpoint, EntryOutcome};
use crate::storage::{load_queue, CheckpointStore, Ledgers, QueueEntry};
use crate::url::{amend_url, domain_of};
use crate::HarvestError;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Main coordinator structure
pub struct Coordinator {
    config: Config,
    store: CheckpointStore,
    checkpoint: Checkpoint,
    ledgers: Ledgers,
    controller: RetryController,
    ctx: HarvestContext,
    base_dir: PathBuf,
}

impl Coordinator {
    /// Creates a coordinator with the fetcher named in the configuration
    ///
    /// Loads the checkpoint (or discards it when `fresh`) and truncates both
    /// ledgers.
    pub fn new(config: Config, fresh: bool) -> Result<Self, HarvestError> {
        let ctx = HarvestContext::from_config(&config)?;
        let factory = build_fetcher_factory(&config, ctx.client.clone())?;
        Self::assemble(config, fresh, ctx, factory)
    }

    /// Creates a coordinator that loads listing pages through `factory`
    pub fn with_fetcher_factory(
        config: Config,
        fresh: bool,
        factory: Box<dyn FetcherFactory>,
    ) -> Result<Self, HarvestError> {
        let ctx = HarvestContext::from_config(&config)?;
        Self::assemble(config, fresh, ctx, factory)
    }

    fn assemble(
        config: Config,
        fresh: bool,
        ctx: HarvestContext,
        factory: Box<dyn FetcherFactory>,
    ) -> Result<Self, HarvestError> {
        let store = CheckpointStore::new(&config.output.checkpoint_path);
        if fresh {
            info!("Starting fresh, discarding {}", store.path().display());
            store.clear()?;
        }
        let checkpoint = store.load();

        let ledgers = Ledgers::create(
            Path::new(&config.output.outliers_path),
            Path::new(&config.output.failures_path),
        )?;

        let controller = RetryController::new(&config, factory);
        let base_dir = PathBuf::from(&config.output.base_dir);

        Ok(Self {
            config,
            store,
            checkpoint,
            ledgers,
            controller,
            ctx,
            base_dir,
        })
    }

    pub fn checkpoint(&self) -> &Checkpoint {
        &self.checkpoint
    }

    pub fn ledgers(&self) -> &Ledgers {
        &self.ledgers
    }

    /// Reads the configured queue file and runs it
    ///
    /// An unreadable queue is fatal; the checkpoint is saved before the
    /// error is returned.
    pub async fn run_from_input(&mut self, shutdown: Shutdown) -> Result<RunSummary, HarvestError> {
        let path = PathBuf::from(&self.config.input.urls_path);
        let queue = match load_queue(&path) {
            Ok(queue) => queue,
            Err(e) => {
                error!("Fatal error: cannot read queue {}: {}", path.display(), e);
                self.store.save(&self.checkpoint);
                return Err(e.into());
            }
        };

        info!("Loaded {} entries from {}", queue.len(), path.display());
        Ok(self.run(&queue, shutdown).await)
    }

    /// Processes `queue` from the checkpoint's cursor to the end
    pub async fn run(&mut self, queue: &[QueueEntry], mut shutdown: Shutdown) -> RunSummary {
        let start = self.checkpoint.current_index();
        let mut summary = RunSummary::new(queue.len(), start);
        let mut interrupted = false;

        if start > queue.len() {
            warn!(
                "Checkpoint cursor {} is past the end of a {}-entry queue",
                start,
                queue.len()
            );
        } else if start > 0 {
            info!("Resuming at entry {} of {}", start, queue.len());
        }

        for (index, entry) in queue.iter().enumerate().skip(start) {
            if shutdown.is_triggered() {
                interrupted = true;
                break;
            }

            self.checkpoint.advance_to(index);

            let outcome = tokio::select! {
                biased;
                _ = shutdown.triggered() => None,
                outcome = self.process_entry(entry) => Some(outcome),
            };

            let Some(outcome) = outcome else {
                info!("Stopping before {} finished", entry.url);
                interrupted = true;
                break;
            };

            summary.record(&outcome);
        }

        if !interrupted {
            self.checkpoint.advance_to(queue.len());
        }

        self.controller.close().await;
        self.store.save(&self.checkpoint);
        summary.finish(&self.checkpoint, interrupted);

        info!(
            "Completed with {} blocked domains",
            self.checkpoint.blocked_count()
        );
        summary
    }

    /// Handles one entry and records its outcome
    async fn process_entry(&mut self, entry: &QueueEntry) -> EntryOutcome {
        if self.checkpoint.is_processed(&entry.url) {
            debug!("Skipping already processed {}", entry.url);
            return EntryOutcome::AlreadyProcessed;
        }

        let outcome = self.resolve_entry(entry).await;
        self.finish_entry(entry, &outcome);
        outcome
    }

    async fn resolve_entry(&mut self, entry: &QueueEntry) -> EntryOutcome {
        let dest_dir = self.base_dir.join(sanitize_label(&entry.label));
        if let Err(e) = tokio::fs::create_dir_all(&dest_dir).await {
            error!("Cannot create {}: {}", dest_dir.display(), e);
            return EntryOutcome::Rejected {
                reason: format!("Cannot create directory {}: {}", dest_dir.display(), e),
            };
        }

        if let Some(literal) = self.config.literal_for(&entry.label).cloned() {
            return write_literal(&literal, &dest_dir).await;
        }

        let url = amend_url(&entry.url, self.config.rules.document_domain.as_deref());
        let domain = match domain_of(&url) {
            Ok(domain) => domain,
            Err(e) => {
                warn!("Invalid URL for {}: {}", entry.label, e);
                return EntryOutcome::Rejected {
                    reason: format!("Invalid URL: {}", e),
                };
            }
        };

        if self.checkpoint.is_blocked(&domain) {
            info!("Skipping blocked domain {} ({})", domain, entry.label);
            return EntryOutcome::BlockedDomain;
        }

        info!("Processing {} - {}", entry.label, url);

        let job = EntryJob {
            label: &entry.label,
            url: &url,
            domain: &domain,
            dest_dir: &dest_dir,
        };
        self.controller
            .run_entry(&job, &mut self.ctx, &mut self.ledgers)
            .await
    }

    /// Applies an outcome to the ledgers and the checkpoint, then saves
    fn finish_entry(&mut self, entry: &QueueEntry, outcome: &EntryOutcome) {
        let url = amend_url(&entry.url, self.config.rules.document_domain.as_deref());

        match outcome {
            EntryOutcome::Succeeded { outlier: true, .. } => {
                self.ledgers.record_outlier(&entry.label, &url);
            }
            EntryOutcome::ChallengeBlocked { domain } => {
                if self.checkpoint.block_domain(domain) {
                    info!("Added {} to blocked domains", domain);
                }
                self.ledgers
                    .record_failure(&entry.label, &url, "Cloudflare protection detected");
            }
            EntryOutcome::BlockedDomain => {
                self.ledgers
                    .record_failure(&entry.label, &url, "Blocked domain");
            }
            EntryOutcome::Exhausted { .. } => {
                error!("Max retries exceeded for {}", url);
                self.ledgers
                    .record_failure(&entry.label, &url, "Max retries exceeded");
            }
            EntryOutcome::Rejected { reason } => {
                self.ledgers.record_failure(&entry.label, &entry.url, reason);
            }
            EntryOutcome::Succeeded { .. }
            | EntryOutcome::Literal
            | EntryOutcome::AlreadyProcessed => {}
        }

        if outcome.marks_processed() {
            self.checkpoint.mark_processed(&entry.url);
            self.store.save(&self.checkpoint);
        }
    }
}

/// Writes a configured literal artifact into the label's directory
async fn write_literal(literal: &LiteralEntry, dest_dir: &Path) -> EntryOutcome {
    let path = dest_dir.join(&literal.file_name);
    match tokio::fs::write(&path, literal.content.as_bytes()).await {
        Ok(()) => {
            info!("Saved {} content to {}", literal.label, path.display());
            EntryOutcome::Literal
        }
        Err(e) => {
            error!("Cannot write {}: {}", path.display(), e);
            EntryOutcome::Rejected {
                reason: format!("Cannot write {}: {}", path.display(), e),
            }
        }
    }
}
