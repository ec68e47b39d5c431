//! Per-entry retry and backoff
//!
//! Each entry moves through [`EntryState`]: an attempt either succeeds,
//! hits a challenge (terminal, never retried), or fails softly. A soft
//! failure tears down the fetcher session and, while budget remains, waits
//! a random backoff before the next attempt.
//!
//! Failures of individual links found on a page are written to the failure
//! ledger and do not fail the entry.

use super::challenge::ChallengeDetector;
use super::classifier::{LinkClassifier, LinkKind};
use super::context::HarvestContext;
use super::fetcher::{Fetcher, FetcherFactory};
use super::parser::extract_hrefs;
use super::rate_limiter::random_delay;
use crate::config::Config;
use crate::persist::{persist_document, persist_page, PersistError, PersistOutcome};
use crate::state::{EntryOutcome, EntryState};
use crate::storage::Ledgers;
use crate::url::has_pdf_extension;
use rand::seq::SliceRandom;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, trace, warn};

/// One entry as the controller sees it
#[derive(Debug, Clone)]
pub struct EntryJob<'a> {
    pub label: &'a str,
    /// URL after document-domain amendment
    pub url: &'a str,
    /// Normalized domain of `url`
    pub domain: &'a str,
    pub dest_dir: &'a Path,
}

/// Why a single attempt did not succeed
#[derive(Debug, Error)]
enum AttemptError {
    #[error("challenge detected on {domain}")]
    Blocked { domain: String },

    #[error("{0}")]
    Transient(String),
}

impl From<PersistError> for AttemptError {
    fn from(e: PersistError) -> Self {
        AttemptError::Transient(e.to_string())
    }
}

/// What a successful attempt produced
#[derive(Debug, Default)]
struct AttemptReport {
    reduced: bool,
    link_failures: usize,
}

/// Drives one entry at a time through its attempts
pub struct RetryController {
    factory: Box<dyn FetcherFactory>,
    fetcher: Option<Box<dyn Fetcher>>,
    detector: ChallengeDetector,
    classifier: LinkClassifier,
    max_retries: u32,
    backoff: (Duration, Duration),
    rotation_every: u32,
    rotation_pool: Vec<String>,
    page_fetches: u64,
}

impl RetryController {
    pub fn new(config: &Config, factory: Box<dyn FetcherFactory>) -> Self {
        Self {
            factory,
            fetcher: None,
            detector: ChallengeDetector::new(config.crawler.challenge_grace()),
            classifier: LinkClassifier::from_config(&config.crawler, &config.rules),
            max_retries: config.crawler.max_retries.max(1),
            backoff: config.crawler.retry_backoff_range(),
            rotation_every: config.crawler.user_agent_rotation,
            rotation_pool: config.user_agent.rotation_pool.clone(),
            page_fetches: 0,
        }
    }

    /// Number of listing page fetches attempted so far
    pub fn page_fetches(&self) -> u64 {
        self.page_fetches
    }

    /// Runs attempts for one entry until it resolves
    pub async fn run_entry(
        &mut self,
        job: &EntryJob<'_>,
        ctx: &mut HarvestContext,
        ledgers: &mut Ledgers,
    ) -> EntryOutcome {
        let mut state = EntryState::Idle;
        let mut attempts = 0u32;

        loop {
            transition(&mut state, EntryState::Attempting, job.url);
            attempts += 1;

            match self.attempt(job, ctx, ledgers).await {
                Ok(report) => {
                    transition(&mut state, EntryState::Success, job.url);
                    return EntryOutcome::Succeeded {
                        outlier: report.reduced,
                        link_failures: report.link_failures,
                    };
                }
                Err(AttemptError::Blocked { domain }) => {
                    transition(&mut state, EntryState::HardBlock, job.url);
                    warn!("Cloudflare protection detected. Blocking domain {}", domain);
                    return EntryOutcome::ChallengeBlocked { domain };
                }
                Err(AttemptError::Transient(reason)) => {
                    transition(&mut state, EntryState::SoftFail, job.url);
                    warn!(
                        "Attempt {}/{} for {} failed: {}",
                        attempts, self.max_retries, job.url, reason
                    );
                    self.teardown().await;

                    if attempts >= self.max_retries {
                        transition(&mut state, EntryState::Exhausted, job.url);
                        return EntryOutcome::Exhausted { attempts };
                    }

                    let delay = random_delay(self.backoff);
                    debug!("Backing off {:?} before retrying {}", delay, job.url);
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Closes the active fetcher session, if any
    pub async fn close(&mut self) {
        self.teardown().await;
    }

    async fn teardown(&mut self) {
        if let Some(mut fetcher) = self.fetcher.take() {
            debug!("Closing {} fetcher", fetcher.name());
            fetcher.close().await;
        }
    }

    async fn attempt(
        &mut self,
        job: &EntryJob<'_>,
        ctx: &mut HarvestContext,
        ledgers: &mut Ledgers,
    ) -> Result<AttemptReport, AttemptError> {
        if has_pdf_extension(job.url) {
            persist_document(ctx, job.url, job.dest_dir).await?;
            return Ok(AttemptReport::default());
        }

        if ctx.is_document_domain(job.domain) {
            persist_page(ctx, job.url, job.dest_dir).await?;
            return Ok(AttemptReport::default());
        }

        self.crawl_listing(job, ctx, ledgers).await
    }

    /// Fetches a listing page and persists what it links to
    async fn crawl_listing(
        &mut self,
        job: &EntryJob<'_>,
        ctx: &mut HarvestContext,
        ledgers: &mut Ledgers,
    ) -> Result<AttemptReport, AttemptError> {
        self.ensure_fetcher().await?;
        self.count_page_fetch().await;

        let fetcher = self
            .fetcher
            .as_mut()
            .ok_or_else(|| AttemptError::Transient("fetcher unavailable".to_string()))?;

        ctx.rate_limiter.wait(job.domain).await;
        let page = fetcher
            .fetch(job.url)
            .await
            .map_err(|e| AttemptError::Transient(e.to_string()))?;

        if self.detector.is_blocked(&page, &mut **fetcher).await {
            return Err(AttemptError::Blocked {
                domain: job.domain.to_string(),
            });
        }
        if let Some(e) = page.status_error() {
            return Err(AttemptError::Transient(e.to_string()));
        }

        let hrefs = extract_hrefs(&page.body);
        let links = self.classifier.classify(&page.url, &hrefs);
        if links.reduced {
            info!(
                "Over {} links found on {}, keeping {} documents",
                links.discovered,
                job.url,
                links.pdf_count()
            );
        }
        info!("Found {} links on {}", links.links.len(), job.url);

        let mut report = AttemptReport {
            reduced: links.reduced,
            link_failures: 0,
        };

        for link in &links.links {
            let result = match link.kind {
                LinkKind::Pdf => persist_document(ctx, &link.url, job.dest_dir).await,
                LinkKind::Html => persist_page(ctx, &link.url, job.dest_dir).await,
            };

            match result {
                Ok(PersistOutcome::Written(path)) => trace!("Wrote {}", path.display()),
                Ok(PersistOutcome::Skipped(_)) => {}
                Err(e) => {
                    warn!("Failed to persist {}: {}", link.url, e);
                    ledgers.record_failure(job.label, &link.url, &e.to_string());
                    report.link_failures += 1;
                }
            }
        }

        Ok(report)
    }

    async fn ensure_fetcher(&mut self) -> Result<(), AttemptError> {
        if self.fetcher.is_none() {
            let fetcher = self
                .factory
                .create()
                .await
                .map_err(|e| AttemptError::Transient(format!("failed to start fetcher: {}", e)))?;
            debug!("Started {} fetcher", fetcher.name());
            self.fetcher = Some(fetcher);
        }
        Ok(())
    }

    /// Counts a page fetch, switching user-agent on every N-th one
    async fn count_page_fetch(&mut self) {
        self.page_fetches += 1;
        if self.rotation_every == 0 || self.page_fetches % u64::from(self.rotation_every) != 0 {
            return;
        }

        let user_agent = {
            let mut rng = rand::thread_rng();
            self.rotation_pool.choose(&mut rng).cloned()
        };
        let Some(user_agent) = user_agent else {
            return;
        };

        if let Some(fetcher) = self.fetcher.as_mut() {
            match fetcher.set_user_agent(&user_agent).await {
                Ok(()) => debug!("Rotated user-agent to {}", user_agent),
                Err(e) => warn!("Failed to rotate user-agent: {}", e),
            }
        }
    }
}

fn transition(state: &mut EntryState, next: EntryState, url: &str) {
    debug_assert!(
        state.can_transition_to(next),
        "invalid transition {} -> {}",
        state,
        next
    );
    trace!("{}: {} -> {}", url, state, next);
    *state = next;
}
