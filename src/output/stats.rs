//! Run statistics
//!
//! A [`RunSummary`] is filled in by the coordinator as entries resolve and
//! printed by the binary when the run ends.

use crate::state::{Checkpoint, EntryOutcome};
use chrono::{DateTime, Utc};

/// Counters for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    /// Entries in the queue
    pub total_entries: usize,

    /// Cursor position the run started from
    pub start_index: usize,

    /// Entries looked at this run, skipped ones included
    pub entries_seen: usize,

    /// Entries skipped because their URL was already processed
    pub already_processed: usize,

    pub succeeded: usize,
    pub literals: usize,

    /// Entries whose link set was reduced to documents
    pub outliers: usize,

    /// Entries that ended with a failure row
    pub failed: usize,

    /// Individual link failures on otherwise successful entries
    pub link_failures: usize,

    /// Domains blocklisted during this run
    pub newly_blocked: Vec<String>,

    /// Blocklist size at the end of the run
    pub blocked_domains: usize,

    /// Processed set size at the end of the run
    pub processed_total: usize,

    /// True if the run stopped early on a shutdown request
    pub interrupted: bool,
}

impl RunSummary {
    pub fn new(total_entries: usize, start_index: usize) -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            total_entries,
            start_index,
            entries_seen: 0,
            already_processed: 0,
            succeeded: 0,
            literals: 0,
            outliers: 0,
            failed: 0,
            link_failures: 0,
            newly_blocked: Vec::new(),
            blocked_domains: 0,
            processed_total: 0,
            interrupted: false,
        }
    }

    /// Counts one resolved entry
    pub fn record(&mut self, outcome: &EntryOutcome) {
        self.entries_seen += 1;
        match outcome {
            EntryOutcome::Succeeded {
                outlier,
                link_failures,
            } => {
                self.succeeded += 1;
                self.link_failures += link_failures;
                if *outlier {
                    self.outliers += 1;
                }
            }
            EntryOutcome::AlreadyProcessed => self.already_processed += 1,
            EntryOutcome::Literal => self.literals += 1,
            EntryOutcome::ChallengeBlocked { domain } => {
                self.failed += 1;
                self.newly_blocked.push(domain.clone());
            }
            EntryOutcome::BlockedDomain
            | EntryOutcome::Exhausted { .. }
            | EntryOutcome::Rejected { .. } => self.failed += 1,
        }
    }

    /// Stamps the end of the run with the checkpoint's final totals
    pub fn finish(&mut self, checkpoint: &Checkpoint, interrupted: bool) {
        self.finished_at = Some(Utc::now());
        self.blocked_domains = checkpoint.blocked_count();
        self.processed_total = checkpoint.processed_count();
        self.interrupted = interrupted;
    }

    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }

    /// Entries not yet reached; zero once the queue is done
    pub fn remaining(&self) -> usize {
        self.total_entries
            .saturating_sub(self.start_index + self.entries_seen)
    }
}

/// Prints a run summary to stdout
pub fn print_summary(summary: &RunSummary) {
    println!("=== Harvest Summary ===\n");

    if summary.interrupted {
        println!("Run interrupted; progress saved.\n");
    }

    println!("Queue:");
    println!("  Total entries: {}", summary.total_entries);
    println!("  Started at index: {}", summary.start_index);
    println!("  Entries seen: {}", summary.entries_seen);
    println!("  Remaining: {}", summary.remaining());
    println!();

    println!("Outcomes:");
    println!("  Succeeded: {}", summary.succeeded);
    println!("  Already processed: {}", summary.already_processed);
    println!("  Literal artifacts: {}", summary.literals);
    println!("  Outliers: {}", summary.outliers);
    println!("  Failed: {}", summary.failed);
    println!("  Link failures: {}", summary.link_failures);
    println!();

    if !summary.newly_blocked.is_empty() {
        println!("Newly Blocked Domains ({}):", summary.newly_blocked.len());
        for domain in &summary.newly_blocked {
            println!("  - {}", domain);
        }
        println!();
    }

    println!("Blocked domains in total: {}", summary.blocked_domains);
    if let Some(duration) = summary.duration_seconds() {
        println!("Duration: {} seconds", duration);
    }
}

/// Prints the stored checkpoint to stdout
pub fn print_checkpoint(checkpoint: &Checkpoint, total_entries: Option<usize>) {
    println!("=== Checkpoint ===\n");
    println!("  Processed URLs: {}", checkpoint.processed_count());
    match total_entries {
        Some(total) => println!("  Cursor: {} / {}", checkpoint.current_index(), total),
        None => println!("  Cursor: {}", checkpoint.current_index()),
    }
    match checkpoint.saved_at() {
        Some(saved_at) => println!("  Last saved: {}", saved_at.to_rfc3339()),
        None => println!("  Last saved: unknown"),
    }
    println!();

    let blocked = checkpoint.blocked_domains();
    println!("Blocked Domains ({}):", blocked.len());
    for domain in &blocked {
        println!("  - {}", domain);
    }
}
