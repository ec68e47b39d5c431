//! Durable crawl progress
//!
//! The in-memory [`Checkpoint`] uses set semantics; [`CheckpointRecord`] is
//! the on-disk shape with plain lists. Converting a record back into a
//! checkpoint deduplicates, so a hand-edited or legacy file with repeated
//! entries still loads cleanly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Snapshot of crawl progress: processed URLs, blocked domains, queue cursor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Checkpoint {
    processed_urls: HashSet<String>,
    blocked_domains: HashSet<String>,
    current_index: usize,
    saved_at: Option<DateTime<Utc>>,
}

/// Serialized form of a [`Checkpoint`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckpointRecord {
    #[serde(default)]
    pub processed_urls: Vec<String>,

    #[serde(default)]
    pub blocked_domains: Vec<String>,

    #[serde(default)]
    pub current_index: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl Checkpoint {
    /// Creates an empty checkpoint positioned at the start of the queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if this URL has reached a terminal outcome
    pub fn is_processed(&self, url: &str) -> bool {
        self.processed_urls.contains(url)
    }

    /// Marks a URL as processed; it will never be attempted again
    ///
    /// Returns true if the URL was not already recorded.
    pub fn mark_processed(&mut self, url: &str) -> bool {
        self.processed_urls.insert(url.to_string())
    }

    /// Returns true if network access to this domain is suspended
    pub fn is_blocked(&self, domain: &str) -> bool {
        self.blocked_domains.contains(domain)
    }

    /// Adds a domain to the blocklist
    ///
    /// Returns true if the domain was newly blocked.
    pub fn block_domain(&mut self, domain: &str) -> bool {
        self.blocked_domains.insert(domain.to_string())
    }

    /// Index of the queue entry the run is positioned at
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Moves the cursor forward
    ///
    /// The cursor never moves backwards: an index lower than the current one
    /// is ignored.
    pub fn advance_to(&mut self, index: usize) {
        if index > self.current_index {
            self.current_index = index;
        }
    }

    pub fn processed_count(&self) -> usize {
        self.processed_urls.len()
    }

    pub fn blocked_count(&self) -> usize {
        self.blocked_domains.len()
    }

    /// Blocked domains in sorted order
    pub fn blocked_domains(&self) -> Vec<String> {
        let mut domains: Vec<String> = self.blocked_domains.iter().cloned().collect();
        domains.sort();
        domains
    }

    /// When this checkpoint was last written, if it came from disk
    pub fn saved_at(&self) -> Option<DateTime<Utc>> {
        self.saved_at
    }

    /// Builds the serializable record, stamped with the current time
    ///
    /// Lists are sorted so consecutive snapshots diff cleanly.
    pub fn to_record(&self) -> CheckpointRecord {
        let mut processed_urls: Vec<String> = self.processed_urls.iter().cloned().collect();
        processed_urls.sort();

        CheckpointRecord {
            processed_urls,
            blocked_domains: self.blocked_domains(),
            current_index: self.current_index,
            saved_at: Some(Utc::now()),
        }
    }
}

impl From<CheckpointRecord> for Checkpoint {
    fn from(record: CheckpointRecord) -> Self {
        Self {
            processed_urls: record.processed_urls.into_iter().collect(),
            blocked_domains: record
                .blocked_domains
                .into_iter()
                .filter(|d| !d.is_empty())
                .collect(),
            current_index: record.current_index,
            saved_at: record.saved_at,
        }
    }
}
