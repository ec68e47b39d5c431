//! Storage module for persisting crawl progress and outcomes
//!
//! This module handles all file-backed state for the harvester:
//! - The JSON checkpoint (processed URLs, blocked domains, cursor)
//! - The outlier and failure CSV ledgers
//! - Reading the `label,url` queue

mod checkpoint_store;
mod ledger;
mod queue;
mod traits;

pub use checkpoint_store::CheckpointStore;
pub use ledger::{Ledger, Ledgers};
pub use queue::{load_queue, parse_queue, QueueEntry};
pub use traits::{StorageError, StorageResult};
