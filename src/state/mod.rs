//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `Checkpoint`: processed URLs, blocked domains, and the queue cursor
//! - `EntryState`: where one queue entry is in its retry cycle
//! - `EntryOutcome`: how a queue entry ended

mod checkpoint;
mod entry_state;

// Re-export main types
pub use checkpoint::{Checkpoint, CheckpointRecord};
pub use entry_state::{EntryOutcome, EntryState};
