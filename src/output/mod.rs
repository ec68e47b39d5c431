//! Output module for run summaries and reports
//!
//! This module handles:
//! - Counting entry outcomes over a run
//! - Printing run and checkpoint statistics
//! - Writing the optional markdown run report

mod markdown;
pub mod stats;

pub use markdown::{format_markdown_summary, write_markdown_summary};
pub use stats::{print_checkpoint, print_summary, RunSummary};
