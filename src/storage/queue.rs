//! Queue input: a two-column `label,url` CSV file

use crate::storage::{StorageError, StorageResult};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// One unit of work; its position in the input list is the durable cursor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub label: String,
    pub url: String,
}

impl QueueEntry {
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
        }
    }
}

/// Reads the queue from a CSV file
///
/// Fails only if the file cannot be opened; individual rows that do not
/// have exactly two columns are skipped.
pub fn load_queue(path: &Path) -> StorageResult<Vec<QueueEntry>> {
    let file = File::open(path).map_err(|e| StorageError::io(path, e))?;
    Ok(parse_queue(file))
}

/// Parses queue rows from any reader
///
/// There is no header row. Cells are trimmed. Rows with the wrong number of
/// columns, or that fail to decode, are skipped.
pub fn parse_queue<R: Read>(reader: R) -> Vec<QueueEntry> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut entries = Vec::new();
    for (line, result) in csv_reader.records().enumerate() {
        match result {
            Ok(record) if record.len() == 2 => {
                entries.push(QueueEntry::new(&record[0], &record[1]));
            }
            Ok(record) => {
                debug!(
                    "Skipping row {} with {} columns",
                    line + 1,
                    record.len()
                );
            }
            Err(e) => {
                debug!("Skipping unreadable row {}: {}", line + 1, e);
            }
        }
    }

    entries
}
