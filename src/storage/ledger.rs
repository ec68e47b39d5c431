//! Append-only CSV ledgers for outliers and failures
//!
//! Both files are truncated and given a header when a run starts. Each row
//! is flushed as soon as it is written so an interrupted run keeps every
//! record it produced.

use crate::storage::{StorageError, StorageResult};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::error;

const OUTLIER_HEADER: [&str; 2] = ["city", "url"];
const FAILURE_HEADER: [&str; 3] = ["city", "url", "error"];

/// One append-only CSV file
pub struct Ledger {
    path: PathBuf,
    writer: csv::Writer<File>,
    rows: usize,
}

impl Ledger {
    /// Creates (or truncates) the ledger and writes its header row
    pub fn create(path: impl Into<PathBuf>, header: &[&str]) -> StorageResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }

        let file = File::create(&path).map_err(|e| StorageError::io(&path, e))?;
        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(header)?;
        writer.flush().map_err(|e| StorageError::io(&path, e))?;

        Ok(Self {
            path,
            writer,
            rows: 0,
        })
    }

    /// Appends one row and flushes it
    pub fn append(&mut self, row: &[&str]) -> StorageResult<()> {
        self.writer.write_record(row)?;
        self.writer
            .flush()
            .map_err(|e| StorageError::io(&self.path, e))?;
        self.rows += 1;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rows appended since the ledger was created, header excluded
    pub fn rows(&self) -> usize {
        self.rows
    }
}

/// The outlier and failure ledgers of one run
pub struct Ledgers {
    outliers: Ledger,
    failures: Ledger,
}

impl Ledgers {
    /// Creates both ledgers, truncating any previous run's files
    pub fn create(outliers_path: &Path, failures_path: &Path) -> StorageResult<Self> {
        Ok(Self {
            outliers: Ledger::create(outliers_path, &OUTLIER_HEADER)?,
            failures: Ledger::create(failures_path, &FAILURE_HEADER)?,
        })
    }

    /// Records an entry whose links were reduced to documents only
    pub fn record_outlier(&mut self, label: &str, url: &str) {
        if let Err(e) = self.outliers.append(&[label, url]) {
            error!(
                "Failed to write outlier row ({}, {}) to {}: {}",
                label,
                url,
                self.outliers.path().display(),
                e
            );
        }
    }

    /// Records a failed entry or link
    pub fn record_failure(&mut self, label: &str, url: &str, reason: &str) {
        if let Err(e) = self.failures.append(&[label, url, reason]) {
            error!(
                "Failed to write failure row ({}, {}, {}) to {}: {}",
                label,
                url,
                reason,
                self.failures.path().display(),
                e
            );
        }
    }

    pub fn outlier_count(&self) -> usize {
        self.outliers.rows()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.rows()
    }
}
