//! Writing documents and pages to disk
//!
//! Both persisters are idempotent: if the target file already exists they
//! return [`PersistOutcome::Skipped`] without touching the network or the
//! rate limiter. Files are staged under a `.part` name and renamed into
//! place once complete.

mod document;
mod naming;
mod page;

pub use document::{document_file_name, persist_document};
pub use naming::{sanitize_folder_name, sanitize_label};
pub use page::{page_file_name, persist_page};

use crate::UrlError;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while persisting a document or page
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Download of {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No main content found at {url}")]
    NoContent { url: String },

    #[error("Markdown conversion failed for {url}: {message}")]
    Convert { url: String, message: String },

    #[error(transparent)]
    Url(#[from] UrlError),
}

impl PersistError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PersistError::Io {
            path: path.into(),
            source,
        }
    }
}

/// What a persist call did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    /// A new file was written
    Written(PathBuf),

    /// The file already existed
    Skipped(PathBuf),
}

impl PersistOutcome {
    pub fn path(&self) -> &Path {
        match self {
            PersistOutcome::Written(path) | PersistOutcome::Skipped(path) => path,
        }
    }

    pub fn was_written(&self) -> bool {
        matches!(self, PersistOutcome::Written(_))
    }
}

/// Staging name for a file still being written
pub(crate) fn part_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    path.with_file_name(name)
}

/// Writes `contents` to `path` via a `.part` file and rename
pub(crate) async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), PersistError> {
    let staging = part_path(path);
    tokio::fs::write(&staging, contents)
        .await
        .map_err(|e| PersistError::io(&staging, e))?;
    tokio::fs::rename(&staging, path)
        .await
        .map_err(|e| PersistError::io(path, e))
}
