//! Doc-Harvest: a resumable, polite document collector
//!
//! This crate walks an ordered list of `(label, url)` entries, downloads the
//! documents and pages each entry points at, and survives interruption by
//! checkpointing progress. Domains that answer with a bot-defense challenge
//! are blocklisted instead of being retried.

pub mod config;
pub mod crawler;
pub mod output;
pub mod persist;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Doc-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("Persist error: {0}")]
    Persist(#[from] persist::PersistError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Missing domain in URL: {0}")]
    MissingDomain(String),

    #[error("No file name can be derived from URL: {0}")]
    NoFileName(String),
}

/// Result type alias for Doc-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, Shutdown};
pub use output::RunSummary;
pub use state::{Checkpoint, EntryOutcome};
pub use crate::url::{amend_url, domain_of, extract_domain};
