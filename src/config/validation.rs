use crate::config::types::{Config, CrawlerConfig, FetcherKind, LiteralEntry, OutputConfig};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_output_config(&config.output)?;
    validate_literals(&config.literals)?;

    if config.input.urls_path.is_empty() {
        return Err(ConfigError::Validation(
            "urls_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    validate_range(
        "rate_limit",
        config.rate_limit_min_ms,
        config.rate_limit_max_ms,
    )?;
    validate_range(
        "retry_backoff",
        config.retry_backoff_min_ms,
        config.retry_backoff_max_ms,
    )?;
    validate_range(
        "download_backoff",
        config.download_backoff_min_ms,
        config.download_backoff_max_ms,
    )?;

    if config.max_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be >= 1, got {}",
            config.max_retries
        )));
    }

    if config.download_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "download_attempts must be >= 1, got {}",
            config.download_attempts
        )));
    }

    if config.link_volume_threshold < 1 {
        return Err(ConfigError::Validation(
            "link_volume_threshold must be >= 1".to_string(),
        ));
    }

    if config.request_timeout_secs < 1 || config.page_load_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeouts must be at least one second".to_string(),
        ));
    }

    if config.fetcher == FetcherKind::Browser && !cfg!(feature = "browser") {
        return Err(ConfigError::Validation(
            "fetcher = \"browser\" requires building with the `browser` feature".to_string(),
        ));
    }

    Ok(())
}

fn validate_range(name: &str, min: u64, max: u64) -> Result<(), ConfigError> {
    if min > max {
        return Err(ConfigError::Validation(format!(
            "{}_min_ms ({}) must not exceed {}_max_ms ({})",
            name, min, name, max
        )));
    }
    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    let required = [
        ("base_dir", &config.base_dir),
        ("checkpoint_path", &config.checkpoint_path),
        ("outliers_path", &config.outliers_path),
        ("failures_path", &config.failures_path),
    ];

    for (name, value) in required {
        if value.is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    Ok(())
}

/// Literal artifacts are written under the label directory, so the file name
/// must be a single path component
fn validate_literals(literals: &[LiteralEntry]) -> Result<(), ConfigError> {
    for entry in literals {
        if entry.label.trim().is_empty() {
            return Err(ConfigError::Validation(
                "literal label cannot be empty".to_string(),
            ));
        }

        let name = &entry.file_name;
        if name.is_empty() || name.contains('/') || name.contains('\\') || name == ".." {
            return Err(ConfigError::Validation(format!(
                "literal file_name '{}' must be a plain file name",
                name
            )));
        }
    }

    Ok(())
}
