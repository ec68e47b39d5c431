//! Shared request context
//!
//! Everything that issues requests borrows this: the HTTP client for
//! documents and content pages, the per-domain rate limiter, and the
//! settings that shape persistence.

use super::fetcher::build_http_client;
use super::rate_limiter::RateLimiter;
use crate::config::{Config, CrawlerConfig, RulesConfig};
use reqwest::Client;
use std::time::Duration;

pub struct HarvestContext {
    pub client: Client,
    pub rate_limiter: RateLimiter,
    pub crawler: CrawlerConfig,
    pub rules: RulesConfig,
}

impl HarvestContext {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            rate_limiter: RateLimiter::from_config(&config.crawler),
            crawler: config.crawler.clone(),
            rules: config.rules.clone(),
        }
    }

    /// Builds the context with a client configured from `config`
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let client = build_http_client(
            &config.user_agent,
            Duration::from_secs(config.crawler.request_timeout_secs),
        )?;
        Ok(Self::new(client, config))
    }

    /// True if `domain` is the code-library domain
    pub fn is_document_domain(&self, domain: &str) -> bool {
        self.rules
            .document_domain
            .as_deref()
            .map(|d| d.eq_ignore_ascii_case(domain))
            .unwrap_or(false)
    }
}
