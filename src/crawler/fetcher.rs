//! Page fetching
//!
//! Listing pages are loaded through a [`Fetcher`]: something that can load a
//! URL, hand back the rendered HTML, and re-read the current page after a
//! wait. The default implementation is plain HTTP via reqwest; a headless
//! browser implementation lives behind the `browser` feature.
//!
//! Fetchers are created lazily through a [`FetcherFactory`] so a failed
//! attempt can throw away its session and start clean.

use crate::config::{Config, FetcherKind, UserAgentConfig};
use crate::ConfigError;
use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Errors raised while loading a page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("No page has been loaded")]
    NoPage,
}

impl FetchError {
    fn from_reqwest(url: &str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else {
            FetchError::Http {
                url: url.to_string(),
                source,
            }
        }
    }
}

/// A loaded page
///
/// Error statuses still carry their body: challenge pages are usually
/// served as 403 or 503 and must reach the challenge check.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub url: String,

    /// HTTP status, 200 when the fetcher cannot observe one
    pub status: u16,

    /// Rendered HTML
    pub body: String,
}

impl FetchedPage {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The error to report when the status is not a success
    pub fn status_error(&self) -> Option<FetchError> {
        if self.is_success() {
            None
        } else {
            Some(FetchError::Status {
                url: self.url.clone(),
                status: self.status,
            })
        }
    }
}

/// Loads listing pages
#[async_trait]
pub trait Fetcher: Send {
    /// Loads a URL and returns its rendered HTML
    ///
    /// A response with an error status is still a page; only transport
    /// failures are errors.
    async fn fetch(&mut self, url: &str) -> Result<FetchedPage, FetchError>;

    /// Re-reads the HTML of the most recently loaded page
    ///
    /// A browser returns whatever the page has become since it loaded, which
    /// is how an interstitial that clears itself is observed. Static fetchers
    /// return the body they already have.
    async fn current_body(&mut self) -> Result<String, FetchError>;

    /// Changes the user-agent sent on subsequent loads
    async fn set_user_agent(&mut self, user_agent: &str) -> Result<(), FetchError>;

    /// Releases the session
    async fn close(&mut self);

    fn name(&self) -> &'static str;
}

/// Creates fresh fetcher sessions
#[async_trait]
pub trait FetcherFactory: Send + Sync {
    async fn create(&self) -> Result<Box<dyn Fetcher>, FetchError>;
}

/// Builds the shared HTTP client
///
/// The default user-agent identifies the harvester and how to reach its
/// operator: `Name/Version (+ContactURL; ContactEmail)`.
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(timeout)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Plain HTTP fetcher
pub struct HttpFetcher {
    client: Client,
    user_agent: Option<String>,
    last_page: Option<FetchedPage>,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            user_agent: None,
            last_page: None,
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&mut self, url: &str) -> Result<FetchedPage, FetchError> {
        let mut request = self.client.get(url);
        if let Some(user_agent) = &self.user_agent {
            request = request.header(USER_AGENT, user_agent.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        debug!("Fetched {} [{}] ({} bytes)", final_url, status, body.len());

        let page = FetchedPage {
            url: final_url,
            status,
            body,
        };
        self.last_page = Some(page.clone());
        Ok(page)
    }

    async fn current_body(&mut self) -> Result<String, FetchError> {
        self.last_page
            .as_ref()
            .map(|page| page.body.clone())
            .ok_or(FetchError::NoPage)
    }

    async fn set_user_agent(&mut self, user_agent: &str) -> Result<(), FetchError> {
        self.user_agent = Some(user_agent.to_string());
        Ok(())
    }

    async fn close(&mut self) {
        self.last_page = None;
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Hands out [`HttpFetcher`]s sharing one connection pool
#[derive(Debug, Clone)]
pub struct HttpFetcherFactory {
    client: Client,
}

impl HttpFetcherFactory {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FetcherFactory for HttpFetcherFactory {
    async fn create(&self) -> Result<Box<dyn Fetcher>, FetchError> {
        Ok(Box::new(HttpFetcher::new(self.client.clone())))
    }
}

/// Picks the fetcher implementation named in the configuration
pub fn build_fetcher_factory(
    config: &Config,
    client: Client,
) -> Result<Box<dyn FetcherFactory>, ConfigError> {
    match config.crawler.fetcher {
        FetcherKind::Http => Ok(Box::new(HttpFetcherFactory::new(client))),
        #[cfg(feature = "browser")]
        FetcherKind::Browser => Ok(Box::new(super::browser::BrowserFetcherFactory::new(
            Duration::from_secs(config.crawler.page_load_timeout_secs),
        ))),
        #[cfg(not(feature = "browser"))]
        FetcherKind::Browser => {
            let _ = client;
            Err(ConfigError::Validation(
                "crawler.fetcher = \"browser\" requires the `browser` feature".to_string(),
            ))
        }
    }
}
