//! Headless Chromium fetcher
//!
//! Runs pages through a real browser so script-rendered listings and
//! self-clearing interstitials behave the way they do for a visitor.
//! Automation fingerprints are suppressed at launch and per page.

use super::fetcher::{FetchError, FetchedPage, Fetcher, FetcherFactory};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetUserAgentOverrideParams;
use chromiumoxide::Page;
use futures_util::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

fn browser_error(e: impl std::fmt::Display) -> FetchError {
    FetchError::Browser(e.to_string())
}

/// One browser process with a single tab
pub struct BrowserFetcher {
    browser: Browser,
    handler: JoinHandle<()>,
    page: Page,
    load_timeout: Duration,
}

impl BrowserFetcher {
    /// Launches a headless browser with automation hints disabled
    pub async fn launch(load_timeout: Duration) -> Result<Self, FetchError> {
        let config = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-dev-shm-usage")
            .request_timeout(load_timeout)
            .build()
            .map_err(FetchError::Browser)?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(browser_error)?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler event error: {}", e);
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(browser_error)?;
        page.enable_stealth_mode().await.map_err(browser_error)?;

        Ok(Self {
            browser,
            handler,
            page,
            load_timeout,
        })
    }
}

#[async_trait]
impl Fetcher for BrowserFetcher {
    async fn fetch(&mut self, url: &str) -> Result<FetchedPage, FetchError> {
        let page = &self.page;
        let load = async {
            page.goto(url).await.map_err(browser_error)?;
            page.wait_for_navigation().await.map_err(browser_error)?;
            page.content().await.map_err(browser_error)
        };

        let body = tokio::time::timeout(self.load_timeout, load)
            .await
            .map_err(|_| FetchError::Timeout {
                url: url.to_string(),
            })??;

        let final_url = page
            .url()
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| url.to_string());

        debug!("Rendered {} ({} bytes)", final_url, body.len());
        Ok(FetchedPage {
            url: final_url,
            status: 200,
            body,
        })
    }

    async fn current_body(&mut self) -> Result<String, FetchError> {
        self.page.content().await.map_err(browser_error)
    }

    async fn set_user_agent(&mut self, user_agent: &str) -> Result<(), FetchError> {
        self.page
            .set_user_agent(SetUserAgentOverrideParams::new(user_agent))
            .await
            .map_err(browser_error)?;
        Ok(())
    }

    async fn close(&mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("Failed to close browser: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            debug!("Browser process did not exit cleanly: {}", e);
        }
        self.handler.abort();
    }

    fn name(&self) -> &'static str {
        "browser"
    }
}

/// Launches a new browser per session
#[derive(Debug, Clone)]
pub struct BrowserFetcherFactory {
    load_timeout: Duration,
}

impl BrowserFetcherFactory {
    pub fn new(load_timeout: Duration) -> Self {
        Self { load_timeout }
    }
}

#[async_trait]
impl FetcherFactory for BrowserFetcherFactory {
    async fn create(&self) -> Result<Box<dyn Fetcher>, FetchError> {
        Ok(Box::new(BrowserFetcher::launch(self.load_timeout).await?))
    }
}
