//! Shared fixtures for integration tests

use async_trait::async_trait;
use doc_harvest::config::Config;
use doc_harvest::crawler::{FetchError, FetchedPage, Fetcher, FetcherFactory};
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// What the scripted fetcher does for one load of a URL
#[derive(Debug, Clone)]
pub enum Step {
    /// Serve this HTML
    Page(String),

    /// Serve `first`; a re-read after the grace wait sees `then`
    Interstitial { first: String, then: String },

    /// Fail the load
    Fail,

    /// Never finish loading
    Hang,
}

#[derive(Default)]
struct ScriptState {
    steps: Mutex<HashMap<String, VecDeque<Step>>>,
    fetches: AtomicUsize,
    sessions: AtomicUsize,
    closes: AtomicUsize,
    user_agents: Mutex<Vec<String>>,
}

/// Hands out fetchers that replay scripted steps per URL
///
/// A URL with no remaining steps fails with HTTP 404.
#[derive(Clone, Default)]
pub struct ScriptedFetcherFactory {
    state: Arc<ScriptState>,
}

impl ScriptedFetcherFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, url: &str, steps: Vec<Step>) -> &Self {
        self.state
            .steps
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .extend(steps);
        self
    }

    pub fn boxed(&self) -> Box<dyn FetcherFactory> {
        Box::new(self.clone())
    }

    pub fn fetches(&self) -> usize {
        self.state.fetches.load(Ordering::SeqCst)
    }

    pub fn sessions(&self) -> usize {
        self.state.sessions.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.state.closes.load(Ordering::SeqCst)
    }

    pub fn user_agents(&self) -> Vec<String> {
        self.state.user_agents.lock().unwrap().clone()
    }
}

#[async_trait]
impl FetcherFactory for ScriptedFetcherFactory {
    async fn create(&self) -> Result<Box<dyn Fetcher>, FetchError> {
        self.state.sessions.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedFetcher {
            state: Arc::clone(&self.state),
            reread: None,
        }))
    }
}

struct ScriptedFetcher {
    state: Arc<ScriptState>,
    reread: Option<String>,
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&mut self, url: &str) -> Result<FetchedPage, FetchError> {
        self.state.fetches.fetch_add(1, Ordering::SeqCst);
        let step = self
            .state
            .steps
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(|steps| steps.pop_front());

        let page = |body: String| FetchedPage {
            url: url.to_string(),
            status: 200,
            body,
        };

        match step {
            Some(Step::Page(body)) => {
                self.reread = Some(body.clone());
                Ok(page(body))
            }
            Some(Step::Interstitial { first, then }) => {
                self.reread = Some(then);
                Ok(page(first))
            }
            Some(Step::Fail) => Err(FetchError::Browser("scripted failure".to_string())),
            Some(Step::Hang) => std::future::pending().await,
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }

    async fn current_body(&mut self) -> Result<String, FetchError> {
        self.reread.clone().ok_or(FetchError::NoPage)
    }

    async fn set_user_agent(&mut self, user_agent: &str) -> Result<(), FetchError> {
        self.state
            .user_agents
            .lock()
            .unwrap()
            .push(user_agent.to_string());
        Ok(())
    }

    async fn close(&mut self) {
        self.state.closes.fetch_add(1, Ordering::SeqCst);
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// A config writing everything under `dir` with all delays set to zero
pub fn test_config(dir: &Path) -> Config {
    let path = |name: &str| dir.join(name).to_string_lossy().to_string();

    let mut config = Config::default();
    config.crawler.rate_limit_min_ms = 0;
    config.crawler.rate_limit_max_ms = 0;
    config.crawler.retry_backoff_min_ms = 0;
    config.crawler.retry_backoff_max_ms = 0;
    config.crawler.download_backoff_min_ms = 0;
    config.crawler.download_backoff_max_ms = 0;
    config.crawler.challenge_grace_ms = 0;
    config.crawler.request_timeout_secs = 5;

    config.input.urls_path = path("urls.csv");
    config.output.base_dir = path("out");
    config.output.checkpoint_path = path("state.json");
    config.output.outliers_path = path("outliers.csv");
    config.output.failures_path = path("failed.csv");
    config
}

/// Ledger rows without the header
pub fn ledger_rows(path: &str) -> Vec<Vec<String>> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    reader
        .records()
        .map(|record| record.unwrap().iter().map(str::to_string).collect())
        .collect()
}

/// A listing page linking to each of `hrefs`
pub fn listing(hrefs: &[String]) -> String {
    let anchors: String = hrefs
        .iter()
        .map(|href| format!("<li><a href=\"{}\">link</a></li>\n", href))
        .collect();
    format!(
        "<html><head><title>Town Clerk</title></head><body><ul>\n{}</ul></body></html>",
        anchors
    )
}
