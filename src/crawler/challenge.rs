//! Bot-defense challenge detection
//!
//! A page is treated as blocked when it carries a known challenge marker,
//! or when it shows a "checking your browser" interstitial that has not
//! cleared after a grace period. Anything that goes wrong while inspecting
//! the page counts as blocked.

use super::fetcher::{FetchedPage, Fetcher};
use scraper::{Html, Node, Selector};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Elements that only appear on challenge pages
const CHALLENGE_SELECTORS: &[&str] = &["#cf-challenge-wrap", ".cf-error-title"];

/// Text that marks a challenge page wherever it appears in visible text
const CHALLENGE_TEXT: &str = "Cloudflare";

/// Interstitial phrase, matched case-insensitively against the raw HTML
const INTERSTITIAL_PHRASE: &str = "checking your browser";

/// What a single inspection of a page found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeSignal {
    /// Nothing suspicious
    Clear,

    /// A challenge marker is present
    Marker(&'static str),

    /// A wait-and-see interstitial is showing
    Interstitial,
}

/// Inspects HTML for challenge markers
pub fn inspect(html: &str) -> ChallengeSignal {
    let document = Html::parse_document(html);

    for &css in CHALLENGE_SELECTORS {
        match Selector::parse(css) {
            Ok(selector) => {
                if document.select(&selector).next().is_some() {
                    return ChallengeSignal::Marker(css);
                }
            }
            Err(_) => return ChallengeSignal::Marker(css),
        }
    }

    if has_visible_text(&document, CHALLENGE_TEXT) {
        return ChallengeSignal::Marker(CHALLENGE_TEXT);
    }

    if html.to_lowercase().contains(INTERSTITIAL_PHRASE) {
        return ChallengeSignal::Interstitial;
    }

    ChallengeSignal::Clear
}

/// True if any text node outside `<script>`/`<style>` contains `needle`
fn has_visible_text(document: &Html, needle: &str) -> bool {
    document.tree.nodes().any(|node| {
        let Node::Text(text) = node.value() else {
            return false;
        };
        if !text.contains(needle) {
            return false;
        }
        let hidden = node
            .parent()
            .and_then(|parent| parent.value().as_element().map(|el| el.name()))
            .map(|name| name == "script" || name == "style")
            .unwrap_or(false);
        !hidden
    })
}

/// Decides whether a loaded page is a challenge
#[derive(Debug, Clone)]
pub struct ChallengeDetector {
    grace: Duration,
}

impl ChallengeDetector {
    pub fn new(grace: Duration) -> Self {
        Self { grace }
    }

    /// Returns true if the page is a challenge
    ///
    /// An interstitial gets one grace wait, after which the fetcher's
    /// current page is inspected again. Failing to re-read the page counts
    /// as blocked.
    pub async fn is_blocked(&self, page: &FetchedPage, fetcher: &mut dyn Fetcher) -> bool {
        match inspect(&page.body) {
            ChallengeSignal::Clear => false,
            ChallengeSignal::Marker(marker) => {
                warn!("Challenge marker {:?} found on {}", marker, page.url);
                true
            }
            ChallengeSignal::Interstitial => {
                info!(
                    "Interstitial on {}, waiting {:?} before re-checking",
                    page.url, self.grace
                );
                tokio::time::sleep(self.grace).await;

                let body = match fetcher.current_body().await {
                    Ok(body) => body,
                    Err(e) => {
                        warn!("Failed to re-read {}: {}", page.url, e);
                        return true;
                    }
                };

                match inspect(&body) {
                    ChallengeSignal::Clear => {
                        debug!("Interstitial on {} cleared", page.url);
                        false
                    }
                    signal => {
                        warn!("Challenge persists on {} ({:?})", page.url, signal);
                        true
                    }
                }
            }
        }
    }
}
