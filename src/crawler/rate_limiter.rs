//! Per-domain request spacing
//!
//! Before every outbound request to a domain the limiter draws a target gap
//! uniformly from the configured range and sleeps for whatever part of it
//! has not elapsed since the previous request to that domain. The first
//! request to a domain goes out immediately.
//!
//! Timestamps live in memory only and are rebuilt each run.

use crate::config::CrawlerConfig;
use rand::Rng;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;

/// Draws a delay uniformly from an inclusive range
pub fn random_delay(range: (Duration, Duration)) -> Duration {
    let (min, max) = range;
    if max <= min {
        return min;
    }
    let millis = rand::thread_rng().gen_range(min.as_millis() as u64..=max.as_millis() as u64);
    Duration::from_millis(millis)
}

/// Tracks the last request time per domain
#[derive(Debug, Clone)]
pub struct RateLimiter {
    min_delay: Duration,
    max_delay: Duration,
    last_request: HashMap<String, Instant>,
}

impl RateLimiter {
    /// Creates a limiter that spaces requests by `min_delay..=max_delay`
    pub fn new(min_delay: Duration, max_delay: Duration) -> Self {
        Self {
            min_delay,
            max_delay,
            last_request: HashMap::new(),
        }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        let (min, max) = config.rate_limit_range();
        Self::new(min, max)
    }

    /// Waits until a request to `domain` is allowed, then records it
    ///
    /// Returns how long this call slept.
    pub async fn wait(&mut self, domain: &str) -> Duration {
        let target = random_delay((self.min_delay, self.max_delay));
        let wait = self
            .time_until_ready(domain, target, Instant::now())
            .unwrap_or(Duration::ZERO);

        if !wait.is_zero() {
            trace!("Rate limiting {} for {:?}", domain, wait);
            tokio::time::sleep(wait).await;
        }

        self.record_request(domain, Instant::now());
        wait
    }

    /// Time left before `target` has passed since the last request
    ///
    /// Returns None if the domain has no prior request or the gap has
    /// already elapsed.
    pub fn time_until_ready(&self, domain: &str, target: Duration, now: Instant) -> Option<Duration> {
        let last = self.last_request.get(domain)?;
        let elapsed = now.saturating_duration_since(*last);
        if elapsed < target {
            Some(target - elapsed)
        } else {
            None
        }
    }

    /// Records that a request was made to a domain
    pub fn record_request(&mut self, domain: &str, now: Instant) {
        self.last_request.insert(domain.to_string(), now);
    }

    pub fn last_request(&self, domain: &str) -> Option<Instant> {
        self.last_request.get(domain).copied()
    }

    /// Number of domains with a recorded request
    pub fn tracked_domains(&self) -> usize {
        self.last_request.len()
    }
}
