//! Fetching RSS feeds over HTTP.
//!
//! - [`FetchText`]: anything that can turn a URL into a response body
//! - [`HttpFetcher`]: the `reqwest` implementation
//! - [`RetryFetch`]: decorator adding exponential backoff with jitter
//!
//! Feed URLs come from the configuration, either listed directly or built
//! from Google News search queries with [`google_news_rss_url`].

use crate::config::FeedsConfig;
use crate::error::{DigestError, Result};
use rand::{Rng, rng};
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};

pub const GOOGLE_NEWS_RSS_BASE: &str = "https://news.google.com/rss/search";

/// Feed search URL for a Google News query in the given language and region.
///
/// ```
/// use story_digest::ingest::fetch::google_news_rss_url;
///
/// let url = google_news_rss_url("렌즈", "ko", "KR");
/// assert!(url.ends_with("&hl=ko&gl=KR&ceid=KR:ko"));
/// ```
pub fn google_news_rss_url(query: &str, language: &str, region: &str) -> String {
    format!(
        "{GOOGLE_NEWS_RSS_BASE}?q={}&hl={language}&gl={region}&ceid={region}:{language}",
        urlencoding::encode(query.trim())
    )
}

/// Every feed URL the configuration asks for: listed URLs first, then one
/// per non-blank query, without repeats.
pub fn configured_feed_urls(feeds: &FeedsConfig) -> Vec<String> {
    let listed = feeds.urls.iter().map(|u| u.trim().to_string());
    let queries = feeds
        .google_news_queries
        .iter()
        .filter(|q| !q.trim().is_empty())
        .map(|q| google_news_rss_url(q, &feeds.language, &feeds.region));

    let mut urls: Vec<String> = Vec::new();
    for url in listed.chain(queries) {
        if !url.is_empty() && !urls.contains(&url) {
            urls.push(url);
        }
    }
    urls
}

pub trait FetchText {
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Plain HTTP GET with a timeout and user agent.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(feeds: &FeedsConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(StdDuration::from_secs(feeds.timeout_secs))
            .user_agent(feeds.user_agent.as_str())
            .build()
            .map_err(|e| DigestError::http("<client>", e))?;
        Ok(Self { client })
    }
}

impl FetchText for HttpFetcher {
    #[instrument(level = "info", skip_all, fields(%url))]
    async fn fetch(&self, url: &str) -> Result<String> {
        let t0 = Instant::now();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| DigestError::http(url, e))?;
        let body = response.text().await.map_err(|e| DigestError::http(url, e))?;
        debug!(bytes = body.len(), elapsed_ms = t0.elapsed().as_millis(), "Fetched feed");
        Ok(body)
    }
}

/// Retries a [`FetchText`] with exponential backoff.
///
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..=max_jitter)
/// ```
pub struct RetryFetch<T> {
    inner: T,
    max_retries: u32,
    base_delay: StdDuration,
    max_delay: StdDuration,
    max_jitter_ms: u64,
}

impl<T: FetchText> RetryFetch<T> {
    pub fn new(inner: T, feeds: &FeedsConfig) -> Self {
        Self {
            inner,
            max_retries: feeds.max_retries,
            base_delay: StdDuration::from_millis(feeds.base_delay_ms),
            max_delay: StdDuration::from_secs(30),
            max_jitter_ms: feeds.max_jitter_ms,
        }
    }

    fn backoff(&self, attempt: u32) -> StdDuration {
        let exp = attempt.saturating_sub(1).min(16);
        let delay = self.base_delay.saturating_mul(1 << exp).min(self.max_delay);
        let jitter_ms: u64 = rng().random_range(0..=self.max_jitter_ms);
        delay + StdDuration::from_millis(jitter_ms)
    }
}

impl<T> fmt::Debug for RetryFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T: FetchText> FetchText for RetryFetch<T> {
    #[instrument(level = "info", skip_all, fields(%url))]
    async fn fetch(&self, url: &str) -> Result<String> {
        let total_t0 = Instant::now();
        let mut attempt = 0u32;

        loop {
            match self.inner.fetch(url).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    attempt += 1;
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_total = total_dt.as_millis(),
                            error = %e,
                            "fetch() exhausted retries"
                        );
                        return Err(e);
                    }

                    let delay = self.backoff(attempt);
                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_total = total_dt.as_millis(),
                        ?delay,
                        error = %e,
                        "fetch() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}
