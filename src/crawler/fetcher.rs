//! HTTP fetching with rate-limit backoff
//!
//! The wiki signals rate limiting with HTTP 403. That is flow control, not
//! an error: the fetcher sleeps and retries the same URL for as long as it
//! takes, so rate limiting never surfaces to the workers. Transport failures
//! do surface, and the calling worker decides to abandon the item.

use crate::config::CrawlerConfig;
use crate::TropemapError;
use rand::Rng;
use reqwest::{redirect::Policy, Client, Response, StatusCode};
use std::time::Duration;
use url::Url;

/// Builds the HTTP client shared by all workers
///
/// Redirects are handled manually by the page worker so that alias chains
/// can be observed hop by hop.
pub fn build_http_client(user_agent: &str) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::none())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Growing, jittered retry delay
///
/// Consecutive 403s back off further each time, and the jitter keeps many
/// workers that were limited together from retrying in lock-step.
#[derive(Debug, Clone)]
pub struct Backoff {
    base_ms: u64,
    max_ms: u64,
    jitter: bool,
}

impl Backoff {
    pub fn new(base_ms: u64, max_ms: u64) -> Self {
        Self {
            base_ms,
            max_ms,
            jitter: true,
        }
    }

    #[cfg(test)]
    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    pub fn delay(&self, attempt: u32) -> Duration {
        let doubled = self
            .base_ms
            .saturating_mul(2u64.saturating_pow(attempt.min(16)));
        let capped = doubled.min(self.max_ms);
        let jitter = if self.jitter {
            rand::thread_rng().gen_range(0..capped / 4 + 1)
        } else {
            0
        };
        Duration::from_millis(capped + jitter)
    }
}

/// Issues GET requests with transparent rate-limit handling
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    backoff: Backoff,
}

impl Fetcher {
    pub fn new(config: &CrawlerConfig) -> Result<Self, TropemapError> {
        let client = build_http_client(&config.user_agent)?;
        Ok(Self {
            client,
            backoff: Backoff::new(config.rate_limit_base_ms, config.rate_limit_max_ms),
        })
    }

    /// Performs one GET, retrying the same URL through any number of
    /// rate-limit responses
    pub async fn get(&self, url: &Url) -> crate::Result<Response> {
        let mut attempt: u32 = 0;
        loop {
            let response =
                self.client
                    .get(url.clone())
                    .send()
                    .await
                    .map_err(|source| TropemapError::Http {
                        url: url.to_string(),
                        source,
                    })?;

            if response.status() == StatusCode::FORBIDDEN {
                let delay = self.backoff.delay(attempt);
                attempt = attempt.saturating_add(1);
                tracing::debug!("rate limited on {}, backing off {:?}", url, delay);
                tokio::time::sleep(delay).await;
                continue;
            }

            return Ok(response);
        }
    }
}
