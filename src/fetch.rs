//! Page retrieval with bounded retries and jittered backoff.
//!
//! # Architecture
//!
//! - [`PageFetch`]: a single GET attempt that either yields the page body or an error
//! - [`HttpFetcher`]: the `reqwest` implementation, carrying the fixed
//!   `User-Agent` and `Accept-Language` headers and the request timeout
//! - [`RetryFetch`]: decorator that retries any [`PageFetch`] and degrades
//!   every failure to "no content"
//!
//! # Retry Strategy
//!
//! - `retries + 1` attempts in total (3 by default)
//! - After a failed attempt (non-success status or transport error), sleep a
//!   uniformly random interval in `[backoff_min_secs, backoff_max_secs]`
//! - No sleep after the last attempt

use crate::utils::truncate_for_log;
use rand::{Rng, rng};
use reqwest::header::{ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use serde::Deserialize;
use std::error::Error;
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};

/// Longest accepted sleep between attempts.
const MAX_BACKOFF_SECS: f64 = 3600.0;

/// Retrieval settings, read from the optional `fetch:` block of the
/// configuration document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// Retries after the initial attempt.
    pub retries: u32,
    /// Lower bound of the random sleep between attempts.
    pub backoff_min_secs: f64,
    /// Upper bound of the random sleep between attempts.
    pub backoff_max_secs: f64,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
    /// `Accept-Language` header sent with every request.
    pub accept_language: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 20,
            retries: 2,
            backoff_min_secs: 1.0,
            backoff_max_secs: 2.5,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0 Safari/537.36".to_string(),
            accept_language: "es-ES,es;q=0.9,en;q=0.8".to_string(),
        }
    }
}

impl FetchSettings {
    /// Reject values the retry loop cannot work with.
    ///
    /// # Errors
    ///
    /// Backoff bounds that are negative, NaN, infinite or above an hour, a lower bound above
    /// the upper one, or `retries` so large that the attempt count overflows.
    pub fn validate(&self) -> Result<(), Box<dyn Error>> {
        for (field, value) in [
            ("backoff_min_secs", self.backoff_min_secs),
            ("backoff_max_secs", self.backoff_max_secs),
        ] {
            if !value.is_finite() || !(0.0..=MAX_BACKOFF_SECS).contains(&value) {
                return Err(format!(
                    "fetch.{field} must be between 0 and {MAX_BACKOFF_SECS} seconds (got {value})"
                )
                .into());
            }
        }
        if self.backoff_min_secs > self.backoff_max_secs {
            return Err(format!(
                "fetch.backoff_min_secs ({}) exceeds fetch.backoff_max_secs ({})",
                self.backoff_min_secs, self.backoff_max_secs
            )
            .into());
        }
        if self.retries == u32::MAX {
            return Err(format!("fetch.retries must be below {}", u32::MAX).into());
        }
        Ok(())
    }
}

/// A single attempt at retrieving a page.
pub trait PageFetch {
    /// Fetch `url` and return its body as text.
    ///
    /// # Errors
    ///
    /// Transport failures, timeouts and non-success HTTP statuses.
    async fn fetch(&self, url: &str) -> Result<String, Box<dyn Error>>;
}

/// [`PageFetch`] over a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a client with the configured headers and timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if `accept_language` is not a valid header value or
    /// the TLS backend cannot be initialised.
    pub fn new(settings: &FetchSettings) -> Result<Self, Box<dyn Error>> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_str(&settings.accept_language)?,
        );
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .default_headers(headers)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self { client })
    }
}

impl PageFetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, Box<dyn Error>> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(format!("GET {url} -> {status}").into());
        }
        Ok(response.text().await?)
    }
}

/// Wraps a [`PageFetch`] with bounded retries and random backoff.
pub struct RetryFetch<T> {
    inner: T,
    max_retries: u32,
    backoff_min_secs: f64,
    backoff_max_secs: f64,
}

impl<T> RetryFetch<T>
where
    T: PageFetch,
{
    pub fn new(inner: T, settings: &FetchSettings) -> Self {
        Self {
            inner,
            max_retries: settings.retries,
            backoff_min_secs: settings.backoff_min_secs,
            backoff_max_secs: settings.backoff_max_secs,
        }
    }

    #[cfg(test)]
    pub(crate) fn inner(&self) -> &T {
        &self.inner
    }

    /// Random sleep between attempts. Bounds are validated at config load;
    /// they are still clamped here so the sampler never sees a bad range.
    fn backoff_delay(&self) -> Duration {
        let low = if self.backoff_min_secs.is_finite() {
            self.backoff_min_secs.max(0.0)
        } else {
            0.0
        };
        let high = self.backoff_max_secs.max(low);
        let secs = if high > low && high.is_finite() {
            rng().random_range(low..=high)
        } else {
            low
        };
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO)
    }

    /// Fetch `url`, retrying on failure.
    ///
    /// Returns `None` once every attempt has failed; errors never escape.
    #[instrument(level = "info", skip_all, fields(%url))]
    pub async fn fetch_text(&self, url: &str) -> Option<String> {
        let attempts = self.max_retries.saturating_add(1);
        let total_t0 = Instant::now();

        for attempt in 1..=attempts {
            match self.inner.fetch(url).await {
                Ok(body) => {
                    debug!(
                        attempt,
                        bytes = body.len(),
                        preview = %truncate_for_log(&body, 200),
                        elapsed_ms_total = total_t0.elapsed().as_millis(),
                        "Fetched page"
                    );
                    return Some(body);
                }
                Err(e) => {
                    warn!(attempt, max = attempts, error = %e, "GET failed");
                }
            }

            if attempt < attempts {
                let delay = self.backoff_delay();
                debug!(attempt, ?delay, "Backing off before retry");
                sleep(delay).await;
            }
        }

        error!(
            attempts,
            elapsed_ms_total = total_t0.elapsed().as_millis(),
            "GET exhausted retries"
        );
        None
    }
}

impl<T> fmt::Debug for RetryFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("max_retries", &self.max_retries)
            .field("backoff_min_secs", &self.backoff_min_secs)
            .field("backoff_max_secs", &self.backoff_max_secs)
            .finish()
    }
}
