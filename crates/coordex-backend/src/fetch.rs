//! Auxiliary HTML fetching.
//!
//! HighWire and Springer serve each table as a separate HTML fragment, and
//! the default source may chase linked tables. All of that goes through
//! [`Fetcher`] so the extraction engine stays free of I/O and tests can
//! substitute canned fragments.

use coordex_core::{CoordexError, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Browser-like user agent; several publishers refuse the default
/// reqwest identification outright.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Abstraction over auxiliary HTML retrieval.
pub trait Fetcher: Send + Sync {
    /// Fetch a URL and return its body as text.
    ///
    /// # Errors
    /// Returns [`CoordexError::FetchFailed`] when the resource cannot be
    /// retrieved after the implementation's retry policy is exhausted.
    fn fetch(&self, url: &str) -> Result<String>;
}

/// Blocking HTTP fetcher with timeout, bounded exponential-backoff retries,
/// an optional politeness delay, and an optional file cache keyed by a
/// URL-derived name.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    retries: u32,
    backoff: Duration,
    delay: Option<Duration>,
    cache_dir: Option<PathBuf>,
}

impl HttpFetcher {
    /// Build a fetcher with a 30-second request timeout and 3 retries.
    ///
    /// # Errors
    /// Returns [`CoordexError::FetchFailed`] if the HTTP client cannot be
    /// constructed.
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Build a fetcher with an explicit per-request timeout.
    ///
    /// # Errors
    /// Returns [`CoordexError::FetchFailed`] if the HTTP client cannot be
    /// constructed.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| CoordexError::FetchFailed(format!("client build: {e}")))?;
        Ok(Self {
            client,
            retries: 3,
            backoff: Duration::from_secs(1),
            delay: None,
            cache_dir: None,
        })
    }

    /// Set the number of retry attempts for transient failures.
    #[must_use = "returns a fetcher with the retry count configured"]
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Sleep this long before every request (per-source politeness delay).
    #[must_use = "returns a fetcher with the delay configured"]
    pub fn with_delay(mut self, delay: Option<Duration>) -> Self {
        self.delay = delay;
        self
    }

    /// Cache fetched bodies in this directory, keyed by URL.
    #[must_use = "returns a fetcher with the cache configured"]
    pub fn with_cache_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    fn cache_path(&self, url: &str) -> Option<PathBuf> {
        self.cache_dir
            .as_deref()
            .map(|dir| dir.join(format!("{}.html", url_cache_key(url))))
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String> {
        if let Some(path) = self.cache_path(url) {
            if let Ok(cached) = std::fs::read_to_string(&path) {
                log::debug!("table cache hit for {url}");
                return Ok(cached);
            }
        }

        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        let mut last_error = String::new();
        for attempt in 0..=self.retries {
            if attempt > 0 {
                // Exponential backoff on transient failures.
                std::thread::sleep(self.backoff * 2u32.saturating_pow(attempt - 1));
            }
            match self.client.get(url).send() {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let body = response
                            .text()
                            .map_err(|e| CoordexError::FetchFailed(format!("{url}: {e}")))?;
                        if let Some(path) = self.cache_path(url) {
                            write_cache(&path, &body);
                        }
                        return Ok(body);
                    }
                    if status.is_server_error() {
                        last_error = format!("{url}: HTTP {status}");
                        log::debug!("transient failure ({last_error}), attempt {attempt}");
                        continue;
                    }
                    return Err(CoordexError::FetchFailed(format!("{url}: HTTP {status}")));
                }
                Err(e) if e.is_timeout() => {
                    last_error = format!("{url}: timeout");
                    log::debug!("timeout on {url}, attempt {attempt}");
                }
                Err(e) => return Err(CoordexError::FetchFailed(format!("{url}: {e}"))),
            }
        }
        Err(CoordexError::FetchFailed(last_error))
    }
}

fn write_cache(path: &Path, body: &str) {
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            log::warn!("could not create table cache dir {}: {e}", parent.display());
            return;
        }
    }
    if let Err(e) = std::fs::write(path, body) {
        log::warn!("could not write table cache {}: {e}", path.display());
    }
}

/// Derive a filesystem-safe cache key from a URL.
fn url_cache_key(url: &str) -> String {
    let mut key: String = url
        .trim_start_matches("http://")
        .trim_start_matches("https://")
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    key.truncate(200);
    key
}
