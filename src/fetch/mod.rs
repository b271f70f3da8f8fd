pub mod curl;
pub mod http;
pub mod retry;

pub use curl::CurlFetcher;
pub use http::HttpFetcher;
pub use retry::{retry_with_backoff, RetryError, RetryPolicy};

use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;

use crate::core::{FetchAttemptError, FetchBackend, FetchConfig, FetchError};

/// Headers a desktop browser sends on a top-level navigation. The search page
/// is less likely to serve a bot wall when these are present.
pub(crate) const BROWSER_HEADERS: &[(&str, &str)] = &[
    ("accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"),
    ("accept-language", "en-US,en;q=0.5"),
    ("upgrade-insecure-requests", "1"),
    ("sec-fetch-dest", "document"),
    ("sec-fetch-mode", "navigate"),
    ("sec-fetch-site", "none"),
    ("cache-control", "max-age=0"),
];

/// One transport for retrieving the search page. Retry lives outside, in [`fetch`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Fetcher: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_once(&self, url: &str) -> Result<String, FetchAttemptError>;
}

#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub content: String,
    pub attempts: u32,
}

/// Fetch `url` through `fetcher`, retrying transient failures per `policy`.
pub async fn fetch(
    fetcher: &dyn Fetcher,
    url: &str,
    policy: &RetryPolicy,
) -> Result<FetchedPage, FetchError> {
    tracing::info!("🌐 Fetching {} via {} backend", url, fetcher.name());

    let result = retry_with_backoff(policy, FetchAttemptError::is_transient, |attempt| {
        tracing::debug!("Fetch attempt {}/{}", attempt, policy.max_attempts);
        fetcher.fetch_once(url)
    })
    .await;

    match result {
        Ok((content, attempts)) => {
            tracing::info!("✅ Fetched {} bytes in {} attempt(s)", content.len(), attempts);
            Ok(FetchedPage { content, attempts })
        }
        Err(RetryError::Exhausted { attempts, last }) => {
            Err(FetchError::NetworkExhausted { attempts, last })
        }
        Err(RetryError::Aborted { attempts, error }) => Err(FetchError::NonRetryable {
            attempts,
            source: error,
        }),
    }
}

/// Build the transport selected in configuration.
pub fn build_fetcher(config: &FetchConfig) -> Result<Box<dyn Fetcher>, FetchAttemptError> {
    Ok(match config.backend {
        FetchBackend::Http => Box::new(HttpFetcher::new(config)?),
        FetchBackend::Curl => Box::new(CurlFetcher::new(config)),
    })
}

impl From<&FetchConfig> for RetryPolicy {
    fn from(config: &FetchConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay: config.base_delay,
            max_jitter: config.max_jitter,
        }
    }
}

/// Random pause inside `range` to look less like a bot.
pub(crate) async fn polite_pause(range: Option<(Duration, Duration)>) {
    let Some((lo, hi)) = range else {
        return;
    };
    let millis = rand::thread_rng().gen_range(lo.as_millis() as u64..=hi.as_millis() as u64);
    tokio::time::sleep(Duration::from_millis(millis)).await;
}
