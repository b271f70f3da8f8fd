use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use std::time::Duration;

use super::{polite_pause, Fetcher, BROWSER_HEADERS};
use crate::core::{FetchAttemptError, FetchConfig};

/// Native HTTP transport backed by reqwest.
pub struct HttpFetcher {
    client: Client,
    pre_request_delay: Option<(Duration, Duration)>,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchAttemptError> {
        let mut headers = HeaderMap::new();
        for &(name, value) in BROWSER_HEADERS {
            headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
        }

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(config.timeout)
            .gzip(true)
            .build()
            .map_err(|e| FetchAttemptError::Request(e.to_string()))?;

        Ok(Self {
            client,
            pre_request_delay: config.pre_request_delay,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch_once(&self, url: &str) -> Result<String, FetchAttemptError> {
        polite_pause(self.pre_request_delay).await;

        let response = self.client.get(url).send().await.map_err(classify)?;
        let status = response.status();

        if !status.is_success() {
            tracing::warn!("Search page returned HTTP {}", status);
            return Err(FetchAttemptError::Status(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| FetchAttemptError::Body(e.to_string()))
    }
}

fn classify(err: reqwest::Error) -> FetchAttemptError {
    if err.is_timeout() {
        FetchAttemptError::Timeout
    } else if err.is_builder() {
        FetchAttemptError::Request(err.to_string())
    } else if let Some(status) = err.status() {
        FetchAttemptError::Status(status.as_u16())
    } else {
        FetchAttemptError::Connect(err.to_string())
    }
}
