use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tokio_retry::strategy::ExponentialBackoff;
use tokio_retry::RetryIf;
use tracing::debug;

use crate::config::HttpConfig;
use crate::error::KdmError;

/// Retries after the first attempt for connection errors, timeouts and 5xx responses.
pub const FETCH_RETRIES: usize = 4;
/// Backoff delays are `2^n * BACKOFF_UNIT_MS`: 200ms, 400ms, 800ms, 1.6s.
const BACKOFF_UNIT_MS: u64 = 100;
const MAX_BACKOFF_SECS: u64 = 5;
const BODY_PREVIEW_CHARS: usize = 180;

/// Raw document transport. The resolver owns decoding.
#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, KdmError>;
}

#[derive(Debug)]
enum AttemptError {
    Transient(String),
    Permanent(String),
}

impl AttemptError {
    fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// HTTP GET with a fixed retry budget.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    backoff_unit_ms: u64,
}

impl HttpFetcher {
    pub fn new(http: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(http.user_agent.as_str())
            .timeout(Duration::from_secs(http.timeout_secs))
            .connect_timeout(Duration::from_secs(http.connect_timeout_secs))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            backoff_unit_ms: BACKOFF_UNIT_MS,
        })
    }

    #[cfg(test)]
    fn with_backoff_unit_ms(mut self, unit_ms: u64) -> Self {
        self.backoff_unit_ms = unit_ms;
        self
    }

    fn backoff(&self) -> impl Iterator<Item = Duration> {
        ExponentialBackoff::from_millis(2)
            .factor(self.backoff_unit_ms)
            .max_delay(Duration::from_secs(MAX_BACKOFF_SECS))
            .take(FETCH_RETRIES)
    }

    async fn attempt(&self, url: &str) -> Result<Vec<u8>, AttemptError> {
        debug!(url, "GET");
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_builder() {
                AttemptError::Permanent(e.to_string())
            } else {
                debug!(url, error = %e, "request failed");
                AttemptError::Transient(e.to_string())
            }
        })?;

        let status = response.status();
        if status.is_server_error() {
            debug!(url, %status, "server error");
            return Err(AttemptError::Transient(format!("server returned {status}")));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let preview: String = body.chars().take(BODY_PREVIEW_CHARS).collect();
            return Err(AttemptError::Permanent(format!(
                "server returned {status}: {preview}"
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AttemptError::Permanent(format!("failed reading response body: {e}")))?;
        Ok(body.to_vec())
    }
}

#[async_trait]
impl MetadataFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, KdmError> {
        RetryIf::spawn(
            self.backoff(),
            || self.attempt(url),
            AttemptError::is_transient,
        )
        .await
        .map_err(|err| {
            let reason = match err {
                AttemptError::Transient(reason) => {
                    format!("giving up after {} attempts: {reason}", FETCH_RETRIES + 1)
                }
                AttemptError::Permanent(reason) => reason,
            };
            KdmError::FetchError {
                url: url.to_string(),
                reason,
            }
        })
    }
}
