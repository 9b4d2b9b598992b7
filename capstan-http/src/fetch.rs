//! Remote script-source fetching with bounded retry

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use capstan_core::SourceFetcher;
use capstan_resilience::{RetryExecutor, RetryPolicy};

use crate::errors::HttpError;

/// Connection parameters for the fetcher
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub timeout: Duration,
    pub user_agent: String,
    pub max_retry_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: format!("capstan/{}", env!("CARGO_PKG_VERSION")),
            max_retry_attempts: 3,
            retry_delay: Duration::from_secs(1),
        }
    }
}

/// Fetches script sources over HTTP(S)
pub struct HttpFetcher {
    client: Client,
    retry: RetryExecutor,
}

impl HttpFetcher {
    pub fn new(options: FetchOptions) -> Result<Self, HttpError> {
        let client = Client::builder()
            .timeout(options.timeout)
            .user_agent(options.user_agent.clone())
            .build()?;
        let policy = RetryPolicy::linear(options.max_retry_attempts, options.retry_delay);
        Ok(Self {
            client,
            retry: RetryExecutor::new(policy),
        })
    }

    pub fn with_defaults() -> Result<Self, HttpError> {
        Self::new(FetchOptions::default())
    }

    async fn fetch_once(&self, url: &str) -> Result<String, HttpError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::SERVICE_UNAVAILABLE {
            warn!(url = %url, "upstream unavailable");
            return Err(HttpError::Transient {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(HttpError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl SourceFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> anyhow::Result<String> {
        url::Url::parse(url).map_err(|e| HttpError::InvalidUrl(format!("{url}: {e}")))?;
        debug!(url = %url, "fetching remote script source");

        let content = self
            .retry
            .execute(|| self.fetch_once(url))
            .await
            .map_err(|e| anyhow::Error::new(e.into_inner()))?;
        Ok(content)
    }
}
