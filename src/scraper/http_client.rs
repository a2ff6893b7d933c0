use crate::config::ScraperConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use super::PageSource;
use super::error::{ScrapeError, ScrapeResult};

/// Shared HTTP client. Cloning is cheap and reuses the connection pool.
#[derive(Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
}

impl HttpClient {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { inner })
    }
}

#[async_trait]
impl PageSource for HttpClient {
    /// Single attempt: any transport failure or non-2xx status is terminal.
    async fn fetch(&self, url: &str) -> ScrapeResult<Vec<u8>> {
        debug!("GET {}", url);

        let resp = self.inner.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ScrapeError::HttpStatus {
                url: url.to_string(),
                status,
            });
        }

        let body = resp.bytes().await?;
        debug!("GET {} -> {} bytes", url, body.len());
        Ok(body.to_vec())
    }
}
