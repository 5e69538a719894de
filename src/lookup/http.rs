use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use super::{LookupError, TextFetcher};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// reqwest-backed transport with a minimum spacing between requests so the
/// public endpoints are not hammered.
pub struct HttpFetcher {
    client: reqwest::Client,
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, min_interval: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            min_interval,
            last_request: Mutex::new(None),
        })
    }

    /// Wait until `min_interval` has passed since the previous request.
    async fn pace(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                debug!(wait_ms = wait.as_millis() as u64, "pacing outbound request");
                tokio::time::sleep(wait).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[async_trait]
impl TextFetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, LookupError> {
        self.pace().await;

        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }
        Ok(resp.text().await?)
    }
}
