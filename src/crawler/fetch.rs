use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::{header, redirect, Client};
use tracing::{debug, instrument, warn};

// the target site serves a bot wall to non-browser agents
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Clone, Debug)]
pub struct FetchOptions {
    pub retry_limit: u32,
    pub retry_delay: Duration,
    pub timeout: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            retry_limit: 3,
            retry_delay: Duration::from_secs(2),
            timeout: Duration::from_secs(25),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Fetcher {
    client: Client,
    options: FetchOptions,
}

impl Fetcher {
    pub fn new(options: FetchOptions) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            header::HeaderValue::from_static("en-US,en;q=0.5"),
        );

        let client = Client::builder()
            .cookie_store(true)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(options.timeout)
            .redirect(redirect::Policy::limited(5))
            .build()
            .context("failed to build http client")?;

        Ok(Self { client, options })
    }

    async fn fetch_once(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            bail!("HTTP {} for {}", status, url);
        }
        Ok(response.text().await?)
    }

    /// GETs `url` as text, retrying failed attempts up to the configured limit.
    #[instrument(level = "debug", skip(self))]
    pub async fn fetch_html(&self, url: &str) -> Result<String> {
        let attempts = self.options.retry_limit.max(1);
        let mut attempt = 1;
        loop {
            match self.fetch_once(url).await {
                Ok(body) => {
                    debug!(bytes = body.len(), attempt, "fetched page");
                    return Ok(body);
                }
                Err(e) if attempt < attempts => {
                    warn!("retry {}/{} for {} failed: {:#}", attempt, attempts, url, e);
                    tokio::time::sleep(self.options.retry_delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("giving up on {} after {} attempts", url, attempts)
                    })
                }
            }
        }
    }
}
