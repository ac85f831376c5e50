use std::{path::PathBuf, time::Duration};

use anyhow::{bail, Result};
use clap::Args;

use crate::{crawler::FetchOptions, matcher::MatchConfig};

/// Settings for one scrape-and-match run. Every field reads its environment variable when the
/// flag isn't given.
#[derive(Args, Clone, Debug)]
pub struct Config {
    /// SQLite database file, optionally prefixed with sqlite://
    #[arg(long, env = "DATABASE_URL", default_value = "hotel_mapped_url.sqlite3")]
    pub database_url: String,

    /// Spreadsheet of properties to match (xlsx, xls or ods)
    #[arg(long, env = "INPUT_PATH", default_value = "properties.xlsx")]
    pub input_path: PathBuf,

    /// Worksheet to read. Defaults to the first one
    #[arg(long, env = "SHEET_NAME")]
    pub sheet_name: Option<String>,

    /// JSON array of location pages to scrape, e.g. [{"url": "https://..."}]
    #[arg(long, env = "LOCATIONS_PATH", default_value = "hotel_locations.json")]
    pub locations_path: PathBuf,

    /// Where the JSON array of match results is written
    #[arg(long, env = "OUTPUT_PATH", default_value = "hotel_url_mapped.json")]
    pub output_path: PathBuf,

    /// Attempts per page before giving up on it
    #[arg(long, env = "RETRY_LIMIT", default_value_t = 3)]
    pub retry_limit: u32,

    #[arg(long, env = "RETRY_DELAY_MS", default_value_t = 2000)]
    pub retry_delay_ms: u64,

    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 25)]
    pub request_timeout_secs: u64,

    /// Property pages fetched in parallel per location
    #[arg(long, env = "FETCH_CONCURRENCY", default_value_t = 4)]
    pub fetch_concurrency: usize,

    #[command(flatten)]
    pub matching: MatchConfig,
}

impl Config {
    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            retry_limit: self.retry_limit,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.retry_limit == 0 {
            bail!("RETRY_LIMIT must be at least 1");
        }
        if self.fetch_concurrency == 0 {
            bail!("FETCH_CONCURRENCY must be at least 1");
        }
        if self.request_timeout_secs == 0 {
            bail!("REQUEST_TIMEOUT_SECS must be at least 1");
        }
        self.matching.validate()
    }
}
