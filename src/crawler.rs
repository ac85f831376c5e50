use std::path::Path;

use anyhow::{Context, Result};
use futures::{stream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::hotel::HotelRecord;

pub mod fetch;
pub mod parse;

pub use fetch::{FetchOptions, Fetcher};

/// A listing index page on the target site, e.g. all hotels in one city.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

pub fn load_locations(path: &Path) -> Result<Vec<Location>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read locations file {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("locations file {} is not a JSON array of {{\"url\": ...}}", path.display()))
}

#[derive(Debug, Default)]
pub struct ScrapeOutcome {
    pub records: Vec<HotelRecord>,
    pub skipped_locations: usize,
    pub skipped_pages: usize,
}

/// Scrapes every property linked from one location page. Property pages are fetched up to
/// `concurrency` at a time and returned in link order; pages that fail are logged and dropped.
#[instrument(level = "debug", skip(fetcher))]
pub async fn scrape_location(
    fetcher: &Fetcher,
    location: &Location,
    concurrency: usize,
) -> Result<(Vec<HotelRecord>, usize)> {
    let base = Url::parse(&location.url)
        .with_context(|| format!("invalid location url {}", location.url))?;
    let html = fetcher.fetch_html(base.as_str()).await?;
    let links = parse::hotel_links(&html, &base);
    info!("found {} hotel links on {}", links.len(), base);

    let pages: Vec<_> = stream::iter(links)
        .map(|link| async move {
            let result = fetcher.fetch_html(link.as_str()).await;
            (link, result)
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut records = Vec::new();
    let mut skipped = 0;
    for (link, result) in pages {
        match result {
            Ok(html) => match parse::parse_property(&html, link.as_str()) {
                Some(record) => {
                    debug!(name = %record.name, url = %link, "scraped hotel");
                    records.push(record);
                }
                None => {
                    warn!("no hotel found on {}", link);
                    skipped += 1;
                }
            },
            Err(e) => {
                warn!("failed hotel {}: {:#}", link, e);
                skipped += 1;
            }
        }
    }
    Ok((records, skipped))
}

/// Scrapes all locations in order. A location whose index page can't be fetched is skipped.
pub async fn scrape_all(
    fetcher: &Fetcher,
    locations: &[Location],
    concurrency: usize,
) -> ScrapeOutcome {
    let mut outcome = ScrapeOutcome::default();
    for location in locations {
        info!("scraping location {}", location.url);
        match scrape_location(fetcher, location, concurrency).await {
            Ok((records, skipped)) => {
                outcome.records.extend(records);
                outcome.skipped_pages += skipped;
            }
            Err(e) => {
                warn!("failed scraping location {}: {:#}", location.url, e);
                outcome.skipped_locations += 1;
            }
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locations_file_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("locations.json");
        std::fs::write(
            &path,
            r#"[{"url": "https://www.hilton.com/en/locations/usa/texas/austin/"},
                {"url": "https://www.hilton.com/en/locations/japan/tokyo/", "name": "Tokyo"}]"#,
        )
        .unwrap();

        let locations = load_locations(&path).unwrap();
        assert_eq!(locations.len(), 2);
        assert_eq!(locations[0].name, None);
        assert_eq!(locations[1].name.as_deref(), Some("Tokyo"));

        std::fs::write(&path, r#"{"url": "not an array"}"#).unwrap();
        assert!(load_locations(&path).is_err());
    }
}
