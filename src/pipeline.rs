use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    config::Config,
    crawler::{self, Fetcher},
    hotel::MatchResult,
    matcher,
    persist::{json, Store},
    sheet,
};

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub candidates: usize,
    pub skipped_rows: usize,
    pub scraped: usize,
    pub skipped_locations: usize,
    pub skipped_pages: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub output_path: PathBuf,
}

/// One batch: read the spreadsheet, scrape every location, match, then write the database and the
/// JSON file. Only setup and persistence failures abort the run.
#[instrument(level = "debug", skip_all)]
pub async fn run(config: &Config) -> Result<(RunSummary, Vec<MatchResult>)> {
    config.validate().context("invalid configuration")?;
    let run_id = Uuid::new_v4();
    info!(%run_id, "starting scrape and map run");

    let mut store = Store::open(&config.database_url)?;
    store.ensure_schema()?;

    let candidates = sheet::read_candidates(&config.input_path, config.sheet_name.as_deref())?;
    let locations = crawler::load_locations(&config.locations_path)?;

    let fetcher = Fetcher::new(config.fetch_options())?;
    let outcome = crawler::scrape_all(&fetcher, &locations, config.fetch_concurrency).await;
    info!(
        scraped = outcome.records.len(),
        skipped_locations = outcome.skipped_locations,
        skipped_pages = outcome.skipped_pages,
        "scraping finished"
    );

    let results = matcher::match_all(&candidates, &outcome.records, &config.matching)?;

    store.save_results(run_id, &results)?;
    json::write_results(&config.output_path, &results)?;

    let matched = results.iter().filter(|r| r.matched).count();
    let summary = RunSummary {
        run_id,
        candidates: candidates.len(),
        skipped_rows: candidates.iter().filter(|c| c.error.is_some()).count(),
        scraped: outcome.records.len(),
        skipped_locations: outcome.skipped_locations,
        skipped_pages: outcome.skipped_pages,
        matched,
        unmatched: results.len() - matched,
        output_path: config.output_path.clone(),
    };
    info!(?summary, "run complete");

    Ok((summary, results))
}
