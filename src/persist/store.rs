use std::collections::HashSet;

use anyhow::{Context, Result};
use jiff::Timestamp;
use rusqlite::{params, Connection};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::hotel::MatchResult;

pub const TABLE_NAME: &str = "hotel_mapped_url";

const UPSERT: &str = "
    INSERT INTO hotel_mapped_url (
        candidate_code, candidate_name, candidate_address,
        candidate_city, candidate_state, candidate_country,
        candidate_latitude, candidate_longitude,
        scraped_hotel_name, url, scraped_address,
        scraped_latitude, scraped_longitude,
        match_confidence, matched, run_id, created_at, updated_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?17)
    ON CONFLICT (candidate_code, candidate_name, candidate_address) DO UPDATE SET
        candidate_city = excluded.candidate_city,
        candidate_state = excluded.candidate_state,
        candidate_country = excluded.candidate_country,
        candidate_latitude = excluded.candidate_latitude,
        candidate_longitude = excluded.candidate_longitude,
        scraped_hotel_name = excluded.scraped_hotel_name,
        url = excluded.url,
        scraped_address = excluded.scraped_address,
        scraped_latitude = excluded.scraped_latitude,
        scraped_longitude = excluded.scraped_longitude,
        match_confidence = excluded.match_confidence,
        matched = excluded.matched,
        run_id = excluded.run_id,
        updated_at = excluded.updated_at;
";

/// SQLite table of match results, one row per spreadsheet hotel.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Opens (creating if needed) the database at `database_url`, a file path optionally prefixed
    /// with `sqlite://`.
    pub fn open(database_url: &str) -> Result<Self> {
        let path = database_url
            .strip_prefix("sqlite://")
            .unwrap_or(database_url);
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database {}", path))?;
        debug!("opened database {}", path);
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    pub fn ensure_schema(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS hotel_mapped_url (
                    id INTEGER PRIMARY KEY,

                    candidate_code TEXT NOT NULL DEFAULT '',
                    candidate_name TEXT NOT NULL,
                    candidate_address TEXT NOT NULL,
                    candidate_city TEXT NOT NULL,
                    candidate_state TEXT NOT NULL,
                    candidate_country TEXT NOT NULL,
                    candidate_latitude REAL,
                    candidate_longitude REAL,

                    scraped_hotel_name TEXT,
                    url TEXT,
                    scraped_address TEXT,
                    scraped_latitude REAL,
                    scraped_longitude REAL,

                    match_confidence REAL NOT NULL,
                    matched INTEGER NOT NULL,
                    run_id TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL,

                    UNIQUE (candidate_code, candidate_name, candidate_address)
                ) STRICT;
                CREATE INDEX IF NOT EXISTS hotel_mapped_url_url ON hotel_mapped_url(url);
                ",
            )
            .context("failed to create hotel_mapped_url table")
    }

    /// Upserts every result in one transaction. Any failure rolls the whole batch back.
    ///
    /// Returns the number of distinct rows written. Results sharing a code, name and address land
    /// on the same row, the last one winning.
    pub fn save_results(&mut self, run_id: Uuid, results: &[MatchResult]) -> Result<usize> {
        let now = Timestamp::now().to_string();
        let run_id = run_id.to_string();

        let mut keys = HashSet::new();
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(UPSERT)?;
            for result in results {
                let candidate = &result.candidate;
                let scraped = result.matched_record.as_ref();
                let code = candidate.code.as_deref().unwrap_or_default();
                if !keys.insert((code, candidate.name.as_str(), candidate.address.as_str())) {
                    warn!(
                        code,
                        name = %candidate.name,
                        address = %candidate.address,
                        "duplicate spreadsheet hotel overwrites an earlier result in this batch"
                    );
                }
                stmt.execute(params![
                    code,
                    &candidate.name,
                    &candidate.address,
                    &candidate.city,
                    &candidate.state,
                    &candidate.country,
                    candidate.latitude,
                    candidate.longitude,
                    scraped.map(|s| s.name.as_str()),
                    scraped.and_then(|s| s.url.as_deref()),
                    scraped.map(|s| s.address.as_str()),
                    scraped.and_then(|s| s.latitude),
                    scraped.and_then(|s| s.longitude),
                    result.score,
                    result.matched,
                    &run_id,
                    &now,
                ])
                .with_context(|| format!("failed to save match for {:?}", candidate.name))?;
            }
        }
        tx.commit().context("failed to commit match results")?;

        info!("saved {} match results to {}", keys.len(), TABLE_NAME);
        Ok(keys.len())
    }
}
