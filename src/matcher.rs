use anyhow::{bail, Result};
use clap::Args;
use tracing::{debug, instrument};

use crate::{
    hotel::{HotelRecord, MatchResult},
    sheet::Candidate,
};

pub mod similarity;

use similarity::{distance_score, normalize_name, token_set_ratio};

/// Tunables for scoring a candidate against scraped records.
#[derive(Args, Clone, Debug, PartialEq)]
pub struct MatchConfig {
    /// Weight of the name similarity in the combined score
    #[arg(long = "match-name-weight", env = "MATCH_NAME_WEIGHT", default_value_t = 0.6)]
    pub name_weight: f64,

    /// Weight of the location similarity in the combined score
    #[arg(long = "match-location-weight", env = "MATCH_LOCATION_WEIGHT", default_value_t = 0.4)]
    pub location_weight: f64,

    /// Minimum combined score for a pair to count as matched
    #[arg(long = "match-threshold", env = "MATCH_THRESHOLD", default_value_t = 0.85)]
    pub threshold: f64,

    /// Distance at which the location score has decayed to 1/e
    #[arg(long = "match-distance-scale-km", env = "MATCH_DISTANCE_SCALE_KM", default_value_t = 1.0)]
    pub distance_scale_km: f64,

    /// Only compare hotels in the same city, state and country
    #[arg(
        long = "match-region-gate",
        env = "MATCH_REGION_GATE",
        action = clap::ArgAction::Set,
        default_value_t = false
    )]
    pub region_gate: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            name_weight: 0.6,
            location_weight: 0.4,
            threshold: 0.85,
            distance_scale_km: 1.0,
            region_gate: false,
        }
    }
}

impl MatchConfig {
    pub fn validate(&self) -> Result<()> {
        let weights = [self.name_weight, self.location_weight];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            bail!("match weights must be non-negative, got {weights:?}");
        }
        if self.name_weight + self.location_weight <= 0.0 {
            bail!("at least one match weight must be positive");
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            bail!("match threshold must be within [0, 1], got {}", self.threshold);
        }
        if !self.distance_scale_km.is_finite() || self.distance_scale_km <= 0.0 {
            bail!(
                "distance scale must be positive, got {}",
                self.distance_scale_km
            );
        }
        Ok(())
    }
}

/// Location similarity, or `None` when neither coordinates nor addresses can be compared.
fn location_score(a: &HotelRecord, b: &HotelRecord, config: &MatchConfig) -> Option<f64> {
    if let (Some(x), Some(y)) = (a.coordinates(), b.coordinates()) {
        return Some(distance_score(x, y, config.distance_scale_km));
    }
    if normalize_name(&a.address).is_empty() || normalize_name(&b.address).is_empty() {
        return None;
    }
    Some(token_set_ratio(&a.address, &b.address))
}

/// Combined similarity of two records in [0, 1].
pub fn score(candidate: &HotelRecord, scraped: &HotelRecord, config: &MatchConfig) -> f64 {
    let name = token_set_ratio(&candidate.name, &scraped.name);
    let combined = match location_score(candidate, scraped, config) {
        Some(location) => {
            (config.name_weight * name + config.location_weight * location)
                / (config.name_weight + config.location_weight)
        }
        None => name,
    };
    combined.clamp(0.0, 1.0)
}

fn same_region(a: &HotelRecord, b: &HotelRecord) -> bool {
    let (Some(country_a), Some(country_b)) = (&a.country_code, &b.country_code) else {
        return true;
    };
    let (city_a, city_b) = (normalize_name(&a.city), normalize_name(&b.city));
    if city_a.is_empty() || city_b.is_empty() {
        return true;
    }
    if city_a != city_b || country_a != country_b {
        return false;
    }
    match (&a.state_code, &b.state_code) {
        (Some(state_a), Some(state_b)) => state_a == state_b,
        _ => true,
    }
}

/// Finds the best scoring scraped record for `candidate`. The first record reaching the maximum
/// wins, so the result only depends on input order.
///
/// `config` must have passed [`MatchConfig::validate`]; [`match_all`] checks it for you.
pub fn match_record(
    candidate: &HotelRecord,
    scraped: &[HotelRecord],
    config: &MatchConfig,
) -> MatchResult {
    let mut best: Option<(&HotelRecord, f64)> = None;

    for record in scraped
        .iter()
        .filter(|r| !config.region_gate || same_region(candidate, r))
    {
        let s = score(candidate, record, config);
        if best.map_or(true, |(_, best_score)| s > best_score) {
            best = Some((record, s));
        }
    }

    match best {
        Some((record, s)) if s >= config.threshold => MatchResult {
            candidate: candidate.clone(),
            matched_record: Some(record.clone()),
            score: s,
            matched: true,
        },
        Some((_, s)) => MatchResult::unmatched(candidate.clone(), s),
        None => MatchResult::unmatched(candidate.clone(), 0.0),
    }
}

/// Matches every candidate in order. Rows that failed to parse come back unmatched.
#[instrument(level = "debug", skip_all, fields(candidates = candidates.len(), scraped = scraped.len()))]
pub fn match_all(
    candidates: &[Candidate],
    scraped: &[HotelRecord],
    config: &MatchConfig,
) -> Result<Vec<MatchResult>> {
    config.validate()?;
    let results = candidates
        .iter()
        .map(|candidate| match &candidate.error {
            Some(error) => {
                debug!(row = candidate.row, %error, "unparseable row recorded as unmatched");
                MatchResult::unmatched(candidate.record.clone(), 0.0)
            }
            None => match_record(&candidate.record, scraped, config),
        })
        .collect();
    Ok(results)
}
