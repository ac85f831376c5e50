use std::collections::BTreeSet;

use itertools::Itertools;
use strsim::normalized_levenshtein;

use crate::hotel::Coordinates;

const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Lowercases, turns every non-alphanumeric character into a space and collapses whitespace.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_lowercase().next().unwrap_or(c)
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .join(" ")
}

/// Token-set similarity of two names in [0, 1].
///
/// Word order and repeated words are ignored, and a name whose words are all contained in the
/// other ("Hilton Downtown" vs "Hilton Downtown Hotel") scores 1.0.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let a = normalize_name(a);
    let b = normalize_name(b);
    let tokens_a: BTreeSet<&str> = a.split(' ').filter(|t| !t.is_empty()).collect();
    let tokens_b: BTreeSet<&str> = b.split(' ').filter(|t| !t.is_empty()).collect();
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let shared: Vec<&str> = tokens_a.intersection(&tokens_b).copied().collect();
    let only_a: Vec<&str> = tokens_a.difference(&tokens_b).copied().collect();
    let only_b: Vec<&str> = tokens_b.difference(&tokens_a).copied().collect();

    if !shared.is_empty() && (only_a.is_empty() || only_b.is_empty()) {
        return 1.0;
    }

    let shared = shared.join(" ");
    let combined_a = join_nonempty(&shared, &only_a.join(" "));
    let combined_b = join_nonempty(&shared, &only_b.join(" "));

    let mut best = normalized_levenshtein(&combined_a, &combined_b);
    if !shared.is_empty() {
        best = best
            .max(normalized_levenshtein(&shared, &combined_a))
            .max(normalized_levenshtein(&shared, &combined_b));
    }
    best.clamp(0.0, 1.0)
}

fn join_nonempty(a: &str, b: &str) -> String {
    match (a.is_empty(), b.is_empty()) {
        (true, _) => b.to_string(),
        (_, true) => a.to_string(),
        _ => format!("{a} {b}"),
    }
}

/// Great-circle distance in kilometres.
pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    let (lat_a, lat_b) = (a.latitude().to_radians(), b.latitude().to_radians());
    let d_lat = lat_b - lat_a;
    let d_lon = (b.longitude() - a.longitude()).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// Exponential decay of distance into a score: 1.0 at the same point, ~0.37 at `scale_km`.
pub fn distance_score(a: Coordinates, b: Coordinates, scale_km: f64) -> f64 {
    (-haversine_km(a, b) / scale_km).exp().clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_strips_punctuation_and_case() {
        assert_eq!(normalize_name("  The Hilton-Downtown, NYC! "), "the hilton downtown nyc");
        assert_eq!(normalize_name("Hôtel  Café"), "hôtel café");
        assert_eq!(normalize_name("---"), "");
    }

    #[test]
    fn normalization_is_idempotent() {
        for name in [
            "Hilton Garden Inn (Midtown)",
            "DoubleTree by HILTON / Austin",
            "  spaced   out  ",
            "Ünïcode Ünïcode",
            "",
        ] {
            let once = normalize_name(name);
            assert_eq!(normalize_name(&once), once);
        }
    }

    #[test]
    fn subset_names_score_one() {
        assert_eq!(token_set_ratio("Hilton Downtown", "Hilton Downtown Hotel"), 1.0);
        assert_eq!(token_set_ratio("downtown hilton", "HILTON, Downtown"), 1.0);
    }

    #[test]
    fn unrelated_names_score_low() {
        let score = token_set_ratio("Best Western", "Hilton Garden Inn");
        assert!(score < 0.5, "got {score}");
    }

    #[test]
    fn partial_overlap_is_between() {
        let score = token_set_ratio("Hilton Garden Inn Austin", "Hilton Garden Inn Dallas");
        assert!(score > 0.7 && score < 1.0, "got {score}");
    }

    #[test]
    fn empty_names_score_zero() {
        assert_eq!(token_set_ratio("", ""), 0.0);
        assert_eq!(token_set_ratio("Hilton", "  "), 0.0);
    }

    #[test]
    fn haversine_known_distance() {
        // JFK to LAX is roughly 3980 km
        let jfk = Coordinates::new(40.6413, -73.7781).unwrap();
        let lax = Coordinates::new(33.9416, -118.4085).unwrap();
        let d = haversine_km(jfk, lax);
        assert!((d - 3980.0).abs() < 30.0, "got {d}");
        assert_eq!(haversine_km(jfk, jfk), 0.0);
    }

    #[test]
    fn distance_score_decays() {
        let a = Coordinates::new(40.71, -74.00).unwrap();
        let near = Coordinates::new(40.711, -74.001).unwrap();
        let far = Coordinates::new(40.80, -74.00).unwrap();
        assert_eq!(distance_score(a, a, 1.0), 1.0);
        assert!(distance_score(a, near, 1.0) > 0.8);
        assert!(distance_score(a, far, 1.0) < 0.01);
    }
}
