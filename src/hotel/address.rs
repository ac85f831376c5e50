use std::sync::LazyLock;

use regex::Regex;

const STATE_CODES: [(&str, &str); 50] = [
    ("alabama", "AL"),
    ("alaska", "AK"),
    ("arizona", "AZ"),
    ("arkansas", "AR"),
    ("california", "CA"),
    ("colorado", "CO"),
    ("connecticut", "CT"),
    ("delaware", "DE"),
    ("florida", "FL"),
    ("georgia", "GA"),
    ("hawaii", "HI"),
    ("idaho", "ID"),
    ("illinois", "IL"),
    ("indiana", "IN"),
    ("iowa", "IA"),
    ("kansas", "KS"),
    ("kentucky", "KY"),
    ("louisiana", "LA"),
    ("maine", "ME"),
    ("maryland", "MD"),
    ("massachusetts", "MA"),
    ("michigan", "MI"),
    ("minnesota", "MN"),
    ("mississippi", "MS"),
    ("missouri", "MO"),
    ("montana", "MT"),
    ("nebraska", "NE"),
    ("nevada", "NV"),
    ("new hampshire", "NH"),
    ("new jersey", "NJ"),
    ("new mexico", "NM"),
    ("new york", "NY"),
    ("north carolina", "NC"),
    ("north dakota", "ND"),
    ("ohio", "OH"),
    ("oklahoma", "OK"),
    ("oregon", "OR"),
    ("pennsylvania", "PA"),
    ("rhode island", "RI"),
    ("south carolina", "SC"),
    ("south dakota", "SD"),
    ("tennessee", "TN"),
    ("texas", "TX"),
    ("utah", "UT"),
    ("vermont", "VT"),
    ("virginia", "VA"),
    ("washington", "WA"),
    ("west virginia", "WV"),
    ("wisconsin", "WI"),
    ("wyoming", "WY"),
];

// "CA 90001" style state segment
static STATE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z]{2})\b").expect("hardcoded regex should compile"));

/// Two letter codes pass through uppercased, full US state names are looked up.
pub fn state_to_code(state: &str) -> Option<String> {
    let state = state.trim();
    if state.len() == 2 && state.chars().all(|c| c.is_ascii_alphabetic()) {
        return Some(state.to_ascii_uppercase());
    }
    let lower = state.to_lowercase();
    STATE_CODES
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(_, code)| code.to_string())
}

pub fn country_to_code(country: &str) -> Option<String> {
    let country = country.trim();
    if country.is_empty() {
        return None;
    }
    let upper = country.to_uppercase();
    match upper.as_str() {
        "USA" | "UNITED STATES" | "US" | "U.S." | "U.S.A." => Some("US".to_string()),
        _ => Some(upper),
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AddressParts {
    pub city: String,
    pub state: String,
    pub country: String,
}

/// Splits a one-line postal address into city, state and country.
///
/// The country is the last comma separated part. For US style addresses
/// (`street, city, ST 12345, country`) the part before the country carries the state and the part
/// before that is the city. Anything else falls back to the second-to-last part as the city.
pub fn parse_address_components(address: &str) -> AddressParts {
    let parts: Vec<&str> = address
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    let mut result = AddressParts::default();
    let Some(country) = parts.last() else {
        return result;
    };
    result.country = country.to_string();

    if parts.len() >= 3 {
        let possible_state = parts[parts.len() - 2];
        let possible_city = parts[parts.len() - 3];

        if let Some(state) = state_segment(possible_state) {
            result.state = state;
            result.city = possible_city.to_string();
        } else {
            result.city = possible_state.to_string();
        }
    }

    if result.city.is_empty() && parts.len() >= 2 {
        result.city = parts[parts.len() - 2].to_string();
    }

    result
}

fn state_segment(segment: &str) -> Option<String> {
    if let Some(captures) = STATE_PREFIX.captures(segment) {
        return captures.get(1).map(|m| m.as_str().to_string());
    }
    // "Texas 75201"
    let name = segment
        .split(|c: char| c.is_ascii_digit())
        .next()
        .unwrap_or_default()
        .trim();
    state_to_code(name).map(|_| name.to_string())
}
