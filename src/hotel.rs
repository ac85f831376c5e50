use serde::{Deserialize, Serialize};

pub mod address;

pub use address::{country_to_code, parse_address_components, state_to_code, AddressParts};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Source {
    Scraped,
    Spreadsheet,
}

/// A validated latitude/longitude pair in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    /// Returns `None` for anything that isn't a real point on the globe, so malformed input never
    /// reaches the matcher.
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        valid.then_some(Self {
            latitude,
            longitude,
        })
    }

    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Option<Self> {
        Self::new(latitude?, longitude?)
    }

    /// Parses both halves from text, e.g. scraped meta tags or spreadsheet cells.
    pub fn parse(latitude: &str, longitude: &str) -> Option<Self> {
        let latitude = latitude.trim().parse().ok()?;
        let longitude = longitude.trim().parse().ok()?;
        Self::new(latitude, longitude)
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelRecord {
    pub name: String,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub source: Source,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    pub city: String,
    pub state: String,
    pub country: String,
    pub state_code: Option<String>,
    pub country_code: Option<String>,
}

impl HotelRecord {
    pub fn new(source: Source, name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into().trim().to_string(),
            address: address.into().trim().to_string(),
            latitude: None,
            longitude: None,
            source,
            code: None,
            url: None,
            city: String::new(),
            state: String::new(),
            country: String::new(),
            state_code: None,
            country_code: None,
        }
    }

    pub fn with_coordinates(mut self, coordinates: Option<Coordinates>) -> Self {
        self.latitude = coordinates.map(|c| c.latitude());
        self.longitude = coordinates.map(|c| c.longitude());
        self
    }

    pub fn with_code(mut self, code: Option<String>) -> Self {
        self.code = code.filter(|c| !c.trim().is_empty());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets city/state/country as written and derives the normalized region codes.
    pub fn with_region(
        mut self,
        city: impl Into<String>,
        state: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        self.city = city.into().trim().to_string();
        self.state = state.into().trim().to_string();
        self.country = country.into().trim().to_string();
        self.state_code = state_to_code(&self.state);
        self.country_code = country_to_code(&self.country);
        self
    }

    /// Coordinates re-validated on read; a record deserialized from elsewhere may hold junk.
    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::from_parts(self.latitude, self.longitude)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub candidate: HotelRecord,
    pub matched_record: Option<HotelRecord>,
    pub score: f64,
    pub matched: bool,
}

impl MatchResult {
    pub fn unmatched(candidate: HotelRecord, score: f64) -> Self {
        Self {
            candidate,
            matched_record: None,
            score,
            matched: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_reject_out_of_range_and_non_finite() {
        assert!(Coordinates::new(40.71, -74.0).is_some());
        assert!(Coordinates::new(90.0, 180.0).is_some());
        assert!(Coordinates::new(90.5, 0.0).is_none());
        assert!(Coordinates::new(0.0, -180.1).is_none());
        assert!(Coordinates::new(f64::NAN, 0.0).is_none());
        assert!(Coordinates::new(0.0, f64::INFINITY).is_none());
        assert!(Coordinates::parse("40.7", "abc").is_none());
        assert_eq!(
            Coordinates::parse(" 40.5 ", "-73.25"),
            Coordinates::new(40.5, -73.25)
        );
    }

    #[test]
    fn record_region_derives_codes() {
        let record = HotelRecord::new(Source::Scraped, " Hilton Austin ", "500 E 4th St")
            .with_region("Austin", "Texas", "United States");
        assert_eq!(record.name, "Hilton Austin");
        assert_eq!(record.state_code.as_deref(), Some("TX"));
        assert_eq!(record.country_code.as_deref(), Some("US"));
    }

    #[test]
    fn match_result_serializes_camel_case() {
        let candidate = HotelRecord::new(Source::Spreadsheet, "Best Western", "");
        let json = serde_json::to_value(MatchResult::unmatched(candidate, 0.0)).unwrap();
        assert_eq!(json["matched"], false);
        assert!(json["matchedRecord"].is_null());
        assert_eq!(json["candidate"]["source"], "SPREADSHEET");
    }
}
