use std::path::Path;

use anyhow::{anyhow, Context, Result};
use calamine::{open_workbook_auto, Data, Range, Reader};
use tracing::{debug, info, instrument, warn};

use crate::hotel::{Coordinates, HotelRecord, Source};

const NAME_HEADERS: &[&str] = &["global property name", "hotel name", "property name", "name"];
const CODE_HEADERS: &[&str] = &["global property id", "hotel code", "property id", "id"];
const ADDRESS_HEADERS: &[&str] = &["property address", "address"];
const CITY_HEADERS: &[&str] = &["property city name", "city"];
const STATE_HEADERS: &[&str] = &["property state/province", "state/province", "state"];
const COUNTRY_HEADERS: &[&str] = &["property country code", "country code", "country"];
const LATITUDE_HEADERS: &[&str] = &["property latitude", "latitude", "lat"];
const LONGITUDE_HEADERS: &[&str] = &["property longitude", "longitude", "lon", "lng"];

/// A spreadsheet row. Rows that couldn't be parsed keep whatever was readable plus the reason.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// 1-based row number as shown by spreadsheet software
    pub row: usize,
    pub record: HotelRecord,
    pub error: Option<String>,
}

#[derive(Debug)]
struct Columns {
    name: usize,
    code: Option<usize>,
    address: Option<usize>,
    city: Option<usize>,
    state: Option<usize>,
    country: Option<usize>,
    latitude: Option<usize>,
    longitude: Option<usize>,
}

impl Columns {
    fn locate(header: &[Data]) -> Result<Self> {
        let headers: Vec<String> = header
            .iter()
            .map(|cell| cell_text(Some(cell)).to_lowercase())
            .collect();
        // aliases are in priority order, so search alias-first
        let find = |aliases: &[&str]| {
            aliases
                .iter()
                .find_map(|alias| headers.iter().position(|h| h == alias))
        };

        Ok(Self {
            name: find(NAME_HEADERS)
                .ok_or_else(|| anyhow!("no hotel name column, expected one of {NAME_HEADERS:?}"))?,
            code: find(CODE_HEADERS),
            address: find(ADDRESS_HEADERS),
            city: find(CITY_HEADERS),
            state: find(STATE_HEADERS),
            country: find(COUNTRY_HEADERS),
            latitude: find(LATITUDE_HEADERS),
            longitude: find(LONGITUDE_HEADERS),
        })
    }

    fn candidate(&self, row: usize, cells: &[Data]) -> Option<Candidate> {
        if cells.iter().all(|cell| cell_text(Some(cell)).is_empty()) {
            return None;
        }
        let text = |column: Option<usize>| cell_text(column.and_then(|i| cells.get(i)));
        let number = |column: Option<usize>| cell_number(column.and_then(|i| cells.get(i)));

        let name = text(Some(self.name));
        let city = text(self.city);
        let state = text(self.state);
        let country = text(self.country);

        let address = match text(self.address) {
            a if !a.is_empty() => a,
            _ => [city.as_str(), state.as_str(), country.as_str()]
                .into_iter()
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
        };

        let code = Some(text(self.code)).filter(|c| !c.is_empty());
        let coordinates = Coordinates::from_parts(number(self.latitude), number(self.longitude));

        let record = HotelRecord::new(Source::Spreadsheet, name.as_str(), address)
            .with_code(code)
            .with_coordinates(coordinates)
            .with_region(city, state, country);

        let error = name.is_empty().then(|| "missing hotel name".to_string());
        if let Some(error) = &error {
            warn!(row, %error, "skipping spreadsheet row");
        }

        Some(Candidate { row, record, error })
    }
}

fn cell_text(cell: Option<&Data>) -> String {
    let text = match cell {
        None | Some(Data::Empty) | Some(Data::Error(_)) => return String::new(),
        Some(Data::String(s)) => s.trim().to_string(),
        // ids typed as numbers come back as floats
        Some(Data::Float(f)) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Some(other) => other.to_string().trim().to_string(),
    };
    if text.eq_ignore_ascii_case("nan") {
        String::new()
    } else {
        text
    }
}

fn cell_number(cell: Option<&Data>) -> Option<f64> {
    match cell? {
        Data::Float(f) => Some(*f),
        Data::Int(i) => Some(*i as f64),
        Data::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Reads candidate rows from a worksheet whose first row is the header.
pub fn candidates_from_range(range: &Range<Data>) -> Result<Vec<Candidate>> {
    let mut rows = range.rows();
    let header = rows.next().context("spreadsheet has no header row")?;
    let columns = Columns::locate(header)?;
    debug!(?columns, "located spreadsheet columns");

    let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);
    Ok(rows
        .enumerate()
        .filter_map(|(i, cells)| columns.candidate(first_row + i + 2, cells))
        .collect())
}

/// Loads candidates from `sheet`, or from the first worksheet when no name is given.
#[instrument(level = "debug")]
pub fn read_candidates(path: &Path, sheet: Option<&str>) -> Result<Vec<Candidate>> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("failed to open spreadsheet {}", path.display()))?;

    let range = match sheet {
        Some(name) => workbook
            .worksheet_range(name)
            .with_context(|| format!("failed to read worksheet {name:?}"))?,
        None => workbook
            .worksheet_range_at(0)
            .context("spreadsheet has no worksheets")?
            .context("failed to read first worksheet")?,
    };

    let candidates = candidates_from_range(&range)?;
    let skipped = candidates.iter().filter(|c| c.error.is_some()).count();
    info!(
        rows = candidates.len(),
        skipped,
        "loaded candidates from {}",
        path.display()
    );
    Ok(candidates)
}
