use std::sync::LazyLock;

use itertools::Itertools;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use url::Url;

use crate::hotel::{parse_address_components, Coordinates, HotelRecord, Source};

fn selector(s: &str) -> Selector {
    Selector::parse(s).expect("hardcoded selector should parse")
}

static HOTEL_LINK: LazyLock<Selector> = LazyLock::new(|| selector("a[href*='/en/hotels/']"));
static HEADING: LazyLock<Selector> = LazyLock::new(|| selector("h1"));
static ADDRESS: LazyLock<[Selector; 3]> = LazyLock::new(|| {
    [
        selector("a[href*='google.com/maps'] span"),
        selector("div[data-testid='hotel-address']"),
        selector("a[href*='google.com/maps']"),
    ]
});
static MAPS_LINK: LazyLock<Selector> = LazyLock::new(|| selector("a[href*='google.com/maps']"));
static META_LATITUDE: LazyLock<Selector> =
    LazyLock::new(|| selector("meta[property='place:location:latitude']"));
static META_LONGITUDE: LazyLock<Selector> =
    LazyLock::new(|| selector("meta[property='place:location:longitude']"));
static JSON_LD: LazyLock<Selector> =
    LazyLock::new(|| selector("script[type='application/ld+json']"));
// both halves need a fraction, so "house number, postcode" in an address query never matches
static LAT_LON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\d.])(-?\d{1,2}\.\d+)\s*,\s*(-?\d{1,3}\.\d+)(?:$|[^\d.])")
        .expect("hardcoded regex should compile")
});

fn element_text(element: ElementRef) -> String {
    element.text().flat_map(str::split_whitespace).join(" ")
}

/// Property page links on a location page, absolute and in first-seen order.
pub fn hotel_links(html: &str, base: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    document
        .select(&HOTEL_LINK)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| base.join(href.trim()).ok())
        .map(|mut url| {
            url.set_fragment(None);
            url
        })
        .unique()
        .collect()
}

/// Extracts a scraped record from a property page. Returns `None` for pages carrying neither a
/// hotel name nor an address.
pub fn parse_property(html: &str, url: &str) -> Option<HotelRecord> {
    let document = Html::parse_document(html);

    let name = document
        .select(&HEADING)
        .next()
        .map(element_text)
        .unwrap_or_default();

    let address = ADDRESS
        .iter()
        .flat_map(|s| document.select(s))
        .map(element_text)
        .find(|text| !text.is_empty())
        .unwrap_or_default();

    if name.is_empty() && address.is_empty() {
        return None;
    }

    let parts = parse_address_components(&address);
    Some(
        HotelRecord::new(Source::Scraped, name, address)
            .with_url(url)
            .with_coordinates(coordinates(&document))
            .with_region(parts.city, parts.state, parts.country),
    )
}

fn coordinates(document: &Html) -> Option<Coordinates> {
    meta_coordinates(document)
        .or_else(|| json_ld_coordinates(document))
        .or_else(|| maps_link_coordinates(document))
}

fn meta_coordinates(document: &Html) -> Option<Coordinates> {
    let content = |s: &Selector| {
        document
            .select(s)
            .next()
            .and_then(|m| m.value().attr("content"))
    };
    Coordinates::parse(content(&META_LATITUDE)?, content(&META_LONGITUDE)?)
}

fn json_ld_coordinates(document: &Html) -> Option<Coordinates> {
    document
        .select(&JSON_LD)
        .filter_map(|script| serde_json::from_str::<Value>(&script.text().collect::<String>()).ok())
        .find_map(|value| find_geo(&value))
}

fn json_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Depth-first search for a `{latitude, longitude}` object, e.g. schema.org `Hotel.geo`.
fn find_geo(value: &Value) -> Option<Coordinates> {
    match value {
        Value::Object(map) => {
            if let (Some(lat), Some(lon)) = (map.get("latitude"), map.get("longitude")) {
                if let Some(c) = Coordinates::from_parts(json_number(lat), json_number(lon)) {
                    return Some(c);
                }
            }
            map.get("geo")
                .and_then(find_geo)
                .or_else(|| map.values().find_map(find_geo))
        }
        Value::Array(items) => items.iter().find_map(find_geo),
        _ => None,
    }
}

fn maps_link_coordinates(document: &Html) -> Option<Coordinates> {
    document
        .select(&MAPS_LINK)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| Url::parse(href).ok())
        .find_map(|url| {
            // query values are percent-decoded by query_pairs, "40.7%2C-74.0" included
            let mut haystacks: Vec<String> = url
                .query_pairs()
                .filter(|(k, _)| matches!(k.as_ref(), "q" | "query" | "ll" | "daddr" | "destination"))
                .map(|(_, v)| v.into_owned())
                .collect();
            haystacks.push(url.path().to_string());

            haystacks.iter().find_map(|text| {
                let captures = LAT_LON.captures(text)?;
                Coordinates::parse(captures.get(1)?.as_str(), captures.get(2)?.as_str())
            })
        })
}
