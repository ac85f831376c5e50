//! End-to-end batch against an in-process fixture site.

use std::{net::SocketAddr, path::Path};

use axum::{http::StatusCode, response::Html, routing::get, Router};
use clap::Parser;
use hotelmap::{config::Config, hotel::MatchResult, pipeline};
use rusqlite::Connection;
use rust_xlsxwriter::Workbook;

const LOCATION_PAGE: &str = r#"
<html><body>
  <h2>Hotels in Chicago</h2>
  <a href="/en/hotels/chicgpt-hilton-chicago/">Hilton Chicago</a>
  <a href="/en/hotels/broken/">Temporarily unavailable</a>
  <a href="/en/hotels/chidtes-embassy-suites-chicago-downtown/#overview">Embassy Suites</a>
  <a href="/en/hotels/chicgpt-hilton-chicago/">Book now</a>
</body></html>
"#;

const HILTON_CHICAGO: &str = r#"
<html><head>
  <meta property="place:location:latitude" content="41.8723">
  <meta property="place:location:longitude" content="-87.6245">
</head><body>
  <h1>Hilton Chicago</h1>
  <a href="https://www.google.com/maps/search/?api=1&query=Hilton+Chicago">
    <span>720 South Michigan Avenue, Chicago, IL 60605, USA</span>
  </a>
</body></html>
"#;

const EMBASSY_SUITES: &str = r#"
<html><head>
  <script type="application/ld+json">
    {"@type": "Hotel", "geo": {"latitude": 41.8927, "longitude": -87.6296}}
  </script>
</head><body>
  <h1>Embassy Suites by Hilton Chicago Downtown</h1>
  <div data-testid="hotel-address">600 North State Street, Chicago, IL 60654, USA</div>
</body></html>
"#;

async fn serve_fixture_site() -> SocketAddr {
    let app = Router::new()
        .route("/en/locations/chicago/", get(|| async { Html(LOCATION_PAGE) }))
        .route(
            "/en/hotels/chicgpt-hilton-chicago/",
            get(|| async { Html(HILTON_CHICAGO) }),
        )
        .route(
            "/en/hotels/chidtes-embassy-suites-chicago-downtown/",
            get(|| async { Html(EMBASSY_SUITES) }),
        )
        .route(
            "/en/hotels/broken/",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    addr
}

fn write_spreadsheet(path: &Path) {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    let header = [
        "Global Property ID",
        "Global Property Name",
        "Property City Name",
        "Property State/Province",
        "Property Country Code",
        "Property Latitude",
        "Property Longitude",
    ];
    for (col, title) in header.iter().enumerate() {
        sheet.write_string(0, col as u16, *title).unwrap();
    }

    let rows: [(&str, &str, Option<(f64, f64)>); 4] = [
        ("CHI01", "Hilton Chicago", Some((41.8723, -87.6245))),
        ("CHI02", "Embassy Suites Chicago Downtown", Some((41.8927, -87.6296))),
        ("CHI03", "Best Western Grant Park", None),
        ("CHI04", "", Some((41.0, -87.0))),
    ];
    for (i, (code, name, coordinates)) in rows.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, *code).unwrap();
        if !name.is_empty() {
            sheet.write_string(row, 1, *name).unwrap();
        }
        sheet.write_string(row, 2, "Chicago").unwrap();
        sheet.write_string(row, 3, "IL").unwrap();
        sheet.write_string(row, 4, "US").unwrap();
        if let Some((lat, lon)) = coordinates {
            sheet.write_number(row, 5, *lat).unwrap();
            sheet.write_number(row, 6, *lon).unwrap();
        }
    }

    workbook.save(path).unwrap();
}

#[derive(Parser)]
struct TestArgs {
    #[command(flatten)]
    config: Config,
}

#[tokio::test]
async fn scrape_match_and_persist() {
    let addr = serve_fixture_site().await;
    let dir = tempfile::tempdir().unwrap();

    let input = dir.path().join("properties.xlsx");
    write_spreadsheet(&input);

    let locations = dir.path().join("locations.json");
    std::fs::write(
        &locations,
        format!(
            r#"[{{"url": "http://{addr}/en/locations/chicago/"}},
                {{"url": "http://{addr}/en/locations/nowhere/"}}]"#
        ),
    )
    .unwrap();

    let database = dir.path().join("hotels.sqlite3");
    let output = dir.path().join("out").join("mapped.json");

    let TestArgs { config } = TestArgs::try_parse_from([
        "mapper".to_string(),
        format!("--database-url=sqlite://{}", database.display()),
        format!("--input-path={}", input.display()),
        format!("--locations-path={}", locations.display()),
        format!("--output-path={}", output.display()),
        "--retry-limit=1".to_string(),
        "--retry-delay-ms=0".to_string(),
        "--fetch-concurrency=2".to_string(),
    ])
    .unwrap();

    let (summary, results) = pipeline::run(&config).await.unwrap();

    assert_eq!(summary.candidates, 4);
    assert_eq!(summary.skipped_rows, 1);
    assert_eq!(summary.scraped, 2);
    assert_eq!(summary.skipped_locations, 1);
    assert_eq!(summary.skipped_pages, 1);
    assert_eq!(summary.matched, 2);
    assert_eq!(summary.unmatched, 2);

    // spreadsheet order is preserved
    let codes: Vec<_> = results
        .iter()
        .map(|r| r.candidate.code.clone().unwrap_or_default())
        .collect();
    assert_eq!(codes, ["CHI01", "CHI02", "CHI03", "CHI04"]);

    let hilton = &results[0];
    assert!(hilton.matched);
    assert_eq!(hilton.score, 1.0);
    assert_eq!(
        hilton.matched_record.as_ref().unwrap().url.as_deref(),
        Some(format!("http://{addr}/en/hotels/chicgpt-hilton-chicago/").as_str())
    );

    let embassy = &results[1];
    assert!(embassy.matched);
    assert_eq!(
        embassy.matched_record.as_ref().unwrap().name,
        "Embassy Suites by Hilton Chicago Downtown"
    );

    assert!(!results[2].matched);
    assert!(results[2].matched_record.is_none());
    assert!(!results[3].matched);
    assert_eq!(results[3].score, 0.0);

    let written: Vec<MatchResult> =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(written, results);

    // a second run updates rows in place
    pipeline::run(&config).await.unwrap();

    let conn = Connection::open(&database).unwrap();
    let (rows, matched): (i64, i64) = conn
        .query_row(
            "SELECT COUNT(*), SUM(matched) FROM hotel_mapped_url",
            (),
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(rows, 4);
    assert_eq!(matched, 2);
}

#[tokio::test]
async fn unreadable_database_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("properties.xlsx");
    write_spreadsheet(&input);

    // a directory can't be opened as a database file
    let TestArgs { config } = TestArgs::try_parse_from([
        "mapper".to_string(),
        format!("--database-url={}", dir.path().display()),
        format!("--input-path={}", input.display()),
    ])
    .unwrap();

    assert!(pipeline::run(&config).await.is_err());
}
