use std::sync::Arc;

use axum::{http::Request, routing::get, Router};
use tokio::sync::Mutex;
use tower_http::{
    trace::{DefaultOnResponse, TraceLayer},
    LatencyUnit,
};
use tracing::debug_span;

use crate::config::Config;

mod health;
mod run;

pub struct AppState {
    pub config: Config,
    // held for the duration of a run
    pub running: Mutex<()>,
}

pub fn make_app(config: Config) -> Router {
    router(Arc::new(AppState {
        config,
        running: Mutex::new(()),
    }))
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/run_scrape_and_map", get(run::run_scrape_and_map))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    debug_span!(
                        "request",
                        method = %request.method(),
                        uri = %request.uri(),
                    )
                })
                .on_response(DefaultOnResponse::new().latency_unit(LatencyUnit::Micros)),
        )
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::StatusCode,
    };
    use clap::Parser;
    use tower::ServiceExt;

    use super::*;

    #[derive(Parser)]
    struct TestArgs {
        #[command(flatten)]
        config: Config,
    }

    fn config(dir: &std::path::Path) -> Config {
        let input = dir.join("missing.xlsx");
        let database = dir.join("hotels.sqlite3");
        TestArgs::try_parse_from([
            "backend".to_string(),
            format!("--input-path={}", input.display()),
            format!("--database-url={}", database.display()),
        ])
        .unwrap()
        .config
    }

    #[tokio::test]
    async fn health_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let response = make_app(config(dir.path()))
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn failed_run_reports_error_json() {
        let dir = tempfile::tempdir().unwrap();
        let response = make_app(config(dir.path()))
            .oneshot(
                Request::get("/run_scrape_and_map")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "error");
        assert!(json["message"]
            .as_str()
            .unwrap()
            .contains("failed to open spreadsheet"));
    }

    #[tokio::test]
    async fn run_in_progress_is_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let state = Arc::new(AppState {
            config: config(dir.path()),
            running: Mutex::new(()),
        });
        let _running = state.running.lock().await;

        let response = router(state.clone())
            .oneshot(
                Request::get("/run_scrape_and_map")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "Conflict");
        // nothing ran, so no database was created
        assert!(!dir.path().join("hotels.sqlite3").exists());
    }
}
