use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use tracing::{info, instrument, warn};

use crate::{
    common::{AppError, StatusBody},
    pipeline,
};

use super::AppState;

/// Runs a full scrape-and-map batch. One run at a time; a second request gets 409.
#[instrument(level = "debug", skip(state))]
pub async fn run_scrape_and_map(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusBody>, AppError> {
    let Ok(_running) = state.running.try_lock() else {
        warn!("rejecting run request, a run is already in progress");
        return Err(StatusCode::CONFLICT.into());
    };

    let (summary, results) = pipeline::run(&state.config).await?;
    info!(run_id = %summary.run_id, count = results.len(), "run finished");

    Ok(Json(StatusBody {
        status: "success",
        count: Some(results.len()),
        message: "Scraping and mapping completed successfully".to_string(),
    }))
}
