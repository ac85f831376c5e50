use tracing::{debug, instrument};

#[instrument(level = "debug")]
pub async fn health() -> &'static str {
    debug!("health");
    "ok"
}
