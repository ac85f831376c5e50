use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

pub enum AppError {
    Anyhow(anyhow::Error),
    Code(StatusCode),
}

#[derive(Debug, Serialize)]
pub struct StatusBody {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    pub message: String,
}

// Errors go out as the same JSON body as a successful run, with status "error".
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (code, message) = match self {
            AppError::Anyhow(error) => {
                error!("{:#}", error);
                (StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", error))
            }
            AppError::Code(c) => (c, c.canonical_reason().unwrap_or_default().to_string()),
        };
        let body = StatusBody {
            status: "error",
            count: None,
            message,
        };
        (code, Json(body)).into_response()
    }
}

impl From<StatusCode> for AppError {
    fn from(err: StatusCode) -> Self {
        Self::Code(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Anyhow(err)
    }
}
