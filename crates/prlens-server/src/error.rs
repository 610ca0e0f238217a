use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use prlens_core::PrLensError;
use serde_json::json;

/// Error returned by request handlers.
///
/// Every pipeline failure becomes a single `500 {"detail": "<message>"}`
/// response; no partial results are sent.
#[derive(Debug)]
pub struct ApiError(pub PrLensError);

impl From<PrLensError> for ApiError {
    fn from(err: PrLensError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "detail": self.0.to_string(),
        }));

        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}
