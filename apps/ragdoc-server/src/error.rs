use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ragdoc_core::Error;

/// Error body `{"detail": ..}` with a status derived from the failure kind.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self { Self { status, detail: detail.into() } }

    pub fn bad_request(detail: impl Into<String>) -> Self { Self::new(StatusCode::BAD_REQUEST, detail) }

    pub fn internal(detail: impl Into<String>) -> Self { Self::new(StatusCode::INTERNAL_SERVER_ERROR, detail) }
}

pub fn status_for(e: &Error) -> StatusCode {
    match e {
        Error::InvalidInput(_) | Error::InvalidConfig(_) => StatusCode::BAD_REQUEST,
        Error::Extraction { .. } | Error::EmptyDocument(_) | Error::NoChunks(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::NotPrepared | Error::NotFitted => StatusCode::CONFLICT,
        Error::Embedding(_) => StatusCode::SERVICE_UNAVAILABLE,
        Error::Provider { .. } => StatusCode::BAD_GATEWAY,
        Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self { Self::new(status_for(&e), e.to_string()) }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self { Self::internal(format!("background task failed: {}", e)) }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, detail = %self.detail, "request failed");
        } else {
            tracing::warn!(status = %self.status, detail = %self.detail, "request rejected");
        }
        (self.status, Json(serde_json::json!({ "detail": self.detail }))).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
