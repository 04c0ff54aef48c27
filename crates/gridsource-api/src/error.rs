//! Request-level errors and their HTTP mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use gridsource_protocol::ProtocolError;
use gridsource_registry::RegistryError;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Errors that abort a whole request.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("malformed request: {0}")]
    BadRequest(String),

    #[error("Target must be of type: <finder>:<metric_query>, got instead: {0}")]
    UnqualifiedQuery(String),

    #[error(transparent)]
    Range(#[from] ProtocolError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::UnqualifiedQuery(_) => StatusCode::NOT_FOUND,
            ApiError::Range(_) => StatusCode::BAD_REQUEST,
            ApiError::Registry(RegistryError::UnknownSource { .. }) => StatusCode::NOT_FOUND,
            ApiError::Registry(RegistryError::Backend { .. }) => StatusCode::BAD_GATEWAY,
        }
    }
}

#[derive(serde::Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(error = %self, "request rejected");
        }
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
