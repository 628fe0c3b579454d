use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::escalation::MissingStatusField;
use crate::store::StoreError;

/// Failures surfaced by the HTTP service.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{operation} failed: {source}")]
    Server {
        operation: &'static str,
        #[source]
        source: StoreError,
    },
}

impl ApiError {
    /// Wraps a store failure for the named endpoint.
    pub fn server(operation: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| Self::Server { operation, source }
    }
}

impl From<MissingStatusField> for ApiError {
    fn from(err: MissingStatusField) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::BadRequest(reason) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": reason }))).into_response()
            }
            Self::NotFound(reason) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": reason }))).into_response()
            }
            Self::Server { operation, source } => {
                error!(operation, error = %source, "query failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
            }
        }
    }
}
