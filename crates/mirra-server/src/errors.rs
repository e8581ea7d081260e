//! HTTP error mapping for the REST layer.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mirra_store::StoreError;
use serde_json::json;
use tracing::error;

/// Errors surfaced by REST handlers, each mapping to a status code and a
/// JSON body of the shape `{"error": "..."}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The path's entity segment names no declared entity.
    #[error("unknown entity: {0}")]
    UnknownEntity(String),
    /// The requested document does not exist.
    #[error("document not found: {0}")]
    NotFound(String),
    /// The request body or query string is malformed.
    #[error("{0}")]
    BadRequest(String),
    /// A document with the same ID already exists.
    #[error("document already exists: {0}")]
    Conflict(String),
    /// A storage operation failed.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::UnknownEntity(_) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Store(ref e) = self {
            error!(error = %e, "storage error in request handler");
        }
        let status = self.status();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_entity_is_404() {
        assert_eq!(
            ApiError::UnknownEntity("widgets".into()).status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn not_found_is_404() {
        assert_eq!(
            ApiError::NotFound("u1".into()).status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn bad_request_is_400() {
        assert_eq!(
            ApiError::BadRequest("nope".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn conflict_is_409() {
        assert_eq!(
            ApiError::Conflict("u1".into()).status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn store_error_is_500() {
        let err = ApiError::Store(StoreError::InvalidDocument("x".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn display_names_the_entity() {
        let err = ApiError::UnknownEntity("widgets".into());
        assert_eq!(err.to_string(), "unknown entity: widgets");
    }
}
