//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized: {0}")]
  Unauthorized(String),

  #[error("forbidden")]
  Forbidden,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  /// The decision was recorded; creating the entity failed. Surfaced as 502
  /// so admin tooling can offer the retry path.
  #[error("materialization failed: {0}")]
  Materialization(String),

  #[error("internal error: {0}")]
  Internal(String),
}

impl From<gavel_core::Error> for ApiError {
  fn from(err: gavel_core::Error) -> Self {
    use gavel_core::Error as E;
    match err {
      E::Validation { .. } => ApiError::BadRequest(err.to_string()),
      E::Conflict(_) | E::AlreadyDecided { .. } => {
        ApiError::Conflict(err.to_string())
      }
      E::NotFound(_) | E::UserNotFound(_) => ApiError::NotFound(err.to_string()),
      E::Forbidden => ApiError::Forbidden,
      E::InvalidState { .. } => ApiError::BadRequest(err.to_string()),
      E::Materialization(detail) => ApiError::Materialization(detail),
      E::Serialization(_) | E::Store(_) => ApiError::Internal(err.to_string()),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self {
      ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
      ApiError::Forbidden => StatusCode::FORBIDDEN,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Conflict(_) => StatusCode::CONFLICT,
      ApiError::Materialization(_) => StatusCode::BAD_GATEWAY,
      ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": self.to_string() }))).into_response()
  }
}
