//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("unauthorized: {0}")]
  Unauthorized(String),

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("internal error: {0}")]
  Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<clubhub_core::Error> for ApiError {
  fn from(e: clubhub_core::Error) -> Self {
    use clubhub_core::Error as E;
    match e {
      E::Validation(m) => ApiError::BadRequest(m),
      E::Authorization(m) => ApiError::Forbidden(m),
      not_found @ E::NotFound(_) => ApiError::NotFound(not_found.to_string()),
      E::Storage(source) => ApiError::Internal(source),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, m.clone()),
      ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, m.clone()),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::Internal(e) => {
        error!(error = %e, "request failed in storage");
        // Backend details stay in the log.
        (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_owned())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn core_errors_map_to_status_codes() {
    let cases = [
      (clubhub_core::Error::Validation("x".into()), StatusCode::BAD_REQUEST),
      (clubhub_core::Error::Authorization("x".into()), StatusCode::FORBIDDEN),
      (clubhub_core::Error::NotFound("x".into()), StatusCode::NOT_FOUND),
      (
        clubhub_core::Error::storage(std::io::Error::other("disk")),
        StatusCode::INTERNAL_SERVER_ERROR,
      ),
    ];
    for (err, status) in cases {
      assert_eq!(ApiError::from(err).into_response().status(), status);
    }
  }
}
