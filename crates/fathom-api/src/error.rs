//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection},
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

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("too many requests: {0}")]
  TooManyRequests(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
      ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Conflict(_) => StatusCode::CONFLICT,
      ApiError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
      ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    ApiError::Store(Box::new(e))
  }
}

impl From<fathom_core::Error> for ApiError {
  fn from(e: fathom_core::Error) -> Self {
    use fathom_core::Error as E;
    match e {
      E::Validation(m) => ApiError::BadRequest(m),
      E::Forbidden(m) => ApiError::Forbidden(m),
      e @ (E::ObservationNotFound(_) | E::SpeciesNotFound(_) | E::SubjectNotFound(_)) => {
        ApiError::NotFound(e.to_string())
      }
      e @ E::SelfModeration => ApiError::BadRequest(e.to_string()),
      e @ E::AlreadyModerated(_) => ApiError::Conflict(e.to_string()),
      e @ E::Throttled { .. } => ApiError::TooManyRequests(e.to_string()),
      E::Store(e) => ApiError::Store(e),
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(r: JsonRejection) -> Self { ApiError::BadRequest(r.body_text()) }
}

impl From<PathRejection> for ApiError {
  fn from(r: PathRejection) -> Self { ApiError::BadRequest(r.body_text()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let message = match &self {
      ApiError::Unauthorized(m)
      | ApiError::Forbidden(m)
      | ApiError::NotFound(m)
      | ApiError::BadRequest(m)
      | ApiError::Conflict(m)
      | ApiError::TooManyRequests(m) => m.clone(),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "request failed in the store");
        "internal server error".to_owned()
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
