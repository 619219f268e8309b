//! Error types for `fathom-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  /// Malformed or out-of-range input.
  #[error("{0}")]
  Validation(String),

  /// The caller's role does not allow the operation.
  #[error("{0}")]
  Forbidden(String),

  #[error("observation not found: {0}")]
  ObservationNotFound(Uuid),

  #[error("species not found: {0}")]
  SpeciesNotFound(Uuid),

  #[error("subject not found: {0}")]
  SubjectNotFound(Uuid),

  #[error("cannot moderate own submission")]
  SelfModeration,

  #[error("observation {0} has already been moderated")]
  AlreadyModerated(Uuid),

  /// The submission throttle rejected the request; `minutes` is the
  /// remaining wait, rounded up.
  #[error("wait {minutes} more minute(s) before submitting on this species again")]
  Throttled { minutes: i64 },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Box a backend error.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
