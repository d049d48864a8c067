//! Error types for `gavel-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::request::RequestStatus;

#[derive(Debug, Error)]
pub enum Error {
  #[error("validation failed on `{field}`: {message}")]
  Validation {
    field:   &'static str,
    message: String,
  },

  /// An identity-verification request already exists for the user and is not
  /// in a resubmittable state.
  #[error("an active identity-verification request already exists for user {0}")]
  Conflict(Uuid),

  #[error("request not found: {0}")]
  NotFound(Uuid),

  #[error("user not found: {0}")]
  UserNotFound(Uuid),

  #[error("actor does not have the admin role")]
  Forbidden,

  /// The guarded transition matched no pending row: the request already
  /// carries a terminal status.
  #[error("request {id} is already decided ({status})")]
  AlreadyDecided {
    id:     Uuid,
    status: RequestStatus,
  },

  /// Materialization (or a resubmission) was attempted against a request in
  /// the wrong state.
  #[error("request {id} is in state {status}, expected a different state")]
  InvalidState {
    id:     Uuid,
    status: RequestStatus,
  },

  /// The decision stands; turning the approved request into a live entity did
  /// not. Retryable.
  #[error("materialization failed: {0}")]
  Materialization(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend-specific failure as a store passthrough error.
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Error::Store(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
