//! Error type for `gavel-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] gavel_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown enum value in column: {0:?}")]
  UnknownValue(String),
}

impl Error {
  /// Whether the underlying SQLite failure is a constraint violation — used
  /// to classify duplicate-KYC inserts and the listings uniqueness backstop.
  pub fn is_constraint_violation(&self) -> bool {
    matches!(
      self,
      Error::Database(tokio_rusqlite::Error::Rusqlite(
        rusqlite::Error::SqliteFailure(inner, _),
      )) if inner.code == rusqlite::ErrorCode::ConstraintViolation
    )
  }
}

/// Domain errors pass through untouched; backend failures become
/// [`gavel_core::Error::Store`].
impl From<Error> for gavel_core::Error {
  fn from(err: Error) -> Self {
    match err {
      Error::Core(core) => core,
      other => gavel_core::Error::store(other),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
