//! Error types for `clubhub-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Malformed input: unknown content type, empty comment, bad reply target.
  #[error("validation failed: {0}")]
  Validation(String),

  /// The caller is authenticated but may not touch this resource.
  #[error("not authorized: {0}")]
  Authorization(String),

  #[error("{0} not found")]
  NotFound(String),

  /// A failure reported by the storage backend.
  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Box any backend error into [`Error::Storage`]; handy with `map_err`.
  pub fn storage<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Storage(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
