//! Error type for `granary-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] granary_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  /// An idempotent location insert failed to produce a readable row.
  /// Indicates a broken uniqueness constraint or a concurrent delete.
  #[error("location row vanished after insert: {0:?}")]
  LocationVanished(granary_core::model::LocationKey),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
