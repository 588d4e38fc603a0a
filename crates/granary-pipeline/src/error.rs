//! Error types for `granary-pipeline`.

use thiserror::Error;

use crate::report::Stage;

/// Errors raised while executing a single stage.
///
/// Row-scoped resolution misses never surface here — they are counted and
/// skipped inside the fact loaders. Anything that does surface aborts the
/// current stage and, through [`PipelineError`], the run.
#[derive(Debug, Error)]
pub enum Error {
  /// Malformed configuration, detected before any connection attempt.
  #[error("configuration error: {0}")]
  Config(String),

  #[error("core error: {0}")]
  Core(#[from] granary_core::Error),

  /// A source extraction query failed.
  #[error("source extract failed: {0}")]
  Extract(#[source] Box<dyn std::error::Error + Send + Sync>),

  /// A warehouse read or batch write failed.
  #[error("warehouse load failed: {0}")]
  Load(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn extract<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Extract(Box::new(err))
  }

  pub fn load<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Load(Box::new(err))
  }
}

/// A failed run: the stage that aborted it plus the underlying cause.
/// Stages committed before `stage` remain durable.
#[derive(Debug, Error)]
#[error("etl stage {stage} failed: {source}")]
pub struct PipelineError {
  pub stage:  Stage,
  #[source]
  pub source: Error,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
