//! Error types for `granary-core`.

use chrono::NaiveDate;
use thiserror::Error;

use crate::keymap::Dimension;

#[derive(Debug, Error)]
pub enum Error {
  /// A fact row references a natural key with no current dimension row.
  /// Row-scoped: the loader skips the row and continues.
  #[error("no current {dimension} dimension row for natural key {natural_key}")]
  UnresolvedKey {
    dimension:   Dimension,
    natural_key: i64,
  },

  #[error("invalid date range: start {start} is after end {end}")]
  InvalidDateRange { start: NaiveDate, end: NaiveDate },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
