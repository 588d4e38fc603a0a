//! The Granary ETL engine.
//!
//! Sequences the warehouse load — date dimension, business dimensions,
//! then facts — over any [`SourceStore`](granary_core::store::SourceStore)
//! and [`Warehouse`](granary_core::store::Warehouse) pair.

pub mod dimensions;
pub mod error;
pub mod facts;
pub mod pipeline;
pub mod report;
pub mod resolver;

#[cfg(test)]
mod tests;

pub use error::{Error, PipelineError, Result};
pub use pipeline::EtlPipeline;

use std::{collections::HashMap, path::PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use granary_core::model::LocationKey;

// ─── Load mode ───────────────────────────────────────────────────────────────

/// How the sales fact stage bounds its extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadMode {
  /// Extract every qualifying source row, unconditionally.
  Full,
  /// Extract only rows past the warehouse's order-date watermark; behaves
  /// as [`LoadMode::Full`] when no facts have been loaded yet.
  Incremental,
}

// ─── Configuration ───────────────────────────────────────────────────────────

/// Inclusive bounds for the date dimension generator.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DateRange {
  pub start: NaiveDate,
  pub end:   NaiveDate,
}

/// The dimension entry inventory snapshots are booked against.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WarehouseLocation {
  pub country:     String,
  pub state:       String,
  pub city:        String,
  pub postal_code: String,
}

impl WarehouseLocation {
  pub fn key(&self) -> LocationKey {
    LocationKey::new(
      self.country.clone(),
      self.state.clone(),
      self.city.clone(),
      self.postal_code.clone(),
    )
  }
}

impl Default for WarehouseLocation {
  fn default() -> Self {
    Self {
      country:     "US".to_owned(),
      state:       String::new(),
      city:        "Primary Warehouse".to_owned(),
      postal_code: String::new(),
    }
  }
}

/// Runtime configuration, deserialised from `granary.toml` (or the path
/// given with `--config`), with `GRANARY_`-prefixed environment overrides.
#[derive(Debug, Clone, Deserialize)]
pub struct EtlConfig {
  /// Source (operational) database connection parameter.
  pub source_db:         PathBuf,
  /// Target (warehouse) database connection parameter.
  pub warehouse_db:      PathBuf,
  pub date_range:        DateRange,
  /// State → region entries layered over the builtin mapping.
  #[serde(default)]
  pub regions:           HashMap<String, String>,
  #[serde(default)]
  pub default_warehouse: WarehouseLocation,
  /// Pins the inventory snapshot date and the "today" used for age and
  /// tenure derivation. Defaults to today (UTC); set it for deterministic
  /// runs and backfills.
  pub snapshot_date:     Option<NaiveDate>,
}

impl EtlConfig {
  /// Reject malformed configuration before any connection is attempted.
  pub fn validate(&self) -> Result<()> {
    if self.source_db.as_os_str().is_empty() {
      return Err(Error::Config("source_db must not be empty".into()));
    }
    if self.warehouse_db.as_os_str().is_empty() {
      return Err(Error::Config("warehouse_db must not be empty".into()));
    }
    if self.date_range.start > self.date_range.end {
      return Err(Error::Config(format!(
        "date_range.start {} is after date_range.end {}",
        self.date_range.start, self.date_range.end
      )));
    }
    if self.default_warehouse.country.is_empty() {
      return Err(Error::Config(
        "default_warehouse.country must not be empty".into(),
      ));
    }
    Ok(())
  }
}
