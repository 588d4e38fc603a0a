//! Run and stage reports.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::LoadMode;

/// One step of the pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
  DateDimension,
  CustomerDimension,
  ProductDimension,
  SupplierDimension,
  LocationDimension,
  SalesFacts,
  InventoryFacts,
}

impl Stage {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::DateDimension => "date_dimension",
      Self::CustomerDimension => "customer_dimension",
      Self::ProductDimension => "product_dimension",
      Self::SupplierDimension => "supplier_dimension",
      Self::LocationDimension => "location_dimension",
      Self::SalesFacts => "sales_facts",
      Self::InventoryFacts => "inventory_facts",
    }
  }
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Per-stage record counts.
///
/// `loaded` counts rows actually written (for the append-only sales stage
/// this excludes lines already present); `skipped` counts rows dropped for
/// unresolvable dimension keys.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StageReport {
  pub stage:     Stage,
  pub extracted: usize,
  pub loaded:    usize,
  pub skipped:   usize,
}

impl StageReport {
  /// A stage where every extracted record was loaded.
  pub fn complete(stage: Stage, extracted: usize, loaded: usize) -> Self {
    Self { stage, extracted, loaded, skipped: 0 }
  }
}

/// The outcome of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
  pub run_id:      Uuid,
  pub mode:        LoadMode,
  pub started_at:  DateTime<Utc>,
  pub finished_at: DateTime<Utc>,
  pub stages:      Vec<StageReport>,
}

impl RunReport {
  pub fn total_loaded(&self) -> usize {
    self.stages.iter().map(|s| s.loaded).sum()
  }

  pub fn total_skipped(&self) -> usize {
    self.stages.iter().map(|s| s.skipped).sum()
  }

  pub fn stage(&self, stage: Stage) -> Option<&StageReport> {
    self.stages.iter().find(|s| s.stage == stage)
  }
}
