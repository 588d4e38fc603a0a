//! Run orchestration.

use std::fmt;

use chrono::{NaiveDate, Utc};
use tracing::{error, info};
use uuid::Uuid;

use granary_core::{
  model::LocationKey,
  region::RegionMap,
  store::{SourceStore, Warehouse},
};

use crate::{
  DateRange, EtlConfig, LoadMode, PipelineError, dimensions, facts,
  report::{RunReport, Stage, StageReport},
  resolver::DimensionResolver,
};

/// Where a run currently stands. Purely observational; transitions are
/// logged, and a run that stops in [`PipelineState::Failed`] leaves every
/// previously committed stage durable.
///
/// There are no connect/close states: the stores arrive already opened
/// through [`EtlPipeline::new`], and [`EtlPipeline::run`] consumes the
/// pipeline, so dropping it closes both connections on every exit path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
  Idle,
  DatesLoaded,
  DimensionsLoaded,
  FactsLoaded,
  Failed,
}

impl PipelineState {
  fn as_str(self) -> &'static str {
    match self {
      Self::Idle => "idle",
      Self::DatesLoaded => "dates_loaded",
      Self::DimensionsLoaded => "dimensions_loaded",
      Self::FactsLoaded => "facts_loaded",
      Self::Failed => "failed",
    }
  }
}

impl fmt::Display for PipelineState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// The warehouse load sequencer.
///
/// Stage order is fixed: the date dimension first, then the business
/// dimensions, then facts once every dimension has committed. The pipeline
/// is consumed by [`EtlPipeline::run`]; both store handles are dropped when
/// the run ends, whatever the outcome.
pub struct EtlPipeline<S, W> {
  source:            S,
  warehouse:         W,
  date_range:        DateRange,
  regions:           RegionMap,
  default_warehouse: LocationKey,
  snapshot_date:     NaiveDate,
}

impl<S, W> EtlPipeline<S, W>
where
  S: SourceStore,
  W: Warehouse,
{
  /// Wire up a pipeline over already opened stores.
  pub fn new(source: S, warehouse: W, config: &EtlConfig) -> Self {
    Self {
      source,
      warehouse,
      date_range: config.date_range,
      regions: RegionMap::with_overrides(&config.regions),
      default_warehouse: config.default_warehouse.key(),
      snapshot_date: config
        .snapshot_date
        .unwrap_or_else(|| Utc::now().date_naive()),
    }
  }

  /// Execute one run and return its report. The first stage error aborts
  /// the run; stages already committed stay in the warehouse.
  pub async fn run(self, mode: LoadMode) -> Result<RunReport, PipelineError> {
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    info!(%run_id, ?mode, "etl run starting");

    let mut state = PipelineState::Idle;
    let mut stages = Vec::new();

    let outcome = self.run_stages(mode, &mut state, &mut stages).await;
    if let Err(err) = outcome {
      state = PipelineState::Failed;
      error!(%run_id, state = %state, stage = %err.stage, "etl run aborted");
      return Err(err);
    }

    let finished_at = Utc::now();
    let report = RunReport { run_id, mode, started_at, finished_at, stages };
    info!(
      %run_id,
      state = %state,
      loaded = report.total_loaded(),
      skipped = report.total_skipped(),
      "etl run complete"
    );
    Ok(report)
  }

  async fn run_stages(
    self,
    mode: LoadMode,
    state: &mut PipelineState,
    stages: &mut Vec<StageReport>,
  ) -> Result<(), PipelineError> {
    let today = self.snapshot_date;

    stages.push(
      dimensions::load_dates(&self.warehouse, &self.date_range)
        .await
        .map_err(|source| PipelineError { stage: Stage::DateDimension, source })?,
    );
    *state = PipelineState::DatesLoaded;
    info!(state = %state, "stage boundary");

    stages.push(
      dimensions::load_customers(&self.source, &self.warehouse, today)
        .await
        .map_err(|source| {
          PipelineError { stage: Stage::CustomerDimension, source }
        })?,
    );
    stages.push(
      dimensions::load_products(&self.source, &self.warehouse)
        .await
        .map_err(|source| {
          PipelineError { stage: Stage::ProductDimension, source }
        })?,
    );
    stages.push(
      dimensions::load_suppliers(&self.source, &self.warehouse)
        .await
        .map_err(|source| {
          PipelineError { stage: Stage::SupplierDimension, source }
        })?,
    );
    stages.push(
      dimensions::load_locations(&self.source, &self.warehouse, &self.regions)
        .await
        .map_err(|source| {
          PipelineError { stage: Stage::LocationDimension, source }
        })?,
    );
    *state = PipelineState::DimensionsLoaded;
    info!(state = %state, "stage boundary");

    // The key map reflects the dimension rows committed above.
    let mut resolver = DimensionResolver::build(&self.warehouse, &self.regions)
      .await
      .map_err(|source| PipelineError { stage: Stage::SalesFacts, source })?;

    stages.push(
      facts::load_sales(&self.source, &self.warehouse, &mut resolver, mode)
        .await
        .map_err(|source| PipelineError { stage: Stage::SalesFacts, source })?,
    );
    stages.push(
      facts::load_inventory(
        &self.source,
        &self.warehouse,
        &mut resolver,
        self.snapshot_date,
        &self.default_warehouse,
      )
      .await
      .map_err(|source| PipelineError { stage: Stage::InventoryFacts, source })?,
    );
    *state = PipelineState::FactsLoaded;
    info!(state = %state, "stage boundary");

    Ok(())
  }
}
