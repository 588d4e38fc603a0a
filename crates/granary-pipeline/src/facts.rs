//! Fact load stages.
//!
//! Fact rows carry only surrogate keys. A sale line whose customer, product,
//! or supplier is missing from the key map is skipped with a warning and
//! counted; the stage itself only fails on a storage error.

use chrono::NaiveDate;
use tracing::{info, warn};

use granary_core::{
  calendar, measures,
  model::{InventoryFact, LocationKey, LocationKind, SalesFact, SourceSaleLine},
  store::{SourceStore, Warehouse},
};

use crate::{
  Error, LoadMode, Result,
  report::{Stage, StageReport},
  resolver::DimensionResolver,
};

/// Load sales facts at order-line-item grain.
///
/// In incremental mode extraction starts strictly after the warehouse's
/// latest loaded order date. Lines added to the source under an already
/// loaded order date are therefore not picked up incrementally; a full run
/// recovers them (the line-item uniqueness constraint keeps it idempotent).
pub async fn load_sales<S, W>(
  source: &S,
  warehouse: &W,
  resolver: &mut DimensionResolver<'_, W>,
  mode: LoadMode,
) -> Result<StageReport>
where
  S: SourceStore,
  W: Warehouse,
{
  let watermark = match mode {
    LoadMode::Full => None,
    LoadMode::Incremental => {
      warehouse.latest_sale_date().await.map_err(Error::load)?
    }
  };
  if let Some(after) = watermark {
    info!(%after, "incremental extraction past watermark");
  }

  let lines = source.sales(watermark).await.map_err(Error::extract)?;
  let extracted = lines.len();

  let mut facts = Vec::with_capacity(extracted);
  let mut skipped = 0usize;
  for line in lines {
    match build_sales_fact(&line, resolver).await? {
      Some(fact) => facts.push(fact),
      None => skipped += 1,
    }
  }

  let loaded = warehouse.append_sales(facts).await.map_err(Error::load)?;

  info!(extracted, loaded, skipped, "sales facts loaded");
  Ok(StageReport { stage: Stage::SalesFacts, extracted, loaded, skipped })
}

/// Resolve keys and compute measures for one sale line. `Ok(None)` means the
/// line was skipped for an unresolvable dimension key.
async fn build_sales_fact<W: Warehouse>(
  line: &SourceSaleLine,
  resolver: &mut DimensionResolver<'_, W>,
) -> Result<Option<SalesFact>> {
  let customer_key = match resolver.customer(line.customer_id) {
    Ok(key) => key,
    Err(miss) => {
      warn!(order_id = line.order_id, %miss, "skipping sale line");
      return Ok(None);
    }
  };
  let product_key = match resolver.product(line.product_id) {
    Ok(key) => key,
    Err(miss) => {
      warn!(order_id = line.order_id, %miss, "skipping sale line");
      return Ok(None);
    }
  };
  // An absent supplier id resolves as key 0, which is never in the map.
  let supplier_key = match resolver.supplier(line.supplier_id.unwrap_or_default()) {
    Ok(key) => key,
    Err(miss) => {
      warn!(order_id = line.order_id, %miss, "skipping sale line");
      return Ok(None);
    }
  };
  let location_key = resolver
    .location(&line.shipping_to, LocationKind::Shipping)
    .await?;

  let cost_price = line.cost_price.unwrap_or(0.0);
  let cost_amount = line.quantity as f64 * cost_price;
  let profit_amount = measures::line_profit(line.line_total, line.quantity, cost_price);

  Ok(Some(SalesFact {
    date_key: calendar::date_key(line.order_date),
    customer_key,
    product_key,
    supplier_key,
    location_key,
    order_id: line.order_id,
    order_item_id: line.order_item_id,
    quantity: line.quantity,
    unit_price: line.unit_price,
    discount_percent: line.discount_percent,
    discount_amount: measures::discount_amount(line.line_total, line.discount_percent),
    line_total: line.line_total,
    cost_amount,
    profit_amount,
    profit_margin_percent: measures::profit_percent(profit_amount, line.line_total),
    tax_amount: line.tax_amount,
    shipping_cost: line.shipping_cost,
    order_total: line.order_total,
    order_status: line.order_status.clone(),
    payment_status: line.payment_status.clone(),
    payment_method: line.payment_method.clone(),
    order_date: line.order_date,
  }))
}

/// Load the inventory snapshot at product x snapshot-date grain.
///
/// Every row is booked against the configured default warehouse location,
/// created on first use through the normal location path. Re-running the
/// same snapshot date overwrites measures rather than appending.
pub async fn load_inventory<S, W>(
  source: &S,
  warehouse: &W,
  resolver: &mut DimensionResolver<'_, W>,
  snapshot_date: NaiveDate,
  default_location: &LocationKey,
) -> Result<StageReport>
where
  S: SourceStore,
  W: Warehouse,
{
  let records = source.inventory().await.map_err(Error::extract)?;
  let extracted = records.len();

  let location_key = resolver
    .location(default_location, LocationKind::Warehouse)
    .await?;
  let date_key = calendar::date_key(snapshot_date);

  let mut facts = Vec::with_capacity(extracted);
  let mut skipped = 0usize;
  for record in records {
    let product_key = match resolver.product(record.product_id) {
      Ok(key) => key,
      Err(miss) => {
        warn!(product_id = record.product_id, %miss, "skipping inventory row");
        skipped += 1;
        continue;
      }
    };
    let supplier_key =
      match resolver.supplier(record.supplier_id.unwrap_or_default()) {
        Ok(key) => key,
        Err(miss) => {
          warn!(product_id = record.product_id, %miss, "skipping inventory row");
          skipped += 1;
          continue;
        }
      };

    let stock_value =
      record.quantity_on_hand as f64 * record.cost_price.unwrap_or(0.0);

    facts.push(InventoryFact {
      date_key,
      product_key,
      supplier_key,
      location_key,
      product_id: record.product_id,
      quantity_on_hand: record.quantity_on_hand,
      reorder_level: record.reorder_level,
      reorder_quantity: record.reorder_quantity,
      quantity_available: record.quantity_on_hand,
      stock_value,
      stock: measures::StockStatus::evaluate(
        record.quantity_on_hand,
        record.reorder_level,
      ),
      warehouse_location: record.warehouse_location,
      last_restocked_date: record.last_restocked_date,
      snapshot_date,
    });
  }

  let loaded = warehouse.upsert_inventory(facts).await.map_err(Error::load)?;

  info!(extracted, loaded, skipped, "inventory facts loaded");
  Ok(StageReport { stage: Stage::InventoryFacts, extracted, loaded, skipped })
}
