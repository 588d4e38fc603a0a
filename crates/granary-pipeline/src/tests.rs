use std::collections::HashMap;

use chrono::NaiveDate;

use granary_core::{
  model::{LocationKey, LocationKind},
  region::RegionMap,
  store::Warehouse as _,
};
use granary_store_sqlite::{SqliteSource, SqliteWarehouse};

use crate::{
  DateRange, Error, EtlConfig, EtlPipeline, LoadMode, WarehouseLocation,
  dimensions, facts, report::Stage, resolver::DimensionResolver,
};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn test_config() -> EtlConfig {
  EtlConfig {
    source_db:         "unused".into(),
    warehouse_db:      "unused".into(),
    date_range:        DateRange { start: d(2024, 1, 1), end: d(2024, 12, 31) },
    regions:           HashMap::new(),
    default_warehouse: WarehouseLocation::default(),
    snapshot_date:     Some(d(2024, 6, 15)),
  }
}

#[test]
fn config_validation_rejects_empty_connection_parameters() {
  let mut config = test_config();
  config.source_db = "".into();
  assert!(matches!(config.validate(), Err(Error::Config(_))));

  let mut config = test_config();
  config.warehouse_db = "".into();
  assert!(matches!(config.validate(), Err(Error::Config(_))));
}

#[test]
fn config_validation_rejects_inverted_date_range() {
  let mut config = test_config();
  config.date_range = DateRange { start: d(2024, 6, 1), end: d(2024, 1, 1) };
  assert!(matches!(config.validate(), Err(Error::Config(_))));
}

#[test]
fn config_validation_accepts_well_formed_config() {
  assert!(test_config().validate().is_ok());
}

/// Two customers, two products under a category tree, one supplier, two
/// orders (Jan and Mar 2024) with three lines total, and stock for both
/// products.
async fn seeded_source() -> SqliteSource {
  let source = SqliteSource::open_in_memory().await.unwrap();
  source
    .execute_batch(
      "INSERT INTO customers VALUES
         (1, 'Ada', 'Lovelace', 'ada@example.com', NULL, '1990-01-15', 'F',
          'Austin', 'TX', 'US', '78701', '2020-02-01', 'Active'),
         (2, 'Grace', 'Hopper', NULL, NULL, NULL, NULL,
          'Chicago', 'IL', 'US', '60601', '2021-07-01', 'Inactive');

       INSERT INTO categories VALUES
         (1, 'Electronics', NULL),
         (2, 'Audio', 1);

       INSERT INTO suppliers VALUES
         (7, 'Acme Supply', 'Wile E.', 'sales@acme.test', NULL,
          'Reno', 'NV', 'US', '89501');

       INSERT INTO products VALUES
         (11, 'SKU-11', 'Headphones', NULL, 2, 7, 50.0, 20.0, 0.3, NULL,
          'Active'),
         (12, 'SKU-12', 'Speaker', NULL, 2, 7, 80.0, 35.0, 1.1, NULL,
          'Active');

       INSERT INTO orders VALUES
         (100, 1, '2024-01-10', 'Delivered', 'Paid', 'Card',
          130.0, 10.0, 5.0, 'US', 'TX', 'Austin', '78701'),
         (101, 2, '2024-03-05', 'Shipped', 'Paid', 'Card',
          80.0, 6.0, 4.0, 'US', 'IL', 'Chicago', '60601');

       INSERT INTO order_items VALUES
         (1000, 100, 11, 1, 50.0, 0.0, 50.0),
         (1001, 100, 12, 1, 80.0, 0.0, 80.0),
         (1002, 101, 12, 1, 80.0, 10.0, 72.0);

       INSERT INTO inventory VALUES
         (11, 100, 20, 40, '2024-05-01', 'A-3'),
         (12, 0, 10, 30, NULL, 'B-1');",
    )
    .await
    .unwrap();
  source
}

#[tokio::test]
async fn full_run_loads_every_stage() {
  let source = seeded_source().await;
  let warehouse = SqliteWarehouse::open_in_memory().await.unwrap();

  let pipeline = EtlPipeline::new(source, warehouse.clone(), &test_config());
  let report = pipeline.run(LoadMode::Full).await.unwrap();

  assert_eq!(report.stages.len(), 7);
  assert_eq!(report.stage(Stage::DateDimension).unwrap().loaded, 366);
  assert_eq!(report.stage(Stage::CustomerDimension).unwrap().loaded, 2);
  assert_eq!(report.stage(Stage::ProductDimension).unwrap().loaded, 2);
  assert_eq!(report.stage(Stage::SupplierDimension).unwrap().loaded, 1);
  assert_eq!(report.stage(Stage::LocationDimension).unwrap().loaded, 2);
  assert_eq!(report.stage(Stage::SalesFacts).unwrap().loaded, 3);
  assert_eq!(report.stage(Stage::InventoryFacts).unwrap().loaded, 2);
  assert_eq!(report.total_skipped(), 0);

  // The default warehouse location was created during the inventory stage.
  let key = WarehouseLocation::default().key();
  assert!(warehouse.find_location(key).await.unwrap().is_some());
}

#[tokio::test]
async fn rerun_preserves_surrogate_keys_and_adds_nothing() {
  let source = seeded_source().await;
  let warehouse = SqliteWarehouse::open_in_memory().await.unwrap();
  let config = test_config();

  let first = EtlPipeline::new(source.clone(), warehouse.clone(), &config);
  first.run(LoadMode::Full).await.unwrap();
  let keys_before = warehouse.customer_keys().await.unwrap();

  let second = EtlPipeline::new(source, warehouse.clone(), &config);
  let report = second.run(LoadMode::Full).await.unwrap();

  let keys_after = warehouse.customer_keys().await.unwrap();
  assert_eq!(keys_before, keys_after);
  // Dates and locations conflict away; sale lines are already present.
  assert_eq!(report.stage(Stage::DateDimension).unwrap().loaded, 0);
  assert_eq!(report.stage(Stage::LocationDimension).unwrap().loaded, 0);
  assert_eq!(report.stage(Stage::SalesFacts).unwrap().loaded, 0);
  // The inventory snapshot overwrites in place.
  assert_eq!(report.stage(Stage::InventoryFacts).unwrap().loaded, 2);
}

#[tokio::test]
async fn incremental_run_loads_only_past_the_watermark() {
  let source = seeded_source().await;
  let warehouse = SqliteWarehouse::open_in_memory().await.unwrap();
  let config = test_config();

  let first = EtlPipeline::new(source.clone(), warehouse.clone(), &config);
  first.run(LoadMode::Full).await.unwrap();
  assert_eq!(warehouse.latest_sale_date().await.unwrap(), Some(d(2024, 3, 5)));

  // A new order lands after the watermark.
  source
    .execute_batch(
      "INSERT INTO orders VALUES
         (102, 1, '2024-04-20', 'Pending', 'Unpaid', 'Card',
          50.0, 4.0, 3.0, 'US', 'TX', 'Austin', '78701');
       INSERT INTO order_items VALUES
         (1003, 102, 11, 1, 50.0, 0.0, 50.0);",
    )
    .await
    .unwrap();

  let second = EtlPipeline::new(source.clone(), warehouse.clone(), &config);
  let report = second.run(LoadMode::Incremental).await.unwrap();
  let sales = report.stage(Stage::SalesFacts).unwrap();
  assert_eq!(sales.extracted, 1);
  assert_eq!(sales.loaded, 1);

  // Nothing new: the next incremental run extracts zero lines.
  let third = EtlPipeline::new(source, warehouse, &config);
  let report = third.run(LoadMode::Incremental).await.unwrap();
  assert_eq!(report.stage(Stage::SalesFacts).unwrap().extracted, 0);
}

#[tokio::test]
async fn sale_line_with_unknown_product_is_skipped() {
  let source = seeded_source().await;
  let warehouse = SqliteWarehouse::open_in_memory().await.unwrap();
  let regions = RegionMap::builtin();

  dimensions::load_dates(
    &warehouse,
    &DateRange { start: d(2024, 1, 1), end: d(2024, 12, 31) },
  )
  .await
  .unwrap();
  dimensions::load_customers(&source, &warehouse, d(2024, 6, 15))
    .await
    .unwrap();
  dimensions::load_products(&source, &warehouse).await.unwrap();
  dimensions::load_suppliers(&source, &warehouse).await.unwrap();
  dimensions::load_locations(&source, &warehouse, &regions)
    .await
    .unwrap();

  // A product that appears on an order but was never dimensioned.
  source
    .execute_batch(
      "INSERT INTO products VALUES
         (99, 'SKU-99', 'Phantom', NULL, NULL, NULL, 10.0, 5.0, NULL, NULL,
          'Active');
       INSERT INTO order_items VALUES
         (1004, 100, 99, 2, 10.0, 0.0, 20.0);",
    )
    .await
    .unwrap();

  let mut resolver = DimensionResolver::build(&warehouse, &regions)
    .await
    .unwrap();
  let report =
    facts::load_sales(&source, &warehouse, &mut resolver, LoadMode::Full)
      .await
      .unwrap();

  assert_eq!(report.extracted, 4);
  assert_eq!(report.loaded, 3);
  assert_eq!(report.skipped, 1);
}

#[tokio::test]
async fn locations_created_during_fact_load_resolve_to_one_row() {
  let warehouse = SqliteWarehouse::open_in_memory().await.unwrap();
  let regions = RegionMap::builtin();

  let mut resolver = DimensionResolver::build(&warehouse, &regions)
    .await
    .unwrap();
  let key = LocationKey::new("US", "WA", "Seattle", "98101");
  let first = resolver
    .location(&key, LocationKind::Shipping)
    .await
    .unwrap();
  let second = resolver
    .location(&key, LocationKind::Shipping)
    .await
    .unwrap();
  assert_eq!(first, second);
  assert_eq!(warehouse.find_location(key).await.unwrap(), Some(first));
}

#[tokio::test]
async fn order_date_outside_dimension_range_fails_the_sales_stage() {
  let source = seeded_source().await;
  source
    .execute_batch(
      "INSERT INTO orders VALUES
         (103, 1, '2025-01-02', 'Pending', 'Unpaid', 'Card',
          50.0, 4.0, 3.0, 'US', 'TX', 'Austin', '78701');
       INSERT INTO order_items VALUES
         (1005, 103, 11, 1, 50.0, 0.0, 50.0);",
    )
    .await
    .unwrap();
  let warehouse = SqliteWarehouse::open_in_memory().await.unwrap();

  let pipeline = EtlPipeline::new(source, warehouse.clone(), &test_config());
  let err = pipeline.run(LoadMode::Full).await.unwrap_err();
  assert_eq!(err.stage, Stage::SalesFacts);

  // Stages committed before the failure stay durable.
  assert_eq!(warehouse.customer_keys().await.unwrap().len(), 2);
  assert_eq!(warehouse.product_keys().await.unwrap().len(), 2);
}
