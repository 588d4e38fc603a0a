//! Dimension load stages.
//!
//! Dimensions are always fully re-evaluated: extract every current source
//! row, derive attributes, and upsert by natural key. There is no change
//! history — prior attribute values are overwritten.

use chrono::NaiveDate;
use tracing::info;

use granary_core::{
  calendar, measures,
  measures::AgeGroup,
  model::{
    CustomerDim, LocationDim, LocationKey, LocationKind, ProductDim,
    SourceCustomer, SourceProduct, SourceSupplier, SupplierDim,
  },
  region::RegionMap,
  store::{SourceStore, Warehouse},
};

use crate::{
  DateRange, Error, Result,
  report::{Stage, StageReport},
};

// ─── Transforms ──────────────────────────────────────────────────────────────

/// Derive the customer dimension row; `today` anchors age and tenure.
pub fn customer_dim(src: SourceCustomer, today: NaiveDate) -> CustomerDim {
  let age = src.date_of_birth.map(|dob| measures::age_in_years(dob, today));
  let years = src
    .registration_date
    .map(|reg| measures::years_as_customer(reg, today));
  let is_active = src.status == "Active";

  CustomerDim {
    customer_id:       src.customer_id,
    full_name:         format!("{} {}", src.first_name, src.last_name),
    first_name:        src.first_name,
    last_name:         src.last_name,
    email:             src.email,
    phone:             src.phone,
    date_of_birth:     src.date_of_birth,
    age,
    age_group:         age.map(AgeGroup::from_age),
    gender:            src.gender,
    city:              src.city,
    state:             src.state,
    country:           src.country,
    postal_code:       src.postal_code,
    registration_date: src.registration_date,
    status:            src.status,
    years_as_customer: years,
    is_active,
  }
}

pub fn product_dim(src: SourceProduct) -> ProductDim {
  let margin = measures::profit_margin(src.unit_price, src.cost_price);
  let margin_percent = measures::profit_margin_percent(margin, src.unit_price);

  ProductDim {
    product_id:            src.product_id,
    product_code:          src.product_code,
    product_name:          src.product_name,
    description:           src.description,
    category_id:           src.category_id,
    category_name:         src.category_name,
    parent_category_id:    src.parent_category_id,
    parent_category_name:  src.parent_category_name,
    supplier_id:           src.supplier_id,
    supplier_name:         src.supplier_name,
    unit_price:            src.unit_price,
    cost_price:            src.cost_price,
    profit_margin:         margin,
    profit_margin_percent: margin_percent,
    weight_kg:             src.weight_kg,
    dimensions:            src.dimensions,
    status:                src.status,
  }
}

pub fn supplier_dim(src: SourceSupplier) -> SupplierDim {
  SupplierDim {
    supplier_id:    src.supplier_id,
    supplier_name:  src.supplier_name,
    contact_person: src.contact_person,
    email:          src.email,
    phone:          src.phone,
    city:           src.city,
    state:          src.state,
    country:        src.country,
    postal_code:    src.postal_code,
  }
}

pub fn location_dim(key: LocationKey, regions: &RegionMap) -> LocationDim {
  let region = regions.region_for(&key.state).to_owned();
  LocationDim { key, kind: LocationKind::Shipping, region }
}

// ─── Load stages ─────────────────────────────────────────────────────────────

/// Materialise the date dimension over the configured range.
pub async fn load_dates<W: Warehouse>(
  warehouse: &W,
  range: &DateRange,
) -> Result<StageReport> {
  let rows = calendar::generate(range.start, range.end)?;
  let extracted = rows.len();
  let loaded = warehouse.upsert_dates(rows).await.map_err(Error::load)?;

  info!(extracted, loaded, "date dimension loaded");
  Ok(StageReport::complete(Stage::DateDimension, extracted, loaded))
}

pub async fn load_customers<S, W>(
  source: &S,
  warehouse: &W,
  today: NaiveDate,
) -> Result<StageReport>
where
  S: SourceStore,
  W: Warehouse,
{
  let records = source.customers().await.map_err(Error::extract)?;
  let extracted = records.len();

  let rows = records
    .into_iter()
    .map(|src| customer_dim(src, today))
    .collect();
  let loaded = warehouse.upsert_customers(rows).await.map_err(Error::load)?;

  info!(extracted, loaded, "customer dimension loaded");
  Ok(StageReport::complete(Stage::CustomerDimension, extracted, loaded))
}

pub async fn load_products<S, W>(source: &S, warehouse: &W) -> Result<StageReport>
where
  S: SourceStore,
  W: Warehouse,
{
  let records = source.products().await.map_err(Error::extract)?;
  let extracted = records.len();

  let rows = records.into_iter().map(product_dim).collect();
  let loaded = warehouse.upsert_products(rows).await.map_err(Error::load)?;

  info!(extracted, loaded, "product dimension loaded");
  Ok(StageReport::complete(Stage::ProductDimension, extracted, loaded))
}

pub async fn load_suppliers<S, W>(source: &S, warehouse: &W) -> Result<StageReport>
where
  S: SourceStore,
  W: Warehouse,
{
  let records = source.suppliers().await.map_err(Error::extract)?;
  let extracted = records.len();

  let rows = records.into_iter().map(supplier_dim).collect();
  let loaded = warehouse.upsert_suppliers(rows).await.map_err(Error::load)?;

  info!(extracted, loaded, "supplier dimension loaded");
  Ok(StageReport::complete(Stage::SupplierDimension, extracted, loaded))
}

/// Bulk-load locations from distinct shipping addresses seen on orders.
/// Addresses discovered later, mid-fact-load, go through the resolver's
/// create path with the same region mapping.
pub async fn load_locations<S, W>(
  source: &S,
  warehouse: &W,
  regions: &RegionMap,
) -> Result<StageReport>
where
  S: SourceStore,
  W: Warehouse,
{
  let keys = source.shipping_locations().await.map_err(Error::extract)?;
  let extracted = keys.len();

  let rows = keys
    .into_iter()
    .map(|key| location_dim(key, regions))
    .collect();
  let loaded = warehouse.upsert_locations(rows).await.map_err(Error::load)?;

  info!(extracted, loaded, "location dimension loaded");
  Ok(StageReport::complete(Stage::LocationDimension, extracted, loaded))
}

// ─── Tests ───────────────────────────────────────────────────────────────────
