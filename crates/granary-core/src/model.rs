//! Record types flowing through the pipeline.
//!
//! Three families: `Source*` records as extracted from the operational
//! system, `*Dim` rows as written to dimension tables, and `*Fact` rows as
//! written to fact tables. Natural keys are source-system `i64` identifiers;
//! surrogate keys are warehouse-assigned and never reused.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::measures::{AgeGroup, StockStatus};

/// Warehouse-internal row identity, stable for the life of the row.
pub type SurrogateKey = i64;

/// Business identifier from the source system.
pub type NaturalKey = i64;

// ─── Location key ────────────────────────────────────────────────────────────

/// Composite natural key of the location dimension.
///
/// Absent components are normalised to the empty string, never NULL, so the
/// storage-layer uniqueness constraint holds (SQLite treats NULLs as
/// distinct in UNIQUE indexes).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationKey {
  pub country:     String,
  pub state:       String,
  pub city:        String,
  pub postal_code: String,
}

impl LocationKey {
  pub fn new(
    country: impl Into<String>,
    state: impl Into<String>,
    city: impl Into<String>,
    postal_code: impl Into<String>,
  ) -> Self {
    Self {
      country:     country.into(),
      state:       state.into(),
      city:        city.into(),
      postal_code: postal_code.into(),
    }
  }
}

// ─── Source records ──────────────────────────────────────────────────────────

/// A customer row as extracted from the operational `customers` table.
#[derive(Debug, Clone)]
pub struct SourceCustomer {
  pub customer_id:       NaturalKey,
  pub first_name:        String,
  pub last_name:         String,
  pub email:             Option<String>,
  pub phone:             Option<String>,
  pub date_of_birth:     Option<NaiveDate>,
  pub gender:            Option<String>,
  pub city:              Option<String>,
  pub state:             Option<String>,
  pub country:           Option<String>,
  pub postal_code:       Option<String>,
  pub registration_date: Option<NaiveDate>,
  pub status:            String,
}

/// A product row joined with its category hierarchy (two levels) and
/// supplier, as extracted from the operational schema.
#[derive(Debug, Clone)]
pub struct SourceProduct {
  pub product_id:           NaturalKey,
  pub product_code:         String,
  pub product_name:         String,
  pub description:          Option<String>,
  pub category_id:          Option<i64>,
  pub category_name:        Option<String>,
  pub parent_category_id:   Option<i64>,
  pub parent_category_name: Option<String>,
  pub supplier_id:          Option<i64>,
  pub supplier_name:        Option<String>,
  pub unit_price:           Option<f64>,
  pub cost_price:           Option<f64>,
  pub weight_kg:            Option<f64>,
  pub dimensions:           Option<String>,
  pub status:               String,
}

#[derive(Debug, Clone)]
pub struct SourceSupplier {
  pub supplier_id:    NaturalKey,
  pub supplier_name:  String,
  pub contact_person: Option<String>,
  pub email:          Option<String>,
  pub phone:          Option<String>,
  pub city:           Option<String>,
  pub state:          Option<String>,
  pub country:        Option<String>,
  pub postal_code:    Option<String>,
}

/// One order line item joined with its order header and product costing.
#[derive(Debug, Clone)]
pub struct SourceSaleLine {
  pub order_id:         i64,
  pub order_item_id:    i64,
  pub order_date:       NaiveDate,
  pub order_status:     String,
  pub payment_status:   String,
  pub payment_method:   String,
  pub order_total:      f64,
  pub tax_amount:       f64,
  pub shipping_cost:    f64,
  pub customer_id:      NaturalKey,
  pub product_id:       NaturalKey,
  pub quantity:         i64,
  pub unit_price:       f64,
  pub discount_percent: f64,
  pub line_total:       f64,
  pub shipping_to:      LocationKey,
  pub cost_price:       Option<f64>,
  pub supplier_id:      Option<i64>,
}

/// The current stock position of one product.
#[derive(Debug, Clone)]
pub struct SourceInventory {
  pub product_id:          NaturalKey,
  pub quantity_on_hand:    i64,
  pub reorder_level:       i64,
  pub reorder_quantity:    i64,
  pub last_restocked_date: Option<NaiveDate>,
  pub warehouse_location:  Option<String>,
  pub supplier_id:         Option<i64>,
  pub cost_price:          Option<f64>,
}

// ─── Dimension rows ──────────────────────────────────────────────────────────

/// A `dim_customer` row ready for upsert by `customer_id`.
#[derive(Debug, Clone)]
pub struct CustomerDim {
  pub customer_id:       NaturalKey,
  pub full_name:         String,
  pub first_name:        String,
  pub last_name:         String,
  pub email:             Option<String>,
  pub phone:             Option<String>,
  pub date_of_birth:     Option<NaiveDate>,
  pub age:               Option<i64>,
  pub age_group:         Option<AgeGroup>,
  pub gender:            Option<String>,
  pub city:              Option<String>,
  pub state:             Option<String>,
  pub country:           Option<String>,
  pub postal_code:       Option<String>,
  pub registration_date: Option<NaiveDate>,
  pub status:            String,
  pub years_as_customer: Option<f64>,
  pub is_active:         bool,
}

/// A `dim_product` row ready for upsert by `product_id`.
#[derive(Debug, Clone)]
pub struct ProductDim {
  pub product_id:            NaturalKey,
  pub product_code:          String,
  pub product_name:          String,
  pub description:           Option<String>,
  pub category_id:           Option<i64>,
  pub category_name:         Option<String>,
  pub parent_category_id:    Option<i64>,
  pub parent_category_name:  Option<String>,
  pub supplier_id:           Option<i64>,
  pub supplier_name:         Option<String>,
  pub unit_price:            Option<f64>,
  pub cost_price:            Option<f64>,
  pub profit_margin:         f64,
  pub profit_margin_percent: f64,
  pub weight_kg:             Option<f64>,
  pub dimensions:            Option<String>,
  pub status:                String,
}

#[derive(Debug, Clone)]
pub struct SupplierDim {
  pub supplier_id:    NaturalKey,
  pub supplier_name:  String,
  pub contact_person: Option<String>,
  pub email:          Option<String>,
  pub phone:          Option<String>,
  pub city:           Option<String>,
  pub state:          Option<String>,
  pub country:        Option<String>,
  pub postal_code:    Option<String>,
}

/// Where a location entered the warehouse from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationKind {
  Shipping,
  Warehouse,
}

impl LocationKind {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Shipping => "Shipping",
      Self::Warehouse => "Warehouse",
    }
  }
}

/// A `dim_location` row; inserted if the composite key is absent, otherwise
/// left untouched (the existing surrogate key is reused).
#[derive(Debug, Clone)]
pub struct LocationDim {
  pub key:    LocationKey,
  pub kind:   LocationKind,
  pub region: String,
}

/// One calendar day of the date dimension, keyed by `YYYYMMDD`.
#[derive(Debug, Clone)]
pub struct DateRow {
  pub date_key:       i64,
  pub full_date:      NaiveDate,
  /// ISO weekday number, Monday = 1 .. Sunday = 7.
  pub day_of_week:    u32,
  pub day_name:       String,
  pub day_of_month:   u32,
  pub day_of_year:    u32,
  pub week_of_year:   u32,
  pub month_number:   u32,
  pub month_name:     String,
  pub quarter_number: u32,
  pub quarter_name:   String,
  pub year_number:    i32,
  pub is_weekend:     bool,
  /// Extension point; always false for now.
  pub is_holiday:     bool,
}

// ─── Fact rows ───────────────────────────────────────────────────────────────

/// One sales fact at order-line-item grain, with all dimension keys resolved
/// and all measures computed. Append-only; `(order_id, order_item_id)` is
/// unique so a full re-load does not duplicate lines.
#[derive(Debug, Clone)]
pub struct SalesFact {
  pub date_key:              i64,
  pub customer_key:          SurrogateKey,
  pub product_key:           SurrogateKey,
  pub supplier_key:          SurrogateKey,
  pub location_key:          SurrogateKey,
  pub order_id:              i64,
  pub order_item_id:         i64,
  pub quantity:              i64,
  pub unit_price:            f64,
  pub discount_percent:      f64,
  pub discount_amount:       f64,
  pub line_total:            f64,
  pub cost_amount:           f64,
  pub profit_amount:         f64,
  pub profit_margin_percent: f64,
  pub tax_amount:            f64,
  pub shipping_cost:         f64,
  pub order_total:           f64,
  pub order_status:          String,
  pub payment_status:        String,
  pub payment_method:        String,
  pub order_date:            NaiveDate,
}

/// One inventory fact at product × snapshot-date grain. Upserted: re-running
/// the same snapshot date overwrites the measure columns.
#[derive(Debug, Clone)]
pub struct InventoryFact {
  pub date_key:            i64,
  pub product_key:         SurrogateKey,
  pub supplier_key:        SurrogateKey,
  pub location_key:        SurrogateKey,
  pub product_id:          NaturalKey,
  pub quantity_on_hand:    i64,
  pub reorder_level:       i64,
  pub reorder_quantity:    i64,
  pub quantity_available:  i64,
  pub stock_value:         f64,
  pub stock:               StockStatus,
  pub warehouse_location:  Option<String>,
  pub last_restocked_date: Option<NaiveDate>,
  pub snapshot_date:       NaiveDate,
}
