//! The `SourceStore` and `Warehouse` traits.
//!
//! `SourceStore` is implemented by read-only adapters over the operational
//! schema; `Warehouse` by star-schema storage backends (e.g.
//! `granary-store-sqlite`). The pipeline crate depends on these
//! abstractions, not on any concrete backend.

use std::{collections::HashMap, future::Future};

use chrono::NaiveDate;

use crate::model::{
  CustomerDim, DateRow, InventoryFact, LocationDim, LocationKey, NaturalKey,
  ProductDim, SalesFact, SourceCustomer, SourceInventory, SourceProduct,
  SourceSaleLine, SourceSupplier, SupplierDim, SurrogateKey,
};

// ─── Source ──────────────────────────────────────────────────────────────────

/// Read-only extraction interface over the normalized operational schema.
///
/// Dimension extracts always return the full current state — there is no
/// incremental filter for dimensions. Only the sales extract is bounded, by
/// an optional watermark date.
///
/// All methods return `Send` futures so implementations can run queries on
/// worker threads under a multi-threaded runtime.
pub trait SourceStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// All customers, with demographic and registration attributes.
  fn customers(
    &self,
  ) -> impl Future<Output = Result<Vec<SourceCustomer>, Self::Error>> + Send + '_;

  /// All products joined to their two-level category hierarchy and supplier.
  fn products(
    &self,
  ) -> impl Future<Output = Result<Vec<SourceProduct>, Self::Error>> + Send + '_;

  /// All suppliers.
  fn suppliers(
    &self,
  ) -> impl Future<Output = Result<Vec<SourceSupplier>, Self::Error>> + Send + '_;

  /// Distinct shipping addresses observed on orders, for the bulk location
  /// load. Components may be empty strings, never NULL.
  fn shipping_locations(
    &self,
  ) -> impl Future<Output = Result<Vec<LocationKey>, Self::Error>> + Send + '_;

  /// Order line items joined with their order header and product costing,
  /// ordered by order date. With `after` set, only rows whose order date is
  /// strictly greater are returned.
  fn sales(
    &self,
    after: Option<NaiveDate>,
  ) -> impl Future<Output = Result<Vec<SourceSaleLine>, Self::Error>> + Send + '_;

  /// The current inventory position of every product.
  fn inventory(
    &self,
  ) -> impl Future<Output = Result<Vec<SourceInventory>, Self::Error>> + Send + '_;
}

// ─── Warehouse ───────────────────────────────────────────────────────────────

/// Star-schema storage backend.
///
/// Every batch method commits its own transaction; the pipeline run is not
/// a single atomic unit. Uniqueness constraints on natural keys are the
/// backstop for upsert idempotency and for the location discover-or-create
/// race under concurrent writers — an application-level existence check is
/// advisory only.
pub trait Warehouse: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Dimension upserts ─────────────────────────────────────────────────

  /// Insert calendar rows, ignoring date keys that already exist.
  fn upsert_dates(
    &self,
    rows: Vec<DateRow>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Upsert by `customer_id`: insert if absent, else update mutable
  /// descriptive/status fields only, preserving the surrogate key.
  fn upsert_customers(
    &self,
    rows: Vec<CustomerDim>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Upsert by `product_id`; see [`Warehouse::upsert_customers`].
  fn upsert_products(
    &self,
    rows: Vec<ProductDim>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Upsert by `supplier_id`; see [`Warehouse::upsert_customers`].
  fn upsert_suppliers(
    &self,
    rows: Vec<SupplierDim>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Insert locations whose composite key is not yet present; existing rows
  /// are left untouched.
  fn upsert_locations(
    &self,
    rows: Vec<LocationDim>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  // ── Key-map reads ─────────────────────────────────────────────────────

  /// Natural → surrogate key map over current customer rows.
  fn customer_keys(
    &self,
  ) -> impl Future<Output = Result<HashMap<NaturalKey, SurrogateKey>, Self::Error>>
  + Send
  + '_;

  /// Natural → surrogate key map over current product rows.
  fn product_keys(
    &self,
  ) -> impl Future<Output = Result<HashMap<NaturalKey, SurrogateKey>, Self::Error>>
  + Send
  + '_;

  /// Natural → surrogate key map over current supplier rows.
  fn supplier_keys(
    &self,
  ) -> impl Future<Output = Result<HashMap<NaturalKey, SurrogateKey>, Self::Error>>
  + Send
  + '_;

  // ── Location discover-or-create ───────────────────────────────────────

  /// Exact-match lookup of a location's surrogate key.
  fn find_location(
    &self,
    key: LocationKey,
  ) -> impl Future<Output = Result<Option<SurrogateKey>, Self::Error>> + Send + '_;

  /// Insert a location row if its composite key is absent and return the
  /// surrogate key either way. Safe to call repeatedly with the same key.
  fn insert_location(
    &self,
    row: LocationDim,
  ) -> impl Future<Output = Result<SurrogateKey, Self::Error>> + Send + '_;

  // ── Facts ─────────────────────────────────────────────────────────────

  /// The maximum order date already loaded, used as the incremental
  /// watermark. `None` when no sales facts exist.
  fn latest_sale_date(
    &self,
  ) -> impl Future<Output = Result<Option<NaiveDate>, Self::Error>> + Send + '_;

  /// Append sales facts in one transaction. Lines already present (same
  /// order and line item) are ignored, so full re-loads are idempotent.
  fn append_sales(
    &self,
    rows: Vec<SalesFact>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Upsert inventory facts keyed by (product, snapshot date), overwriting
  /// the measure columns of existing snapshots.
  fn upsert_inventory(
    &self,
    rows: Vec<InventoryFact>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;
}
