//! [`SqliteWarehouse`] — the SQLite implementation of [`Warehouse`].
//!
//! Every batch method runs in its own transaction; the pipeline's
//! all-or-nothing contract is per stage, not per run.

use std::{collections::HashMap, path::Path};

use chrono::NaiveDate;
use rusqlite::OptionalExtension as _;

use granary_core::{
  measures::AgeGroup,
  model::{
    CustomerDim, DateRow, InventoryFact, LocationDim, LocationKey,
    NaturalKey, ProductDim, SalesFact, SupplierDim, SurrogateKey,
  },
  store::Warehouse,
};

use crate::{Error, Result, schema::SCHEMA};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A star-schema warehouse backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteWarehouse {
  conn: tokio_rusqlite::Connection,
}

impl SqliteWarehouse {
  /// Open (or create) a warehouse at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let warehouse = Self { conn };
    warehouse.init_schema().await?;
    Ok(warehouse)
  }

  /// Open an in-memory warehouse — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let warehouse = Self { conn };
    warehouse.init_schema().await?;
    Ok(warehouse)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  #[cfg(test)]
  pub(crate) async fn count(&self, table: &'static str) -> Result<i64> {
    let n = self
      .conn
      .call(move |conn| {
        let n = conn.query_row(
          &format!("SELECT COUNT(*) FROM {table}"),
          [],
          |row| row.get(0),
        )?;
        Ok(n)
      })
      .await?;
    Ok(n)
  }

  /// Natural → surrogate key map over current rows of one dimension table.
  async fn key_map(
    &self,
    sql: &'static str,
  ) -> Result<HashMap<NaturalKey, SurrogateKey>> {
    let map = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(sql)?;
        let map = stmt
          .query_map([], |row| {
            Ok((row.get::<_, i64>(1)?, row.get::<_, i64>(0)?))
          })?
          .collect::<rusqlite::Result<HashMap<_, _>>>()?;
        Ok(map)
      })
      .await?;
    Ok(map)
  }
}

// ─── Warehouse impl ──────────────────────────────────────────────────────────

impl Warehouse for SqliteWarehouse {
  type Error = Error;

  // ── Dimension upserts ─────────────────────────────────────────────────────

  async fn upsert_dates(&self, rows: Vec<DateRow>) -> Result<usize> {
    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut inserted = 0usize;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO dim_date (
               date_key, full_date, day_of_week, day_name, day_of_month,
               day_of_year, week_of_year, month_number, month_name,
               quarter_number, quarter_name, year_number, is_weekend,
               is_holiday
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
             ON CONFLICT(date_key) DO NOTHING",
          )?;
          for row in &rows {
            inserted += stmt.execute(rusqlite::params![
              row.date_key,
              row.full_date,
              row.day_of_week,
              row.day_name,
              row.day_of_month,
              row.day_of_year,
              row.week_of_year,
              row.month_number,
              row.month_name,
              row.quarter_number,
              row.quarter_name,
              row.year_number,
              row.is_weekend,
              row.is_holiday,
            ])?;
          }
        }
        tx.commit()?;
        Ok(inserted)
      })
      .await?;
    Ok(inserted)
  }

  async fn upsert_customers(&self, rows: Vec<CustomerDim>) -> Result<usize> {
    let count = rows.len();
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          // Mutable descriptive/status fields only; the surrogate key and
          // historical fields (birth date, registration date) are preserved.
          let mut stmt = tx.prepare(
            "INSERT INTO dim_customer (
               customer_id, full_name, first_name, last_name, email, phone,
               date_of_birth, age, age_group, gender, city, state, country,
               postal_code, registration_date, customer_status,
               years_as_customer, is_active
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
                       ?13, ?14, ?15, ?16, ?17, ?18)
             ON CONFLICT(customer_id) DO UPDATE SET
               full_name       = excluded.full_name,
               email           = excluded.email,
               city            = excluded.city,
               state           = excluded.state,
               country         = excluded.country,
               customer_status = excluded.customer_status,
               is_active       = excluded.is_active",
          )?;
          for row in &rows {
            stmt.execute(rusqlite::params![
              row.customer_id,
              row.full_name,
              row.first_name,
              row.last_name,
              row.email,
              row.phone,
              row.date_of_birth,
              row.age,
              row.age_group.map(AgeGroup::as_str),
              row.gender,
              row.city,
              row.state,
              row.country,
              row.postal_code,
              row.registration_date,
              row.status,
              row.years_as_customer,
              row.is_active,
            ])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(count)
  }

  async fn upsert_products(&self, rows: Vec<ProductDim>) -> Result<usize> {
    let count = rows.len();
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO dim_product (
               product_id, product_code, product_name, description,
               category_id, category_name, parent_category_id,
               parent_category_name, supplier_id, supplier_name, unit_price,
               cost_price, profit_margin, profit_margin_percent, weight_kg,
               dimensions, product_status
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
                       ?13, ?14, ?15, ?16, ?17)
             ON CONFLICT(product_id) DO UPDATE SET
               product_name          = excluded.product_name,
               unit_price            = excluded.unit_price,
               cost_price            = excluded.cost_price,
               profit_margin         = excluded.profit_margin,
               profit_margin_percent = excluded.profit_margin_percent,
               product_status        = excluded.product_status",
          )?;
          for row in &rows {
            stmt.execute(rusqlite::params![
              row.product_id,
              row.product_code,
              row.product_name,
              row.description,
              row.category_id,
              row.category_name,
              row.parent_category_id,
              row.parent_category_name,
              row.supplier_id,
              row.supplier_name,
              row.unit_price,
              row.cost_price,
              row.profit_margin,
              row.profit_margin_percent,
              row.weight_kg,
              row.dimensions,
              row.status,
            ])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(count)
  }

  async fn upsert_suppliers(&self, rows: Vec<SupplierDim>) -> Result<usize> {
    let count = rows.len();
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO dim_supplier (
               supplier_id, supplier_name, contact_person, email, phone,
               city, state, country, postal_code
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(supplier_id) DO UPDATE SET
               supplier_name  = excluded.supplier_name,
               contact_person = excluded.contact_person,
               email          = excluded.email,
               phone          = excluded.phone",
          )?;
          for row in &rows {
            stmt.execute(rusqlite::params![
              row.supplier_id,
              row.supplier_name,
              row.contact_person,
              row.email,
              row.phone,
              row.city,
              row.state,
              row.country,
              row.postal_code,
            ])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(count)
  }

  async fn upsert_locations(&self, rows: Vec<LocationDim>) -> Result<usize> {
    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut inserted = 0usize;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO dim_location (
               country, state, city, postal_code, location_type, region
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(country, state, city, postal_code) DO NOTHING",
          )?;
          for row in &rows {
            inserted += stmt.execute(rusqlite::params![
              row.key.country,
              row.key.state,
              row.key.city,
              row.key.postal_code,
              row.kind.as_str(),
              row.region,
            ])?;
          }
        }
        tx.commit()?;
        Ok(inserted)
      })
      .await?;
    Ok(inserted)
  }

  // ── Key-map reads ─────────────────────────────────────────────────────────

  async fn customer_keys(&self) -> Result<HashMap<NaturalKey, SurrogateKey>> {
    self
      .key_map(
        "SELECT customer_key, customer_id FROM dim_customer WHERE is_current = 1",
      )
      .await
  }

  async fn product_keys(&self) -> Result<HashMap<NaturalKey, SurrogateKey>> {
    self
      .key_map(
        "SELECT product_key, product_id FROM dim_product WHERE is_current = 1",
      )
      .await
  }

  async fn supplier_keys(&self) -> Result<HashMap<NaturalKey, SurrogateKey>> {
    self
      .key_map(
        "SELECT supplier_key, supplier_id FROM dim_supplier WHERE is_current = 1",
      )
      .await
  }

  // ── Location discover-or-create ───────────────────────────────────────────

  async fn find_location(&self, key: LocationKey) -> Result<Option<SurrogateKey>> {
    let found = self
      .conn
      .call(move |conn| {
        let found = conn
          .query_row(
            "SELECT location_key FROM dim_location
             WHERE country = ?1 AND state = ?2 AND city = ?3
               AND postal_code = ?4",
            rusqlite::params![key.country, key.state, key.city, key.postal_code],
            |row| row.get(0),
          )
          .optional()?;
        Ok(found)
      })
      .await?;
    Ok(found)
  }

  async fn insert_location(&self, row: LocationDim) -> Result<SurrogateKey> {
    let key = row.key.clone();

    // Insert-or-ignore then read back, in a single transaction. The UNIQUE
    // constraint makes the insert a no-op when the key already exists, so
    // repeated calls with the same composite key return the same surrogate.
    let found: Option<i64> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO dim_location (
             country, state, city, postal_code, location_type, region
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
           ON CONFLICT(country, state, city, postal_code) DO NOTHING",
          rusqlite::params![
            row.key.country,
            row.key.state,
            row.key.city,
            row.key.postal_code,
            row.kind.as_str(),
            row.region,
          ],
        )?;
        let found = tx
          .query_row(
            "SELECT location_key FROM dim_location
             WHERE country = ?1 AND state = ?2 AND city = ?3
               AND postal_code = ?4",
            rusqlite::params![
              row.key.country,
              row.key.state,
              row.key.city,
              row.key.postal_code
            ],
            |r| r.get(0),
          )
          .optional()?;
        tx.commit()?;
        Ok(found)
      })
      .await?;

    found.ok_or(Error::LocationVanished(key))
  }

  // ── Facts ─────────────────────────────────────────────────────────────────

  async fn latest_sale_date(&self) -> Result<Option<NaiveDate>> {
    let latest = self
      .conn
      .call(|conn| {
        let latest: Option<NaiveDate> = conn.query_row(
          "SELECT MAX(order_date) FROM fact_sales",
          [],
          |row| row.get(0),
        )?;
        Ok(latest)
      })
      .await?;
    Ok(latest)
  }

  async fn append_sales(&self, rows: Vec<SalesFact>) -> Result<usize> {
    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut inserted = 0usize;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO fact_sales (
               date_key, customer_key, product_key, supplier_key,
               location_key, order_id, order_item_id, quantity, unit_price,
               discount_percent, discount_amount, line_total, cost_amount,
               profit_amount, profit_margin_percent, tax_amount,
               shipping_cost, order_total, order_status, payment_status,
               payment_method, order_date
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
                       ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22)
             ON CONFLICT(order_id, order_item_id) DO NOTHING",
          )?;
          for row in &rows {
            inserted += stmt.execute(rusqlite::params![
              row.date_key,
              row.customer_key,
              row.product_key,
              row.supplier_key,
              row.location_key,
              row.order_id,
              row.order_item_id,
              row.quantity,
              row.unit_price,
              row.discount_percent,
              row.discount_amount,
              row.line_total,
              row.cost_amount,
              row.profit_amount,
              row.profit_margin_percent,
              row.tax_amount,
              row.shipping_cost,
              row.order_total,
              row.order_status,
              row.payment_status,
              row.payment_method,
              row.order_date,
            ])?;
          }
        }
        tx.commit()?;
        Ok(inserted)
      })
      .await?;
    Ok(inserted)
  }

  async fn upsert_inventory(&self, rows: Vec<InventoryFact>) -> Result<usize> {
    let count = rows.len();
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO fact_inventory (
               date_key, product_key, supplier_key, location_key, product_id,
               quantity_on_hand, reorder_level, reorder_quantity,
               quantity_available, stock_value, is_low_stock, is_out_of_stock,
               is_overstocked, warehouse_location, last_restocked_date,
               snapshot_date
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
                       ?13, ?14, ?15, ?16)
             ON CONFLICT(product_key, date_key) DO UPDATE SET
               quantity_on_hand   = excluded.quantity_on_hand,
               reorder_level      = excluded.reorder_level,
               reorder_quantity   = excluded.reorder_quantity,
               quantity_available = excluded.quantity_available,
               stock_value        = excluded.stock_value,
               is_low_stock       = excluded.is_low_stock,
               is_out_of_stock    = excluded.is_out_of_stock,
               is_overstocked     = excluded.is_overstocked,
               warehouse_location = excluded.warehouse_location,
               last_restocked_date = excluded.last_restocked_date",
          )?;
          for row in &rows {
            stmt.execute(rusqlite::params![
              row.date_key,
              row.product_key,
              row.supplier_key,
              row.location_key,
              row.product_id,
              row.quantity_on_hand,
              row.reorder_level,
              row.reorder_quantity,
              row.quantity_available,
              row.stock_value,
              row.stock.is_low_stock,
              row.stock.is_out_of_stock,
              row.stock.is_overstocked,
              row.warehouse_location,
              row.last_restocked_date,
              row.snapshot_date,
            ])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(count)
  }
}
