//! [`SqliteSource`] — read-only extraction over the operational schema.

use std::path::Path;

use chrono::NaiveDate;

use granary_core::{
  model::{
    LocationKey, SourceCustomer, SourceInventory, SourceProduct,
    SourceSaleLine, SourceSupplier,
  },
  store::SourceStore,
};

use crate::{Error, Result};

/// Mirror of the operational schema, used to provision throwaway source
/// databases for tests and demos. A production deployment points
/// [`SqliteSource::open`] at an existing database instead.
pub const SOURCE_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS customers (
    customer_id       INTEGER PRIMARY KEY,
    first_name        TEXT NOT NULL,
    last_name         TEXT NOT NULL,
    email             TEXT,
    phone             TEXT,
    date_of_birth     TEXT,
    gender            TEXT,
    city              TEXT,
    state             TEXT,
    country           TEXT,
    postal_code       TEXT,
    registration_date TEXT,
    status            TEXT NOT NULL DEFAULT 'Active'
);

CREATE TABLE IF NOT EXISTS categories (
    category_id        INTEGER PRIMARY KEY,
    category_name      TEXT NOT NULL,
    parent_category_id INTEGER REFERENCES categories(category_id)
);

CREATE TABLE IF NOT EXISTS suppliers (
    supplier_id    INTEGER PRIMARY KEY,
    supplier_name  TEXT NOT NULL,
    contact_person TEXT,
    email          TEXT,
    phone          TEXT,
    city           TEXT,
    state          TEXT,
    country        TEXT,
    postal_code    TEXT
);

CREATE TABLE IF NOT EXISTS products (
    product_id   INTEGER PRIMARY KEY,
    product_code TEXT NOT NULL,
    product_name TEXT NOT NULL,
    description  TEXT,
    category_id  INTEGER REFERENCES categories(category_id),
    supplier_id  INTEGER REFERENCES suppliers(supplier_id),
    unit_price   REAL,
    cost_price   REAL,
    weight_kg    REAL,
    dimensions   TEXT,
    status       TEXT NOT NULL DEFAULT 'Active'
);

CREATE TABLE IF NOT EXISTS orders (
    order_id             INTEGER PRIMARY KEY,
    customer_id          INTEGER NOT NULL REFERENCES customers(customer_id),
    order_date           TEXT NOT NULL,
    order_status         TEXT,
    payment_status       TEXT,
    payment_method       TEXT,
    total_amount         REAL,
    tax_amount           REAL,
    shipping_cost        REAL,
    shipping_country     TEXT,
    shipping_state       TEXT,
    shipping_city        TEXT,
    shipping_postal_code TEXT
);

CREATE TABLE IF NOT EXISTS order_items (
    order_item_id    INTEGER PRIMARY KEY,
    order_id         INTEGER NOT NULL REFERENCES orders(order_id),
    product_id       INTEGER NOT NULL REFERENCES products(product_id),
    quantity         INTEGER NOT NULL,
    unit_price       REAL NOT NULL,
    discount_percent REAL NOT NULL DEFAULT 0,
    line_total       REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS inventory (
    product_id          INTEGER PRIMARY KEY REFERENCES products(product_id),
    quantity_on_hand    INTEGER NOT NULL,
    reorder_level       INTEGER NOT NULL,
    reorder_quantity    INTEGER NOT NULL,
    last_restocked_date TEXT,
    warehouse_location  TEXT
);
";

// ─── Source ──────────────────────────────────────────────────────────────────

/// A source-system adapter backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteSource {
  conn: tokio_rusqlite::Connection,
}

impl SqliteSource {
  /// Open an existing operational database. No DDL is run: the source is a
  /// read-only collaborator.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Ok(Self { conn })
  }

  /// Open an in-memory database with the operational schema applied —
  /// useful for tests and demos.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let source = Self { conn };
    source.execute_batch(SOURCE_SCHEMA).await?;
    Ok(source)
  }

  /// Run arbitrary SQL against the source database. Provisioning hook for
  /// fixture data; the extraction interface itself never writes.
  pub async fn execute_batch(&self, sql: &str) -> Result<()> {
    let sql = sql.to_owned();
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(&sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── SourceStore impl ────────────────────────────────────────────────────────

impl SourceStore for SqliteSource {
  type Error = Error;

  async fn customers(&self) -> Result<Vec<SourceCustomer>> {
    let rows = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT customer_id, first_name, last_name, email, phone,
                  date_of_birth, gender, city, state, country, postal_code,
                  registration_date, status
           FROM customers",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(SourceCustomer {
              customer_id:       row.get(0)?,
              first_name:        row.get(1)?,
              last_name:         row.get(2)?,
              email:             row.get(3)?,
              phone:             row.get(4)?,
              date_of_birth:     row.get(5)?,
              gender:            row.get(6)?,
              city:              row.get(7)?,
              state:             row.get(8)?,
              country:           row.get(9)?,
              postal_code:       row.get(10)?,
              registration_date: row.get(11)?,
              status:            row.get(12)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  async fn products(&self) -> Result<Vec<SourceProduct>> {
    let rows = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT p.product_id, p.product_code, p.product_name, p.description,
                  p.category_id, c.category_name,
                  c.parent_category_id, pc.category_name,
                  p.supplier_id, s.supplier_name,
                  p.unit_price, p.cost_price, p.weight_kg, p.dimensions,
                  p.status
           FROM products p
           LEFT JOIN categories c  ON p.category_id = c.category_id
           LEFT JOIN categories pc ON c.parent_category_id = pc.category_id
           LEFT JOIN suppliers s   ON p.supplier_id = s.supplier_id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(SourceProduct {
              product_id:           row.get(0)?,
              product_code:         row.get(1)?,
              product_name:         row.get(2)?,
              description:          row.get(3)?,
              category_id:          row.get(4)?,
              category_name:        row.get(5)?,
              parent_category_id:   row.get(6)?,
              parent_category_name: row.get(7)?,
              supplier_id:          row.get(8)?,
              supplier_name:        row.get(9)?,
              unit_price:           row.get(10)?,
              cost_price:           row.get(11)?,
              weight_kg:            row.get(12)?,
              dimensions:           row.get(13)?,
              status:               row.get(14)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  async fn suppliers(&self) -> Result<Vec<SourceSupplier>> {
    let rows = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT supplier_id, supplier_name, contact_person, email, phone,
                  city, state, country, postal_code
           FROM suppliers",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(SourceSupplier {
              supplier_id:    row.get(0)?,
              supplier_name:  row.get(1)?,
              contact_person: row.get(2)?,
              email:          row.get(3)?,
              phone:          row.get(4)?,
              city:           row.get(5)?,
              state:          row.get(6)?,
              country:        row.get(7)?,
              postal_code:    row.get(8)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  async fn shipping_locations(&self) -> Result<Vec<LocationKey>> {
    let rows = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT DISTINCT
                  shipping_country,
                  COALESCE(shipping_state, ''),
                  COALESCE(shipping_city, ''),
                  COALESCE(shipping_postal_code, '')
           FROM orders
           WHERE shipping_country IS NOT NULL",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(LocationKey {
              country:     row.get(0)?,
              state:       row.get(1)?,
              city:        row.get(2)?,
              postal_code: row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  async fn sales(&self, after: Option<NaiveDate>) -> Result<Vec<SourceSaleLine>> {
    let rows = self
      .conn
      .call(move |conn| {
        // The watermark bound is strictly greater-than; `None` extracts
        // everything (full load).
        let date_filter = if after.is_some() {
          "AND o.order_date > ?1"
        } else {
          ""
        };

        let sql = format!(
          "SELECT o.order_id, oi.order_item_id, o.order_date,
                  COALESCE(o.order_status, ''),
                  COALESCE(o.payment_status, ''),
                  COALESCE(o.payment_method, ''),
                  COALESCE(o.total_amount, 0),
                  COALESCE(o.tax_amount, 0),
                  COALESCE(o.shipping_cost, 0),
                  o.customer_id, oi.product_id, oi.quantity, oi.unit_price,
                  COALESCE(oi.discount_percent, 0), oi.line_total,
                  COALESCE(o.shipping_country, ''),
                  COALESCE(o.shipping_state, ''),
                  COALESCE(o.shipping_city, ''),
                  COALESCE(o.shipping_postal_code, ''),
                  p.cost_price, p.supplier_id
           FROM orders o
           INNER JOIN order_items oi ON o.order_id = oi.order_id
           INNER JOIN products p     ON oi.product_id = p.product_id
           WHERE 1=1 {date_filter}
           ORDER BY o.order_date"
        );

        let mut stmt = conn.prepare(&sql)?;

        let map_row = |row: &rusqlite::Row<'_>| {
          Ok(SourceSaleLine {
            order_id:         row.get(0)?,
            order_item_id:    row.get(1)?,
            order_date:       row.get(2)?,
            order_status:     row.get(3)?,
            payment_status:   row.get(4)?,
            payment_method:   row.get(5)?,
            order_total:      row.get(6)?,
            tax_amount:       row.get(7)?,
            shipping_cost:    row.get(8)?,
            customer_id:      row.get(9)?,
            product_id:       row.get(10)?,
            quantity:         row.get(11)?,
            unit_price:       row.get(12)?,
            discount_percent: row.get(13)?,
            line_total:       row.get(14)?,
            shipping_to:      LocationKey {
              country:     row.get(15)?,
              state:       row.get(16)?,
              city:        row.get(17)?,
              postal_code: row.get(18)?,
            },
            cost_price:       row.get(19)?,
            supplier_id:      row.get(20)?,
          })
        };

        let rows = if let Some(watermark) = after {
          stmt
            .query_map(rusqlite::params![watermark], map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          stmt
            .query_map([], map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  async fn inventory(&self) -> Result<Vec<SourceInventory>> {
    let rows = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT i.product_id, i.quantity_on_hand, i.reorder_level,
                  i.reorder_quantity, i.last_restocked_date,
                  i.warehouse_location, p.supplier_id, p.cost_price
           FROM inventory i
           INNER JOIN products p ON i.product_id = p.product_id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(SourceInventory {
              product_id:          row.get(0)?,
              quantity_on_hand:    row.get(1)?,
              reorder_level:       row.get(2)?,
              reorder_quantity:    row.get(3)?,
              last_restocked_date: row.get(4)?,
              warehouse_location:  row.get(5)?,
              supplier_id:         row.get(6)?,
              cost_price:          row.get(7)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }
}
