//! SQL schema for the SQLite warehouse.
//!
//! Executed at connection startup; idempotent thanks to
//! `CREATE TABLE IF NOT EXISTS`. The UNIQUE constraints on natural keys are
//! the actual concurrency backstop for upserts and for the location
//! discover-or-create path — application-level existence checks are
//! advisory only.

/// Star schema DDL: one date dimension, four business dimensions, two fact
/// tables. Surrogate keys use AUTOINCREMENT so rowids are never reused even
/// after deletes.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS dim_date (
    date_key        INTEGER PRIMARY KEY,   -- YYYYMMDD
    full_date       TEXT NOT NULL,
    day_of_week     INTEGER NOT NULL,      -- ISO: Monday = 1 .. Sunday = 7
    day_name        TEXT NOT NULL,
    day_of_month    INTEGER NOT NULL,
    day_of_year     INTEGER NOT NULL,
    week_of_year    INTEGER NOT NULL,
    month_number    INTEGER NOT NULL,
    month_name      TEXT NOT NULL,
    quarter_number  INTEGER NOT NULL,
    quarter_name    TEXT NOT NULL,
    year_number     INTEGER NOT NULL,
    is_weekend      INTEGER NOT NULL,
    is_holiday      INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS dim_customer (
    customer_key      INTEGER PRIMARY KEY AUTOINCREMENT,
    customer_id       INTEGER NOT NULL UNIQUE,
    full_name         TEXT NOT NULL,
    first_name        TEXT NOT NULL,
    last_name         TEXT NOT NULL,
    email             TEXT,
    phone             TEXT,
    date_of_birth     TEXT,
    age               INTEGER,
    age_group         TEXT,
    gender            TEXT,
    city              TEXT,
    state             TEXT,
    country           TEXT,
    postal_code       TEXT,
    registration_date TEXT,
    customer_status   TEXT NOT NULL,
    years_as_customer REAL,
    is_active         INTEGER NOT NULL,
    is_current        INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS dim_product (
    product_key           INTEGER PRIMARY KEY AUTOINCREMENT,
    product_id            INTEGER NOT NULL UNIQUE,
    product_code          TEXT NOT NULL,
    product_name          TEXT NOT NULL,
    description           TEXT,
    category_id           INTEGER,
    category_name         TEXT,
    parent_category_id    INTEGER,
    parent_category_name  TEXT,
    supplier_id           INTEGER,
    supplier_name         TEXT,
    unit_price            REAL,
    cost_price            REAL,
    profit_margin         REAL NOT NULL,
    profit_margin_percent REAL NOT NULL,
    weight_kg             REAL,
    dimensions            TEXT,
    product_status        TEXT NOT NULL,
    is_current            INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS dim_supplier (
    supplier_key   INTEGER PRIMARY KEY AUTOINCREMENT,
    supplier_id    INTEGER NOT NULL UNIQUE,
    supplier_name  TEXT NOT NULL,
    contact_person TEXT,
    email          TEXT,
    phone          TEXT,
    city           TEXT,
    state          TEXT,
    country        TEXT,
    postal_code    TEXT,
    is_current     INTEGER NOT NULL DEFAULT 1
);

-- Location components are empty strings when absent, never NULL, so the
-- composite UNIQUE constraint enforces one row per key.
CREATE TABLE IF NOT EXISTS dim_location (
    location_key  INTEGER PRIMARY KEY AUTOINCREMENT,
    country       TEXT NOT NULL,
    state         TEXT NOT NULL,
    city          TEXT NOT NULL,
    postal_code   TEXT NOT NULL,
    location_type TEXT NOT NULL,
    region        TEXT NOT NULL,
    is_current    INTEGER NOT NULL DEFAULT 1,
    UNIQUE (country, state, city, postal_code)
);

-- Grain: one order line item. The uniqueness constraint makes a full
-- re-load idempotent; normal operation only appends.
CREATE TABLE IF NOT EXISTS fact_sales (
    sales_key             INTEGER PRIMARY KEY AUTOINCREMENT,
    date_key              INTEGER NOT NULL REFERENCES dim_date(date_key),
    customer_key          INTEGER NOT NULL REFERENCES dim_customer(customer_key),
    product_key           INTEGER NOT NULL REFERENCES dim_product(product_key),
    supplier_key          INTEGER NOT NULL REFERENCES dim_supplier(supplier_key),
    location_key          INTEGER NOT NULL REFERENCES dim_location(location_key),
    order_id              INTEGER NOT NULL,
    order_item_id         INTEGER NOT NULL,
    quantity              INTEGER NOT NULL,
    unit_price            REAL NOT NULL,
    discount_percent      REAL NOT NULL,
    discount_amount       REAL NOT NULL,
    line_total            REAL NOT NULL,
    cost_amount           REAL NOT NULL,
    profit_amount         REAL NOT NULL,
    profit_margin_percent REAL NOT NULL,
    tax_amount            REAL NOT NULL,
    shipping_cost         REAL NOT NULL,
    order_total           REAL NOT NULL,
    order_status          TEXT NOT NULL,
    payment_status        TEXT NOT NULL,
    payment_method        TEXT NOT NULL,
    order_date            TEXT NOT NULL,
    UNIQUE (order_id, order_item_id)
);

-- Grain: product x snapshot date; measure columns overwritten on re-run.
CREATE TABLE IF NOT EXISTS fact_inventory (
    inventory_key       INTEGER PRIMARY KEY AUTOINCREMENT,
    date_key            INTEGER NOT NULL REFERENCES dim_date(date_key),
    product_key         INTEGER NOT NULL REFERENCES dim_product(product_key),
    supplier_key        INTEGER NOT NULL REFERENCES dim_supplier(supplier_key),
    location_key        INTEGER NOT NULL REFERENCES dim_location(location_key),
    product_id          INTEGER NOT NULL,
    quantity_on_hand    INTEGER NOT NULL,
    reorder_level       INTEGER NOT NULL,
    reorder_quantity    INTEGER NOT NULL,
    quantity_available  INTEGER NOT NULL,
    stock_value         REAL NOT NULL,
    is_low_stock        INTEGER NOT NULL,
    is_out_of_stock     INTEGER NOT NULL,
    is_overstocked      INTEGER NOT NULL,
    warehouse_location  TEXT,
    last_restocked_date TEXT,
    snapshot_date       TEXT NOT NULL,
    UNIQUE (product_key, date_key)
);

CREATE INDEX IF NOT EXISTS fact_sales_date_idx     ON fact_sales(date_key);
CREATE INDEX IF NOT EXISTS fact_sales_customer_idx ON fact_sales(customer_key);
CREATE INDEX IF NOT EXISTS fact_sales_product_idx  ON fact_sales(product_key);
CREATE INDEX IF NOT EXISTS fact_inventory_date_idx ON fact_inventory(date_key);

PRAGMA user_version = 1;
";
