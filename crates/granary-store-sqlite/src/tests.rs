//! Integration tests for the SQLite stores against in-memory databases.

use chrono::NaiveDate;

use granary_core::{
  calendar,
  measures::StockStatus,
  model::{
    CustomerDim, InventoryFact, LocationDim, LocationKey, LocationKind,
    ProductDim, SalesFact, SupplierDim,
  },
  store::{SourceStore, Warehouse},
};

use crate::{SqliteSource, SqliteWarehouse};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

async fn warehouse() -> SqliteWarehouse {
  SqliteWarehouse::open_in_memory()
    .await
    .expect("in-memory warehouse")
}

fn customer(id: i64, status: &str) -> CustomerDim {
  CustomerDim {
    customer_id:       id,
    full_name:         format!("Customer {id}"),
    first_name:        "Customer".into(),
    last_name:         id.to_string(),
    email:             Some(format!("c{id}@example.com")),
    phone:             None,
    date_of_birth:     Some(d(1990, 1, 1)),
    age:               Some(34),
    age_group:         Some(granary_core::measures::AgeGroup::From26To35),
    gender:            None,
    city:              Some("Portland".into()),
    state:             Some("OR".into()),
    country:           Some("US".into()),
    postal_code:       Some("97201".into()),
    registration_date: Some(d(2020, 6, 1)),
    status:            status.into(),
    years_as_customer: Some(4.0),
    is_active:         status == "Active",
  }
}

fn product(id: i64) -> ProductDim {
  ProductDim {
    product_id:            id,
    product_code:          format!("P-{id:04}"),
    product_name:          format!("Product {id}"),
    description:           None,
    category_id:           Some(1),
    category_name:         Some("Widgets".into()),
    parent_category_id:    None,
    parent_category_name:  None,
    supplier_id:           Some(1),
    supplier_name:         Some("Acme".into()),
    unit_price:            Some(10.0),
    cost_price:            Some(4.0),
    profit_margin:         6.0,
    profit_margin_percent: 60.0,
    weight_kg:             None,
    dimensions:            None,
    status:                "Active".into(),
  }
}

fn supplier(id: i64) -> SupplierDim {
  SupplierDim {
    supplier_id:    id,
    supplier_name:  format!("Supplier {id}"),
    contact_person: None,
    email:          None,
    phone:          None,
    city:           None,
    state:          None,
    country:        None,
    postal_code:    None,
  }
}

fn location(city: &str) -> LocationDim {
  LocationDim {
    key:    LocationKey::new("US", "OR", city, "97201"),
    kind:   LocationKind::Shipping,
    region: "West".into(),
  }
}

fn sales_fact(order_id: i64, item_id: i64, date: NaiveDate, keys: [i64; 4]) -> SalesFact {
  let [customer_key, product_key, supplier_key, location_key] = keys;
  SalesFact {
    date_key: calendar::date_key(date),
    customer_key,
    product_key,
    supplier_key,
    location_key,
    order_id,
    order_item_id: item_id,
    quantity: 2,
    unit_price: 10.0,
    discount_percent: 0.0,
    discount_amount: 0.0,
    line_total: 20.0,
    cost_amount: 8.0,
    profit_amount: 12.0,
    profit_margin_percent: 60.0,
    tax_amount: 1.6,
    shipping_cost: 5.0,
    order_total: 26.6,
    order_status: "Delivered".into(),
    payment_status: "Paid".into(),
    payment_method: "Card".into(),
    order_date: date,
  }
}

// ─── Date dimension ──────────────────────────────────────────────────────────

#[tokio::test]
async fn date_upsert_overlapping_ranges_does_not_duplicate() {
  let w = warehouse().await;

  let first = calendar::generate(d(2024, 1, 1), d(2024, 1, 31)).unwrap();
  w.upsert_dates(first).await.unwrap();

  // Overlapping re-run: Jan 15 – Feb 15.
  let second = calendar::generate(d(2024, 1, 15), d(2024, 2, 15)).unwrap();
  w.upsert_dates(second).await.unwrap();

  // 31 (Jan) + 15 (Feb) distinct days, once each.
  assert_eq!(w.count("dim_date").await.unwrap(), 46);
}

// ─── Dimension upserts ───────────────────────────────────────────────────────

#[tokio::test]
async fn customer_upsert_preserves_surrogate_keys() {
  let w = warehouse().await;

  w.upsert_customers(vec![customer(10, "Active"), customer(11, "Active")])
    .await
    .unwrap();
  let before = w.customer_keys().await.unwrap();
  assert_eq!(before.len(), 2);

  // Re-run with a changed status: same natural keys, same surrogates.
  w.upsert_customers(vec![customer(10, "Inactive"), customer(11, "Active")])
    .await
    .unwrap();
  let after = w.customer_keys().await.unwrap();
  assert_eq!(after, before);
}

#[tokio::test]
async fn product_upsert_is_stable_across_reruns() {
  let w = warehouse().await;

  w.upsert_products(vec![product(100), product(101)]).await.unwrap();
  let before = w.product_keys().await.unwrap();

  w.upsert_products(vec![product(100), product(101), product(102)])
    .await
    .unwrap();
  let after = w.product_keys().await.unwrap();

  assert_eq!(after.len(), 3);
  assert_eq!(after[&100], before[&100]);
  assert_eq!(after[&101], before[&101]);
}

#[tokio::test]
async fn supplier_keys_cover_upserted_rows() {
  let w = warehouse().await;
  w.upsert_suppliers(vec![supplier(1), supplier(2)]).await.unwrap();
  let keys = w.supplier_keys().await.unwrap();
  assert_eq!(keys.len(), 2);
  assert!(keys.contains_key(&1));
  assert!(keys.contains_key(&2));
}

// ─── Location discover-or-create ─────────────────────────────────────────────

#[tokio::test]
async fn insert_location_twice_returns_same_key_and_one_row() {
  let w = warehouse().await;

  let first = w.insert_location(location("Salem")).await.unwrap();
  let second = w.insert_location(location("Salem")).await.unwrap();
  assert_eq!(first, second);

  let found = w
    .find_location(LocationKey::new("US", "OR", "Salem", "97201"))
    .await
    .unwrap();
  assert_eq!(found, Some(first));
  assert_eq!(w.count("dim_location").await.unwrap(), 1);
}

#[tokio::test]
async fn distinct_composite_keys_get_distinct_surrogates() {
  let w = warehouse().await;
  let a = w.insert_location(location("Salem")).await.unwrap();
  let b = w.insert_location(location("Eugene")).await.unwrap();
  assert_ne!(a, b);
}

#[tokio::test]
async fn find_location_misses_unknown_key() {
  let w = warehouse().await;
  let found = w
    .find_location(LocationKey::new("US", "ZZ", "Nowhere", ""))
    .await
    .unwrap();
  assert!(found.is_none());
}

#[tokio::test]
async fn bulk_location_load_is_idempotent() {
  let w = warehouse().await;

  w.upsert_locations(vec![location("Salem"), location("Eugene")])
    .await
    .unwrap();
  let salem = w
    .find_location(LocationKey::new("US", "OR", "Salem", "97201"))
    .await
    .unwrap()
    .unwrap();

  w.upsert_locations(vec![location("Salem")]).await.unwrap();
  let salem_again = w
    .find_location(LocationKey::new("US", "OR", "Salem", "97201"))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(salem, salem_again);
}

// ─── Sales facts ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn latest_sale_date_tracks_appends() {
  let w = warehouse().await;
  assert!(w.latest_sale_date().await.unwrap().is_none());

  w.upsert_dates(calendar::generate(d(2024, 3, 1), d(2024, 3, 31)).unwrap())
    .await
    .unwrap();
  w.upsert_customers(vec![customer(10, "Active")]).await.unwrap();
  w.upsert_products(vec![product(100)]).await.unwrap();
  w.upsert_suppliers(vec![supplier(1)]).await.unwrap();
  let loc = w.insert_location(location("Salem")).await.unwrap();

  let keys = [1, 1, 1, loc];
  w.append_sales(vec![
    sales_fact(1, 1, d(2024, 3, 5), keys),
    sales_fact(2, 2, d(2024, 3, 9), keys),
  ])
  .await
  .unwrap();

  assert_eq!(w.latest_sale_date().await.unwrap(), Some(d(2024, 3, 9)));
}

#[tokio::test]
async fn append_sales_ignores_duplicate_line_items() {
  let w = warehouse().await;
  w.upsert_dates(calendar::generate(d(2024, 3, 1), d(2024, 3, 31)).unwrap())
    .await
    .unwrap();
  w.upsert_customers(vec![customer(10, "Active")]).await.unwrap();
  w.upsert_products(vec![product(100)]).await.unwrap();
  w.upsert_suppliers(vec![supplier(1)]).await.unwrap();
  let loc = w.insert_location(location("Salem")).await.unwrap();
  let keys = [1, 1, 1, loc];

  let inserted = w
    .append_sales(vec![sales_fact(1, 1, d(2024, 3, 5), keys)])
    .await
    .unwrap();
  assert_eq!(inserted, 1);

  // Full re-load of the same line: no duplicate row.
  let reinserted = w
    .append_sales(vec![sales_fact(1, 1, d(2024, 3, 5), keys)])
    .await
    .unwrap();
  assert_eq!(reinserted, 0);
}

// ─── Inventory facts ─────────────────────────────────────────────────────────

fn inventory_fact(product_key: i64, date: NaiveDate, on_hand: i64) -> InventoryFact {
  InventoryFact {
    date_key: calendar::date_key(date),
    product_key,
    supplier_key: 1,
    location_key: 1,
    product_id: 100,
    quantity_on_hand: on_hand,
    reorder_level: 10,
    reorder_quantity: 50,
    quantity_available: on_hand,
    stock_value: on_hand as f64 * 4.0,
    stock: StockStatus::evaluate(on_hand, 10),
    warehouse_location: Some("A-12".into()),
    last_restocked_date: None,
    snapshot_date: date,
  }
}

#[tokio::test]
async fn inventory_snapshot_overwrites_on_rerun() {
  let w = warehouse().await;
  w.upsert_dates(calendar::generate(d(2024, 3, 1), d(2024, 3, 31)).unwrap())
    .await
    .unwrap();
  w.upsert_products(vec![product(100)]).await.unwrap();
  w.upsert_suppliers(vec![supplier(1)]).await.unwrap();
  w.insert_location(location("Salem")).await.unwrap();

  w.upsert_inventory(vec![inventory_fact(1, d(2024, 3, 5), 40)])
    .await
    .unwrap();
  // Same (product, date) grain: overwrite, not append.
  w.upsert_inventory(vec![inventory_fact(1, d(2024, 3, 5), 0)])
    .await
    .unwrap();
  assert_eq!(w.count("fact_inventory").await.unwrap(), 1);

  // A different snapshot date is a separate row.
  w.upsert_inventory(vec![inventory_fact(1, d(2024, 3, 6), 25)])
    .await
    .unwrap();
  assert_eq!(w.count("fact_inventory").await.unwrap(), 2);
}

// ─── Source extraction ───────────────────────────────────────────────────────

async fn seeded_source() -> SqliteSource {
  let source = SqliteSource::open_in_memory().await.unwrap();
  source
    .execute_batch(
      "INSERT INTO categories VALUES (1, 'Electronics', NULL);
       INSERT INTO categories VALUES (2, 'Audio', 1);
       INSERT INTO suppliers (supplier_id, supplier_name) VALUES (1, 'Acme');
       INSERT INTO products VALUES
         (100, 'P-0100', 'Headphones', NULL, 2, 1, 50.0, 20.0, 0.3, NULL, 'Active');
       INSERT INTO customers (customer_id, first_name, last_name, email,
                              date_of_birth, state, country, registration_date, status)
         VALUES (10, 'Alice', 'Liddell', 'alice@example.com',
                 '1998-06-01', 'OR', 'US', '2020-06-01', 'Active');
       INSERT INTO orders VALUES
         (1, 10, '2024-03-05', 'Delivered', 'Paid', 'Card', 106.0, 6.0, 0.0,
          'US', 'OR', 'Portland', '97201');
       INSERT INTO order_items VALUES (1, 1, 100, 2, 50.0, 0.0, 100.0);
       INSERT INTO inventory VALUES (100, 7, 10, 50, '2024-02-20', 'A-12');",
    )
    .await
    .unwrap();
  source
}

#[tokio::test]
async fn extracts_products_with_category_hierarchy() {
  let source = seeded_source().await;
  let products = source.products().await.unwrap();
  assert_eq!(products.len(), 1);

  let p = &products[0];
  assert_eq!(p.category_name.as_deref(), Some("Audio"));
  assert_eq!(p.parent_category_name.as_deref(), Some("Electronics"));
  assert_eq!(p.supplier_name.as_deref(), Some("Acme"));
  assert_eq!(p.unit_price, Some(50.0));
}

#[tokio::test]
async fn extracts_sales_with_watermark_filter() {
  let source = seeded_source().await;

  let all = source.sales(None).await.unwrap();
  assert_eq!(all.len(), 1);
  assert_eq!(all[0].order_date, d(2024, 3, 5));
  assert_eq!(all[0].shipping_to, LocationKey::new("US", "OR", "Portland", "97201"));
  assert_eq!(all[0].cost_price, Some(20.0));

  // Watermark at the only order's date: strictly-greater filter excludes it.
  let none = source.sales(Some(d(2024, 3, 5))).await.unwrap();
  assert!(none.is_empty());

  let before = source.sales(Some(d(2024, 3, 4))).await.unwrap();
  assert_eq!(before.len(), 1);
}

#[tokio::test]
async fn extracts_inventory_with_product_costing() {
  let source = seeded_source().await;
  let inventory = source.inventory().await.unwrap();
  assert_eq!(inventory.len(), 1);

  let inv = &inventory[0];
  assert_eq!(inv.quantity_on_hand, 7);
  assert_eq!(inv.reorder_level, 10);
  assert_eq!(inv.cost_price, Some(20.0));
  assert_eq!(inv.last_restocked_date, Some(d(2024, 2, 20)));
}

#[tokio::test]
async fn extracts_distinct_shipping_locations() {
  let source = seeded_source().await;
  source
    .execute_batch(
      "INSERT INTO orders VALUES
         (2, 10, '2024-03-06', 'Delivered', 'Paid', 'Card', 10.0, 0.0, 0.0,
          'US', 'OR', 'Portland', '97201');
       INSERT INTO orders (order_id, customer_id, order_date)
         VALUES (3, 10, '2024-03-07');",
    )
    .await
    .unwrap();

  // Two orders share an address; the third has no shipping country.
  let locations = source.shipping_locations().await.unwrap();
  assert_eq!(locations.len(), 1);
  assert_eq!(locations[0], LocationKey::new("US", "OR", "Portland", "97201"));
}

#[tokio::test]
async fn extracts_customers_with_dates() {
  let source = seeded_source().await;
  let customers = source.customers().await.unwrap();
  assert_eq!(customers.len(), 1);
  assert_eq!(customers[0].date_of_birth, Some(d(1998, 6, 1)));
  assert_eq!(customers[0].registration_date, Some(d(2020, 6, 1)));
}
