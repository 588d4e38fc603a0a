//! Derived-measure calculator.
//!
//! Pure, side-effect-free functions shared by the dimension and fact loaders.
//! The division policy throughout is to degrade to zero on a zero or absent
//! denominator, never to fail or emit NaN.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ─── Age ─────────────────────────────────────────────────────────────────────

/// Demographic bucket derived from age.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgeGroup {
  UpTo25,
  From26To35,
  From36To45,
  From46To55,
  Over55,
}

impl AgeGroup {
  /// The bucket label stored in the warehouse.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::UpTo25 => "18-25",
      Self::From26To35 => "26-35",
      Self::From36To45 => "36-45",
      Self::From46To55 => "46-55",
      Self::Over55 => "56+",
    }
  }

  pub fn from_age(age: i64) -> Self {
    match age {
      ..26 => Self::UpTo25,
      26..36 => Self::From26To35,
      36..46 => Self::From36To45,
      46..56 => Self::From46To55,
      _ => Self::Over55,
    }
  }
}

/// Whole years between `birth_date` and `today`, as `floor(days / 365)`.
pub fn age_in_years(birth_date: NaiveDate, today: NaiveDate) -> i64 {
  (today - birth_date).num_days() / 365
}

/// Fractional years since `registration_date`, using the 365.25-day year.
pub fn years_as_customer(registration_date: NaiveDate, today: NaiveDate) -> f64 {
  (today - registration_date).num_days() as f64 / 365.25
}

// ─── Margins ─────────────────────────────────────────────────────────────────

/// Absolute per-unit margin; zero unless both prices are present.
pub fn profit_margin(unit_price: Option<f64>, cost_price: Option<f64>) -> f64 {
  match (unit_price, cost_price) {
    (Some(unit), Some(cost)) => unit - cost,
    _ => 0.0,
  }
}

/// Margin as a percentage of unit price; zero when the unit price is zero,
/// negative, or absent.
pub fn profit_margin_percent(margin: f64, unit_price: Option<f64>) -> f64 {
  match unit_price {
    Some(unit) if unit > 0.0 => margin / unit * 100.0,
    _ => 0.0,
  }
}

/// Line-item profit: the line total less the cost of goods sold.
pub fn line_profit(line_total: f64, quantity: i64, cost_price: f64) -> f64 {
  line_total - quantity as f64 * cost_price
}

/// Profit as a percentage of the line total; zero for a zero-value line.
pub fn profit_percent(profit: f64, line_total: f64) -> f64 {
  if line_total > 0.0 {
    profit / line_total * 100.0
  } else {
    0.0
  }
}

/// The monetary value of a percentage discount on a line.
pub fn discount_amount(line_total: f64, discount_percent: f64) -> f64 {
  line_total * (discount_percent / 100.0)
}

// ─── Stock status ────────────────────────────────────────────────────────────

/// Stock-position flags, evaluated independently: out-of-stock implies
/// low-stock by construction, and the flags are not mutually exclusive in
/// the data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockStatus {
  pub is_low_stock:   bool,
  pub is_out_of_stock: bool,
  pub is_overstocked: bool,
}

impl StockStatus {
  pub fn evaluate(quantity_on_hand: i64, reorder_level: i64) -> Self {
    Self {
      is_low_stock:    quantity_on_hand <= reorder_level,
      is_out_of_stock: quantity_on_hand == 0,
      is_overstocked:  quantity_on_hand > reorder_level * 3,
    }
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
