//! Date dimension generator.
//!
//! Materialises one [`DateRow`] per calendar day over an inclusive range.
//! All attributes are pure functions of the date, so upserting the same
//! range twice is a no-op at the storage layer.

use chrono::{Datelike, NaiveDate};

use crate::{
  Error, Result,
  model::DateRow,
};

/// Integer date key in `YYYYMMDD` form, e.g. 2024-03-01 → 20240301.
pub fn date_key(date: NaiveDate) -> i64 {
  date.year() as i64 * 10_000 + date.month() as i64 * 100 + date.day() as i64
}

/// Build the [`DateRow`] for a single day.
pub fn date_row(date: NaiveDate) -> DateRow {
  let day_of_week = date.weekday().number_from_monday();
  let quarter = (date.month() - 1) / 3 + 1;

  DateRow {
    date_key: date_key(date),
    full_date: date,
    day_of_week,
    day_name: date.format("%A").to_string(),
    day_of_month: date.day(),
    day_of_year: date.ordinal(),
    week_of_year: date.iso_week().week(),
    month_number: date.month(),
    month_name: date.format("%B").to_string(),
    quarter_number: quarter,
    quarter_name: format!("Q{quarter}"),
    year_number: date.year(),
    is_weekend: day_of_week >= 6,
    is_holiday: false,
  }
}

/// Generate rows for every day in `[start, end]`, inclusive on both ends.
pub fn generate(start: NaiveDate, end: NaiveDate) -> Result<Vec<DateRow>> {
  if start > end {
    return Err(Error::InvalidDateRange { start, end });
  }

  let mut rows = Vec::with_capacity((end - start).num_days() as usize + 1);
  let mut current = Some(start);
  while let Some(day) = current {
    if day > end {
      break;
    }
    rows.push(date_row(day));
    // `succ_opt` is `None` at the end of the calendar; stop there.
    current = day.succ_opt();
  }
  Ok(rows)
}
