//! State → region classification.
//!
//! One shared, configuration-driven lookup consulted by both the bulk
//! location loader and the lazy resolver, so the two paths can never drift.

use std::collections::HashMap;

/// Fallback region for states with no mapping.
pub const DEFAULT_REGION: &str = "Other";

#[derive(Debug, Clone)]
pub struct RegionMap {
  by_state: HashMap<String, String>,
}

impl RegionMap {
  /// The builtin US mapping.
  pub fn builtin() -> Self {
    let by_state = [
      ("CA", "West"),
      ("OR", "West"),
      ("WA", "West"),
      ("NY", "East"),
      ("MA", "East"),
      ("PA", "East"),
      ("TX", "South"),
      ("FL", "South"),
      ("GA", "South"),
      ("IL", "Central"),
      ("OH", "Central"),
      ("MI", "Central"),
    ]
    .into_iter()
    .map(|(s, r)| (s.to_owned(), r.to_owned()))
    .collect();

    Self { by_state }
  }

  /// The builtin mapping with configured entries layered on top. Overrides
  /// win on conflict and may introduce new states.
  pub fn with_overrides(overrides: &HashMap<String, String>) -> Self {
    let mut map = Self::builtin();
    for (state, region) in overrides {
      map.by_state.insert(state.clone(), region.clone());
    }
    map
  }

  /// Classify a state code; unmapped or empty states fall back to
  /// [`DEFAULT_REGION`].
  pub fn region_for(&self, state: &str) -> &str {
    self
      .by_state
      .get(state)
      .map(String::as_str)
      .unwrap_or(DEFAULT_REGION)
  }
}

impl Default for RegionMap {
  fn default() -> Self {
    Self::builtin()
  }
}
