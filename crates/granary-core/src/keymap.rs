//! Per-run dimension key maps.
//!
//! A [`KeyMap`] is built once per pipeline run from committed dimension
//! state and is immutable afterwards. It is never cached across runs —
//! always rebuilt so new surrogate keys assigned by a previous run are
//! visible and stale entries are impossible.

use std::{collections::HashMap, fmt};

use crate::{
  Error, Result,
  model::{NaturalKey, SurrogateKey},
};

/// The dimension a key lookup targets. Used in error reporting and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
  Customer,
  Product,
  Supplier,
  Location,
  Date,
}

impl Dimension {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Customer => "customer",
      Self::Product => "product",
      Self::Supplier => "supplier",
      Self::Location => "location",
      Self::Date => "date",
    }
  }
}

impl fmt::Display for Dimension {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Natural-key → surrogate-key maps for the fully-preloaded dimensions.
///
/// Customer, product, and supplier dimensions are loaded and committed
/// before facts run, so a miss here is a data error on the fact row, not a
/// signal to create a dimension row. Location is absent by design: it is
/// resolved lazily through the resolver's create path.
#[derive(Debug, Clone, Default)]
pub struct KeyMap {
  customers: HashMap<NaturalKey, SurrogateKey>,
  products:  HashMap<NaturalKey, SurrogateKey>,
  suppliers: HashMap<NaturalKey, SurrogateKey>,
}

impl KeyMap {
  pub fn new(
    customers: HashMap<NaturalKey, SurrogateKey>,
    products: HashMap<NaturalKey, SurrogateKey>,
    suppliers: HashMap<NaturalKey, SurrogateKey>,
  ) -> Self {
    Self { customers, products, suppliers }
  }

  /// Look up the surrogate key for a natural key in the given dimension.
  ///
  /// A miss yields [`Error::UnresolvedKey`]; callers treat it as row-scoped
  /// and skip the offending fact row.
  pub fn resolve(
    &self,
    dimension: Dimension,
    natural_key: NaturalKey,
  ) -> Result<SurrogateKey> {
    let map = match dimension {
      Dimension::Customer => &self.customers,
      Dimension::Product => &self.products,
      Dimension::Supplier => &self.suppliers,
      // Location and date keys are not held here.
      Dimension::Location | Dimension::Date => {
        return Err(Error::UnresolvedKey { dimension, natural_key });
      }
    };

    map
      .get(&natural_key)
      .copied()
      .ok_or(Error::UnresolvedKey { dimension, natural_key })
  }

  pub fn len(&self) -> usize {
    self.customers.len() + self.products.len() + self.suppliers.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}
