//! Dimension key resolution.
//!
//! [`DimensionResolver`] wraps the per-run [`KeyMap`] built from committed
//! dimension state, plus the lazy discover-or-create path for locations.
//! Keeping the two-phase location logic here lets the fact loaders stay
//! declarative: they ask for a key and either get one or skip the row.

use std::collections::HashMap;

use tracing::debug;

use granary_core::{
  keymap::{Dimension, KeyMap},
  model::{LocationDim, LocationKey, LocationKind, NaturalKey, SurrogateKey},
  region::RegionMap,
  store::Warehouse,
};

use crate::{Error, Result};

pub struct DimensionResolver<'a, W: Warehouse> {
  keys:      KeyMap,
  warehouse: &'a W,
  regions:   &'a RegionMap,
  /// In-run cache of resolved location keys. Discarded with the resolver;
  /// never persisted across runs.
  locations: HashMap<LocationKey, SurrogateKey>,
}

impl<'a, W: Warehouse> DimensionResolver<'a, W> {
  /// Build the key map from current dimension rows. Must run after all
  /// dimension loads have committed — this is the hard ordering barrier
  /// between dimension and fact loading.
  pub async fn build(warehouse: &'a W, regions: &'a RegionMap) -> Result<Self> {
    let customers = warehouse.customer_keys().await.map_err(Error::load)?;
    let products = warehouse.product_keys().await.map_err(Error::load)?;
    let suppliers = warehouse.supplier_keys().await.map_err(Error::load)?;

    let keys = KeyMap::new(customers, products, suppliers);
    debug!(entries = keys.len(), "dimension key map built");

    Ok(Self {
      keys,
      warehouse,
      regions,
      locations: HashMap::new(),
    })
  }

  /// Resolve a customer natural key; a miss is row-scoped.
  pub fn customer(&self, id: NaturalKey) -> Result<SurrogateKey, granary_core::Error> {
    self.keys.resolve(Dimension::Customer, id)
  }

  pub fn product(&self, id: NaturalKey) -> Result<SurrogateKey, granary_core::Error> {
    self.keys.resolve(Dimension::Product, id)
  }

  pub fn supplier(&self, id: NaturalKey) -> Result<SurrogateKey, granary_core::Error> {
    self.keys.resolve(Dimension::Supplier, id)
  }

  /// Resolve a location, creating the dimension row on first sight.
  ///
  /// Lookup order: in-run cache, exact-match warehouse row, then an
  /// idempotent insert (conflict-ignoring, backed by the storage-layer
  /// uniqueness constraint) followed by a read of the assigned key.
  /// Repeated calls with the same composite key return the same surrogate.
  pub async fn location(
    &mut self,
    key: &LocationKey,
    kind: LocationKind,
  ) -> Result<SurrogateKey> {
    if let Some(&resolved) = self.locations.get(key) {
      return Ok(resolved);
    }

    let resolved = match self
      .warehouse
      .find_location(key.clone())
      .await
      .map_err(Error::load)?
    {
      Some(existing) => existing,
      None => {
        let region = self.regions.region_for(&key.state).to_owned();
        debug!(?key, region, "creating location dimension row");
        self
          .warehouse
          .insert_location(LocationDim { key: key.clone(), kind, region })
          .await
          .map_err(Error::load)?
      }
    };

    self.locations.insert(key.clone(), resolved);
    Ok(resolved)
  }
}
