//! SQLite backends for the Granary store traits.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread pool without blocking the async runtime. [`SqliteSource`] is a
//! read-only adapter over the operational schema; [`SqliteWarehouse`] owns
//! the star schema.

mod schema;
mod source;
mod warehouse;

pub mod error;

pub use error::{Error, Result};
pub use source::SqliteSource;
pub use warehouse::SqliteWarehouse;

#[cfg(test)]
mod tests;
