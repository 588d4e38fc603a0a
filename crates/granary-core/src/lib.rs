//! Core types and trait definitions for the Granary warehouse ETL engine.
//!
//! This crate is deliberately free of database dependencies. The pipeline and
//! storage crates depend on it; it depends on nothing proprietary.

pub mod calendar;
pub mod error;
pub mod keymap;
pub mod measures;
pub mod model;
pub mod region;
pub mod store;

pub use error::{Error, Result};
