//! GeoProc Core - Domain models, errors, and configuration
//!
//! This crate contains the shared vocabulary of the geoprocessing engine: bounding boxes,
//! CRS definitions, operation types, projection decision records and layered configuration.

pub mod config;
pub mod error;
pub mod models;

pub use error::{GeoprocError, Result};
