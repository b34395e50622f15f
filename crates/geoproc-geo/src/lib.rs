//! GeoProc Geo - projection selection, CRS transformation and feature tables
//!
//! This crate decides working projections for geoprocessing operations, generates
//! custom projection definitions, reprojects feature tables and chooses between
//! planar and geodesic buffering.

pub mod adapter;
pub mod buffer;
pub mod catalog;
pub mod decider;
pub mod metrics;
pub mod spatial;
pub mod table;
pub mod transform;
pub mod validation;
pub mod wkt;

pub use adapter::{prepare_table_for_operation, prepare_tables_for_operation, CrsOptions, CrsSelection};
pub use buffer::{choose_buffer_method, create_geodesic_buffer_point, BufferMethod};
pub use decider::{decide_projection, ProjectionDecider};
pub use metrics::{compute_bbox_metrics, compute_utm_zone};
pub use table::{FeatureRow, FeatureTable};
pub use transform::{reproject_geometry, validate_crs, Reprojector};
pub use wkt::wkt_hash;
