//! GeoProc Ops - geoprocessing operations over GeoJSON layers
//!
//! [`OperationLibrary`] runs buffer, overlay, clip, dissolve, simplify, spatial joins,
//! area, centroid and merge. Each operation reprojects its inputs into a working CRS
//! chosen for it, and returns WGS 84 GeoJSON, optionally annotated with the
//! projection decision.

pub mod geometry;
pub mod index;
pub mod library;
pub mod metadata;
pub mod operations;
pub mod params;

pub use library::OperationLibrary;
pub use metadata::{attach_crs_metadata, crs_metadata, CrsMetadata, CRS_METADATA_KEY};
pub use operations::{AggFunc, JoinHow, OverlayHow};
pub use params::{CommonOptions, Params};
