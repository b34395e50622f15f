//! One module per operation, each adding its method to [`OperationLibrary`](crate::OperationLibrary)

mod area;
mod buffer;
mod centroid;
mod clip;
mod dissolve;
mod merge;
mod overlay;
mod simplify;
mod sjoin;

pub use dissolve::AggFunc;
pub use overlay::OverlayHow;
pub use simplify::simplify_geometry;
pub use sjoin::JoinHow;
