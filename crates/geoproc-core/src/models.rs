pub mod bbox;
pub mod crs;
pub mod decision;
pub mod operation;
pub mod units;

pub use bbox::{BBoxMetrics, BoundingBox};
pub use crs::{Crs, CrsDefinition};
pub use decision::{
    DecisionInputs, DecisionRule, DecisionStep, ProjectionDecision, PropertySource,
};
pub use operation::{OperationType, ProjectionProperty};
pub use units::{AreaUnit, DistanceUnit};
