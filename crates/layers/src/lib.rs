pub mod boundaries;
pub mod placenames;
pub mod points;
pub mod ramps;
pub mod scale;

pub use boundaries::{BoundaryRequest, NUTS2JSON_BASE};
pub use placenames::{
    PlacenameFields, PlacenameQuery, PopulationThreshold, default_population_thresholds,
    population_for_scale,
};
pub use points::{
    CoordinateMode, LoadError, LoadOptions, LoadSummary, PointCloudStore, prepare_layer,
};
pub use ramps::{ColorRamp, RampError};
pub use scale::*;
