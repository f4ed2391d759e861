pub mod config;
pub mod engine;
pub mod error;
pub mod tooltip;

pub use config::{
    BoundaryOptions, LegendKind, LegendOptions, LegendOrientation, PlacenameOptions, ViewerConfig,
    ViewerConfigBuilder, ViewerOptions,
};
pub use engine::{TOOLTIP_WIDTH_PX, Viewer, ViewerEvent};
pub use error::{ConfigError, ViewerError};
pub use tooltip::{Tooltip, TooltipState};
