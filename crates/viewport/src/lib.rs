pub mod camera;
pub mod controller;
pub mod pan_zoom;

pub use camera::*;
pub use controller::*;
pub use pan_zoom::*;
