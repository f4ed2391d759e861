pub mod bounds;
pub mod color;
pub mod math;
pub mod space;

// Foundation crate: small, well-tested primitives only.
pub use bounds::*;
pub use color::*;
pub use space::*;
