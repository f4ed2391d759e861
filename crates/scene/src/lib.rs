pub mod buffers;
pub mod highlight;
pub mod picking;

pub use buffers::*;
pub use highlight::*;
pub use picking::*;
