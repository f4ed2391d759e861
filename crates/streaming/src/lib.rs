pub mod cache;
pub mod pipeline;
pub mod request;
pub mod residency;

pub use cache::*;
pub use pipeline::*;
pub use request::*;
pub use residency::*;
