pub mod grid_csv;
pub mod grid_json;

pub use grid_csv::{GridDecodeError, decode_grid_csv, read_grid_csv};
pub use grid_json::decode_grid_json;
