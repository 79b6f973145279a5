pub mod error;
pub mod types;

pub use error::StructureError;
pub use types::{Axis, Coordinate, Result, Rotation, Size};
