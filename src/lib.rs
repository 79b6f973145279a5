pub mod block;
pub mod format;
pub mod grid;
pub mod palette;
pub mod structure;

// Re-export commonly used items
pub use block::{
    Block, StateMap, StateValue, StringifyOptions, AIR, DEFAULT_NAMESPACE, STRUCTURE_VOID, WATER,
};
pub use format::{COMPATIBILITY_VERSION, FORMAT_VERSION};
pub use grid::Grid;
pub use mcstructure_common::{Axis, Coordinate, Result, Rotation, Size, StructureError};
pub use mcstructure_nbt::{Compound, NbtFile, Tag, Value};
pub use palette::{Palette, VOID_INDEX};
pub use structure::{has_suitable_size, is_valid_structure_name, Structure, STRUCTURE_MAX_SIZE};
