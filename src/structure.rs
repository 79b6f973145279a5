use crate::block::{Block, StringifyOptions, STRUCTURE_VOID};
use crate::grid::{volume, Grid};
use crate::palette::{Palette, VOID_INDEX};
use log::debug;
use mcstructure_common::{Axis, Coordinate, Result, Rotation, Size, StructureError};
use mcstructure_nbt::Tag;
use std::cmp::{max, min};
use std::fmt;

/// The largest structure the game lets a structure block save.
pub const STRUCTURE_MAX_SIZE: Size = (64, 384, 64);

/// Whether every axis of `size` is within [`STRUCTURE_MAX_SIZE`].
pub fn has_suitable_size(size: Size) -> bool {
    size.0 <= STRUCTURE_MAX_SIZE.0 && size.1 <= STRUCTURE_MAX_SIZE.1 && size.2 <= STRUCTURE_MAX_SIZE.2
}

/// Whether `name` may be used as a structure name: ASCII letters, digits,
/// `-` and `_`. With `with_prefix`, one `namespace:` separator is accepted.
pub fn is_valid_structure_name(name: &str, with_prefix: bool) -> bool {
    let name = if with_prefix {
        name.replacen(':', "", 1)
    } else {
        name.to_string()
    };
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn check_size(size: Size) -> Result<()> {
    if has_suitable_size(size) {
        Ok(())
    } else {
        Err(StructureError::value(format!(
            "Structure size {:?} exceeds the maximum of {:?}",
            size, STRUCTURE_MAX_SIZE
        )))
    }
}

/// A rectangular grid of blocks plus the entities placed in it.
///
/// Cells store palette positions; [`VOID_INDEX`] marks structure void.
#[derive(Debug, Clone)]
pub struct Structure {
    pub(crate) indices: Grid<i32>,
    pub(crate) palette: Palette,
    pub(crate) entities: Vec<Tag>,
}

impl Structure {
    /// Creates a structure of `size`. With a `fill` block every cell holds
    /// it and the palette is `[fill]`; without one every cell is void.
    pub fn new(size: Size, fill: Option<&Block>) -> Result<Self> {
        check_size(size)?;
        let mut structure = Structure::void(size)?;
        if let Some(block) = fill {
            let index = structure.palette.intern(block) as i32;
            structure.indices.iter_mut().for_each(|cell| *cell = index);
        }
        Ok(structure)
    }

    /// A void structure of any size that fits in memory. Used for files
    /// written by other tools, which may exceed the in-game limit.
    pub(crate) fn void(size: Size) -> Result<Self> {
        if volume(size).is_none() {
            return Err(StructureError::value(format!(
                "Structure size {:?} is too large",
                size
            )));
        }
        Ok(Structure {
            indices: Grid::filled(size, VOID_INDEX),
            palette: Palette::new(),
            entities: Vec::new(),
        })
    }

    pub fn size(&self) -> Size {
        self.indices.size()
    }

    pub fn palette(&self) -> &[Block] {
        self.palette.as_slice()
    }

    /// The raw palette-index grid.
    pub fn indices(&self) -> &Grid<i32> {
        &self.indices
    }

    pub fn entities(&self) -> &[Tag] {
        &self.entities
    }

    /// Palette positions whose block carries extra data.
    pub fn special_block_indices(&self) -> Vec<usize> {
        self.palette
            .iter()
            .enumerate()
            .filter(|(_, block)| block.has_extra_data())
            .map(|(index, _)| index)
            .collect()
    }

    /// Appends an entity. Entities are stored as given; they must be
    /// compound tags.
    pub fn add_entity(&mut self, entity: Tag) -> Result<&mut Self> {
        if entity.as_compound().is_none() {
            return Err(StructureError::value(format!(
                "Entity must be a compound tag, got {}",
                entity.type_name()
            )));
        }
        self.entities.push(entity);
        Ok(self)
    }

    fn index_error(&self, coordinate: Coordinate) -> StructureError {
        StructureError::Index {
            coordinate,
            size: self.size(),
        }
    }

    fn checked_index(&self, coordinate: Coordinate) -> Result<usize> {
        self.indices
            .index_of(coordinate)
            .ok_or_else(|| self.index_error(coordinate))
    }

    fn checked_position(&self, coordinate: Coordinate) -> Result<(usize, usize, usize)> {
        self.checked_index(coordinate)?;
        let (x, y, z) = coordinate;
        Ok((x as usize, y as usize, z as usize))
    }

    /// The block at `coordinate`; structure void for empty cells.
    pub fn get_block(&self, coordinate: Coordinate) -> Result<&Block> {
        let index = self.checked_index(coordinate)?;
        let value = self.indices.as_slice()[index];
        Ok(self.palette.resolve(value).unwrap_or(&*STRUCTURE_VOID))
    }

    /// A snapshot with every cell resolved to its block.
    pub fn get_structure(&self) -> Grid<Block> {
        self.indices
            .map(|&index| self.palette.resolve(index).unwrap_or(&*STRUCTURE_VOID).clone())
    }

    /// Every cell rendered with [`Block::stringify`].
    pub fn get_str_array(&self, options: StringifyOptions) -> Grid<String> {
        let rendered: Vec<String> = self.palette.iter().map(|b| b.stringify(options)).collect();
        let void = STRUCTURE_VOID.stringify(options);
        self.indices.map(|&index| {
            usize::try_from(index)
                .ok()
                .and_then(|i| rendered.get(i))
                .unwrap_or(&void)
                .clone()
        })
    }

    /// Places `block` at `coordinate`; `None` makes the cell void.
    pub fn set_block(&mut self, coordinate: Coordinate, block: Option<&Block>) -> Result<&mut Self> {
        let index = self.checked_index(coordinate)?;
        let value = self.palette.intern_optional(block);
        self.indices.as_mut_slice()[index] = value;
        Ok(self)
    }

    /// Fills the box spanned by `from` and `to`, both corners included.
    /// The corners may be given in any order on any axis.
    pub fn fill_blocks(
        &mut self,
        from: Coordinate,
        to: Coordinate,
        block: Option<&Block>,
    ) -> Result<&mut Self> {
        let from = self.checked_position(from)?;
        let to = self.checked_position(to)?;
        let low = (min(from.0, to.0), min(from.1, to.1), min(from.2, to.2));
        let high = (max(from.0, to.0), max(from.1, to.1), max(from.2, to.2));

        let value = self.palette.intern_optional(block);
        self.indices.fill_box(low, high, value);
        Ok(self)
    }

    /// Changes the size of the structure. Cells inside both the old and the
    /// new size keep their block, cells outside the new size are dropped and
    /// newly added cells get `fill`.
    pub fn resize(&mut self, size: Size, fill: Option<&Block>) -> Result<&mut Self> {
        check_size(size)?;
        let old = self.size();
        if size == old {
            return Ok(self);
        }
        debug!("Resizing structure from {:?} to {:?}", old, size);

        let grows = size.0 > old.0 || size.1 > old.1 || size.2 > old.2;
        let value = if grows {
            self.palette.intern_optional(fill)
        } else {
            VOID_INDEX
        };

        let overlap = (min(old.0, size.0), min(old.1, size.1), min(old.2, size.2));
        let mut resized = Grid::filled(size, value);
        resized.blit(&self.indices, overlap, (0, 0, 0));
        self.indices = resized;
        Ok(self)
    }

    /// Builds a new structure holding `self` at the origin and `other` at
    /// `position`, growing as needed. Where both overlap, `other` wins.
    /// Entities of both are kept, `self`'s first.
    pub fn combine(&self, other: &Structure, position: Coordinate) -> Result<Structure> {
        let (ox, oy, oz) = position;
        if ox < 0 || oy < 0 || oz < 0 {
            return Err(StructureError::value(format!(
                "Negative coordinates are not allowed: {:?}",
                position
            )));
        }
        let offset = (ox as usize, oy as usize, oz as usize);
        let (a, b) = (self.size(), other.size());
        let size = (
            max(a.0, offset.0 + b.0),
            max(a.1, offset.1 + b.1),
            max(a.2, offset.2 + b.2),
        );
        debug!(
            "Combining {:?} with {:?} at {:?} into {:?}",
            a, b, position, size
        );

        let mut combined = Structure::new(size, None)?;
        combined.palette = self.palette.clone();
        combined.indices.blit(&self.indices, a, (0, 0, 0));

        let mapping: Vec<i32> = other
            .palette
            .iter()
            .map(|block| combined.palette.intern(block) as i32)
            .collect();
        let remapped = other.indices.map(|&index| {
            usize::try_from(index)
                .ok()
                .and_then(|i| mapping.get(i).copied())
                .unwrap_or(VOID_INDEX)
        });
        combined.indices.blit(&remapped, b, offset);

        combined.entities = self
            .entities
            .iter()
            .chain(other.entities.iter())
            .cloned()
            .collect();
        Ok(combined)
    }

    /// Flips the structure along `axis`.
    pub fn mirror(&mut self, axis: Axis) -> &mut Self {
        let (sx, _, sz) = self.size();
        let source = &self.indices;
        self.indices = Grid::from_fn(source.size(), |(x, y, z)| match axis {
            Axis::X => *source.at((sx - 1 - x, y, z)),
            Axis::Z => *source.at((x, y, sz - 1 - z)),
        });
        self
    }

    /// Rotates the structure about the vertical axis. Quarter turns swap the
    /// X and Z extents. Block states such as facing directions are left as
    /// they are.
    pub fn rotate(&mut self, rotation: Rotation) -> &mut Self {
        let (sx, sy, sz) = self.size();
        let size = if rotation.swaps_horizontal_axes() {
            (sz, sy, sx)
        } else {
            (sx, sy, sz)
        };
        let source = &self.indices;
        self.indices = Grid::from_fn(size, |(x, y, z)| match rotation {
            Rotation::Clockwise90 => *source.at((z, y, sz - 1 - x)),
            Rotation::Clockwise180 => *source.at((sx - 1 - x, y, sz - 1 - z)),
            Rotation::Clockwise270 => *source.at((sx - 1 - z, y, x)),
        });
        self
    }
}

impl fmt::Display for Structure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get_str_array(StringifyOptions::NAME_ONLY))
    }
}
