//! The `.mcstructure` document: a little-endian tag tree of the shape
//!
//! ```text
//! format_version: int = 1
//! size: [int; 3]
//! structure:
//!     block_indices: [[int], [int]]      primary layer, waterlog layer
//!     entities: [compound]
//!     palette:
//!         default:
//!             block_palette: [{name, states, version}]
//!             block_position_data: {"<palette index>": compound}
//! structure_world_origin: [int; 3] = [0, 0, 0]
//! ```
//!
//! Both index layers list cells with X outermost and Z varying fastest.

use crate::block::{Block, StateMap, StateValue, WATER};
use crate::grid::{volume, Grid};
use crate::palette::{Palette, VOID_INDEX};
use crate::structure::{has_suitable_size, Structure};
use log::{debug, trace, warn};
use mcstructure_common::{Result, Size, StructureError};
use mcstructure_nbt::{Compound, NbtFile, Tag, Value, TAG_COMPOUND, TAG_LIST};
use std::collections::{HashMap, HashSet};
use std::io::{Read, Write};

pub const FORMAT_VERSION: i32 = 1;

/// Game version stamp written with every palette entry. Its four bytes are
/// the four parts of a version number; it is copied, never interpreted.
pub const COMPATIBILITY_VERSION: i32 = 17959425;

impl TryFrom<Value> for StateValue {
    type Error = StructureError;

    fn try_from(value: Value) -> Result<Self> {
        let out_of_range =
            |n: i64| StructureError::format(format!("Block state {} does not fit in an int", n));
        match value {
            Value::Bool(b) => Ok(StateValue::Bool(b)),
            Value::Byte(b) => Ok(StateValue::Bool(b != 0)),
            Value::Short(n) => Ok(StateValue::Int(n.into())),
            Value::Int(n) => Ok(StateValue::Int(n)),
            Value::Long(n) => i32::try_from(n).map(StateValue::Int).map_err(|_| out_of_range(n)),
            Value::String(s) => Ok(StateValue::String(s)),
            other => Err(StructureError::format(format!(
                "Unsupported block state value {:?}",
                other
            ))),
        }
    }
}

impl From<&StateValue> for Value {
    fn from(value: &StateValue) -> Self {
        match value {
            StateValue::String(s) => Value::String(s.clone()),
            StateValue::Bool(b) => Value::Bool(*b),
            StateValue::Int(n) => Value::Int(*n),
        }
    }
}

fn states_from_tag(tag: &Tag) -> Result<StateMap> {
    let compound = tag.as_compound().ok_or_else(|| {
        StructureError::format(format!("Block states must be a compound, got {}", tag.type_name()))
    })?;
    compound
        .iter()
        .map(|(key, tag)| {
            let value = Value::try_from(tag).map_err(|e| StructureError::format(e.to_string()))?;
            Ok((key.to_string(), StateValue::try_from(value)?))
        })
        .collect()
}

fn states_to_tag(states: &StateMap) -> Tag {
    Tag::Compound(
        states
            .iter()
            .map(|(key, value)| (key, Tag::from(Value::from(value))))
            .collect(),
    )
}

fn field<'a>(compound: &'a Compound, name: &str) -> Result<&'a Tag> {
    compound
        .get(name)
        .ok_or_else(|| StructureError::format(format!("Missing field `{}`", name)))
}

fn compound_field<'a>(compound: &'a Compound, name: &str) -> Result<&'a Compound> {
    let tag = field(compound, name)?;
    tag.as_compound().ok_or_else(|| {
        StructureError::format(format!(
            "Field `{}` must be a compound, got {}",
            name,
            tag.type_name()
        ))
    })
}

fn list_items<'a>(tag: &'a Tag, name: &str) -> Result<&'a [Tag]> {
    tag.as_list().map(Vec::as_slice).ok_or_else(|| {
        StructureError::format(format!("Field `{}` must be a list, got {}", name, tag.type_name()))
    })
}

fn int_items(tag: &Tag, name: &str) -> Result<Vec<i32>> {
    list_items(tag, name)?
        .iter()
        .map(|item| {
            item.as_i32().ok_or_else(|| {
                StructureError::format(format!(
                    "Field `{}` must hold ints, found {}",
                    name,
                    item.type_name()
                ))
            })
        })
        .collect()
}

fn read_size(root: &Compound) -> Result<Size> {
    let extents = int_items(field(root, "size")?, "size")?;
    match extents.as_slice() {
        &[x, y, z] => {
            let axis = |n: i32| {
                usize::try_from(n).map_err(|_| {
                    StructureError::format(format!("Negative structure size {:?}", extents))
                })
            };
            Ok((axis(x)?, axis(y)?, axis(z)?))
        }
        _ => Err(StructureError::format(format!(
            "Structure size must have 3 entries, found {}",
            extents.len()
        ))),
    }
}

fn check_layer(layer: &[i32], palette_len: usize, name: &str) -> Result<()> {
    let out_of_range = |index: i32| usize::try_from(index).map_or(true, |i| i >= palette_len);
    match layer.iter().find(|&&index| index != VOID_INDEX && out_of_range(index)) {
        Some(index) => Err(StructureError::format(format!(
            "{} index {} is outside a palette of {} blocks",
            name, index, palette_len
        ))),
        None => Ok(()),
    }
}

fn read_palette_entry(tag: &Tag) -> Result<Block> {
    let entry = tag.as_compound().ok_or_else(|| {
        StructureError::format(format!("Palette entry must be a compound, got {}", tag.type_name()))
    })?;
    let name = field(entry, "name")?
        .as_string()
        .ok_or_else(|| StructureError::format("Palette entry name must be a string"))?;
    let states = match entry.get("states") {
        Some(states) => states_from_tag(states)?,
        None => StateMap::new(),
    };
    Ok(Block::new(name).with_states(states))
}

fn palette_entry_to_tag(block: &Block) -> Tag {
    Tag::Compound(
        Compound::new()
            .with("name", Tag::String(block.identifier()))
            .with("states", states_to_tag(block.states()))
            .with("version", Tag::Int(COMPATIBILITY_VERSION)),
    )
}

/// Turns cells flagged by the waterlog layer into their waterlogged blocks.
///
/// A palette entry whose cells are all flagged becomes the waterlogged block
/// in place; one shared with dry cells gets a separate waterlogged entry.
fn decode_waterlogging(palette: &mut Palette, cells: &mut [i32], wet: &[bool]) -> Result<()> {
    let mut dry_uses = vec![0usize; palette.len()];
    let mut wet_uses = vec![0usize; palette.len()];
    for (&cell, &is_wet) in cells.iter().zip(wet) {
        match (usize::try_from(cell), is_wet) {
            (Ok(index), true) => wet_uses[index] += 1,
            (Ok(index), false) => dry_uses[index] += 1,
            (Err(_), true) => trace!("Dropping waterlog flag on a void cell"),
            (Err(_), false) => {}
        }
    }

    let mut wet_index: HashMap<i32, i32> = HashMap::new();
    for index in (0..wet_uses.len()).filter(|&i| wet_uses[i] > 0) {
        let block = palette
            .get(index)
            .map(|block| block.clone().with_waterlogged(true))
            .ok_or_else(|| StructureError::format("Waterlogged cell has no block"))?;
        let target = match palette.index_of(&block) {
            Some(existing) => existing,
            None if dry_uses[index] == 0 => {
                palette.replace(index, block);
                index
            }
            None => palette.intern(&block),
        };
        wet_index.insert(index as i32, target as i32);
    }

    for (cell, &is_wet) in cells.iter_mut().zip(wet) {
        if is_wet {
            if let Some(&target) = wet_index.get(&*cell) {
                *cell = target;
            }
        }
    }
    Ok(())
}

impl Structure {
    /// Reads a structure file.
    ///
    /// Truncated or malformed input is a [`StructureError::Format`]; other
    /// stream failures come back as [`StructureError::Io`].
    pub fn load<R: Read>(reader: &mut R) -> Result<Structure> {
        let file = NbtFile::read_le(reader).map_err(StructureError::from_read_error)?;
        Structure::from_nbt(&file.root)
    }

    /// Writes the structure as a structure file.
    pub fn dump<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.as_nbt().write_le(writer)?;
        Ok(())
    }

    /// Builds a structure from the root compound of a structure file.
    pub fn from_nbt(root: &Compound) -> Result<Structure> {
        if let Some(version) = root.get("format_version") {
            if version.as_i32() != Some(FORMAT_VERSION) {
                return Err(StructureError::format(format!(
                    "Unsupported format version {:?}",
                    version
                )));
            }
        }

        let size = read_size(root)?;
        let cell_count = volume(size).ok_or_else(|| {
            StructureError::format(format!("Structure size {:?} is too large", size))
        })?;
        if !has_suitable_size(size) {
            warn!("Structure size {:?} is larger than the game allows", size);
        }

        let body = compound_field(root, "structure")?;
        let layers = list_items(field(body, "block_indices")?, "block_indices")?;
        let primary = match layers.first() {
            Some(layer) => int_items(layer, "block_indices")?,
            None => return Err(StructureError::format("Missing primary block index layer")),
        };
        let secondary = match layers.get(1) {
            Some(layer) => int_items(layer, "block_indices")?,
            None => vec![VOID_INDEX; primary.len()],
        };
        if primary.len() != cell_count || secondary.len() != cell_count {
            return Err(StructureError::format(format!(
                "Structure of size {:?} needs {} indices per layer, found {} and {}",
                size,
                cell_count,
                primary.len(),
                secondary.len()
            )));
        }

        let default = compound_field(compound_field(body, "palette")?, "default")?;
        let mut entries = list_items(field(default, "block_palette")?, "block_palette")?
            .iter()
            .map(read_palette_entry)
            .collect::<Result<Vec<Block>>>()?;
        check_layer(&primary, entries.len(), "Block")?;
        check_layer(&secondary, entries.len(), "Waterlog")?;

        if let Some(position_data) = default.get("block_position_data") {
            let position_data = position_data.as_compound().ok_or_else(|| {
                StructureError::format("Field `block_position_data` must be a compound")
            })?;
            for (key, payload) in position_data.iter() {
                let entry = key
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| entries.get_mut(index))
                    .ok_or_else(|| {
                        StructureError::format(format!(
                            "Extra data key `{}` is not a palette index",
                            key
                        ))
                    })?;
                let payload = payload.as_compound().ok_or_else(|| {
                    StructureError::format(format!("Extra data for `{}` must be a compound", key))
                })?;
                entry.add_extra_data(payload);
            }
        }

        let entities = match body.get("entities") {
            Some(tag) => list_items(tag, "entities")?.to_vec(),
            None => Vec::new(),
        };
        if let Some(entity) = entities.iter().find(|e| e.as_compound().is_none()) {
            return Err(StructureError::format(format!(
                "Entity must be a compound, got {}",
                entity.type_name()
            )));
        }

        let mut structure = Structure::void(size)?;
        let remap: Vec<i32> = entries
            .iter()
            .map(|block| structure.palette.intern(block) as i32)
            .collect();
        if structure.palette.len() < entries.len() {
            warn!(
                "Merged {} duplicate palette entries",
                entries.len() - structure.palette.len()
            );
        }

        let mut cells: Vec<i32> = primary
            .iter()
            .map(|&index| match index {
                VOID_INDEX => VOID_INDEX,
                index => remap[index as usize],
            })
            .collect();
        let wet: Vec<bool> = secondary.iter().map(|&liquid| liquid != VOID_INDEX).collect();
        decode_waterlogging(&mut structure.palette, &mut cells, &wet)?;

        // Entries the second layer points at (still water) are not blocks of
        // any cell; drop them unless a cell uses them too.
        let liquid_entries: HashSet<i32> = secondary
            .iter()
            .filter(|&&liquid| liquid != VOID_INDEX)
            .map(|&liquid| remap[liquid as usize])
            .collect();
        if !liquid_entries.is_empty() {
            let used: HashSet<i32> = cells.iter().copied().collect();
            let mapping = structure.palette.retain(|index| {
                let index = index as i32;
                used.contains(&index) || !liquid_entries.contains(&index)
            });
            for cell in cells.iter_mut().filter(|cell| **cell != VOID_INDEX) {
                *cell = mapping[*cell as usize];
            }
        }

        structure.indices = Grid::from_vec(size, cells)
            .map_err(|_| StructureError::format("Index layer does not match the structure size"))?;
        structure.entities = entities;

        debug!(
            "Loaded structure of size {:?} with {} palette entries and {} entities",
            size,
            structure.palette.len(),
            structure.entities.len()
        );
        Ok(structure)
    }

    /// The tag tree written by [`Structure::dump`].
    ///
    /// Waterlogged cells point their second layer at still water. If the
    /// palette has no such block it is appended to the written palette only;
    /// the structure itself is not changed.
    pub fn as_nbt(&self) -> NbtFile {
        let mut palette: Vec<&Block> = self.palette.iter().collect();
        let any_wet = palette.iter().any(|block| block.is_waterlogged());
        let water_index = if any_wet {
            match self.palette.index_of(&WATER) {
                Some(index) => index as i32,
                None => {
                    palette.push(&*WATER);
                    (palette.len() - 1) as i32
                }
            }
        } else {
            VOID_INDEX
        };

        let primary = Tag::int_list(self.indices.iter().copied());
        let secondary = Tag::int_list(self.indices.iter().map(|&index| {
            match self.palette.resolve(index) {
                Some(block) if block.is_waterlogged() => water_index,
                _ => VOID_INDEX,
            }
        }));

        let block_palette = palette.iter().map(|block| palette_entry_to_tag(block)).collect();
        let position_data: Compound = palette
            .iter()
            .enumerate()
            .filter(|(_, block)| block.has_extra_data())
            .map(|(index, block)| (index.to_string(), Tag::Compound(block.extra_data().clone())))
            .collect();

        let (x, y, z) = self.size();
        let body = Compound::new()
            .with("block_indices", Tag::list_of(TAG_LIST, vec![primary, secondary]))
            .with("entities", Tag::list_of(TAG_COMPOUND, self.entities.clone()))
            .with(
                "palette",
                Tag::Compound(Compound::new().with(
                    "default",
                    Tag::Compound(
                        Compound::new()
                            .with("block_palette", Tag::list_of(TAG_COMPOUND, block_palette))
                            .with("block_position_data", Tag::Compound(position_data)),
                    ),
                )),
            );
        let root = Compound::new()
            .with("format_version", Tag::Int(FORMAT_VERSION))
            .with("size", Tag::int_list([x as i32, y as i32, z as i32]))
            .with("structure", Tag::Compound(body))
            .with("structure_world_origin", Tag::int_list([0, 0, 0]));

        debug!(
            "Serialized structure of size {:?} with {} palette entries",
            self.size(),
            palette.len()
        );
        NbtFile::new(String::new(), root)
    }
}
