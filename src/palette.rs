use crate::block::Block;
use log::trace;
use std::collections::HashMap;

/// Grid value for a cell without a block. Never a palette position.
pub const VOID_INDEX: i32 = -1;

/// Ordered, duplicate-free list of the blocks a structure uses.
#[derive(Debug, Clone, Default)]
pub struct Palette {
    blocks: Vec<Block>,
    block_to_index: HashMap<Block, usize>,
}

impl Palette {
    pub fn new() -> Self {
        Palette::default()
    }

    /// Position of `block`, adding it if no equal block is present yet.
    ///
    /// When an equal block already exists its extra data is merged with the
    /// extra data carried by `block`.
    pub fn intern(&mut self, block: &Block) -> usize {
        if let Some(&index) = self.block_to_index.get(block) {
            if block.has_extra_data() {
                self.blocks[index].add_extra_data(block.extra_data());
            }
            return index;
        }

        let index = self.blocks.len();
        trace!("Palette entry {} = {}", index, block);
        self.blocks.push(block.clone());
        self.block_to_index.insert(block.clone(), index);
        index
    }

    /// Grid value for an optional block: its palette position, or
    /// [`VOID_INDEX`] for `None`.
    pub fn intern_optional(&mut self, block: Option<&Block>) -> i32 {
        match block {
            Some(block) => self.intern(block) as i32,
            None => VOID_INDEX,
        }
    }

    /// Swaps the block at `index` for `block`, keeping its position. Returns
    /// false and changes nothing if `block` is already elsewhere in the palette.
    pub(crate) fn replace(&mut self, index: usize, block: Block) -> bool {
        if index >= self.blocks.len() || self.block_to_index.contains_key(&block) {
            return false;
        }
        self.block_to_index.remove(&self.blocks[index]);
        self.block_to_index.insert(block.clone(), index);
        self.blocks[index] = block;
        true
    }

    /// Keeps only the entries for which `keep` holds, preserving their order.
    /// Returns the new grid value of every old position, [`VOID_INDEX`] for
    /// dropped entries.
    pub(crate) fn retain<F: Fn(usize) -> bool>(&mut self, keep: F) -> Vec<i32> {
        let mut mapping = Vec::with_capacity(self.blocks.len());
        let mut kept = Palette::new();
        for (index, block) in std::mem::take(&mut self.blocks).into_iter().enumerate() {
            if keep(index) {
                mapping.push(kept.blocks.len() as i32);
                kept.block_to_index.insert(block.clone(), kept.blocks.len());
                kept.blocks.push(block);
            } else {
                trace!("Dropping unused palette entry {} = {}", index, block);
                mapping.push(VOID_INDEX);
            }
        }
        *self = kept;
        mapping
    }

    pub fn index_of(&self, block: &Block) -> Option<usize> {
        self.block_to_index.get(block).copied()
    }

    pub fn get(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    /// Resolves a grid value. Void and unknown indices give `None`.
    pub fn resolve(&self, index: i32) -> Option<&Block> {
        usize::try_from(index).ok().and_then(|i| self.blocks.get(i))
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.blocks.iter()
    }

    pub fn as_slice(&self) -> &[Block] {
        &self.blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcstructure_nbt::Tag;

    #[test]
    fn test_equal_blocks_share_an_index() {
        let mut palette = Palette::new();
        let a = palette.intern(&Block::new("minecraft:wool").with_state("color", "red"));
        let b = palette.intern(&Block::new("minecraft:dirt"));
        let c = palette.intern(&Block::new("minecraft:wool").with_state("color", "red"));

        assert_eq!((a, b, c), (0, 1, 0));
        assert_eq!(palette.len(), 2);
    }

    #[test]
    fn test_void_is_never_added() {
        let mut palette = Palette::new();
        assert_eq!(palette.intern_optional(None), VOID_INDEX);
        assert!(palette.is_empty());
        assert_eq!(palette.resolve(VOID_INDEX), None);
    }

    #[test]
    fn test_extra_data_merges_into_existing_entry() {
        let mut palette = Palette::new();
        palette.intern(&Block::new("minecraft:chest"));
        let locked =
            Block::new("minecraft:chest").with_extra_data("Lock", Tag::String("key".to_string()));
        let index = palette.intern(&locked);

        assert_eq!(index, 0);
        assert_eq!(palette.len(), 1);
        assert_eq!(palette.get(0).unwrap(), &locked);
        assert_eq!(
            palette.get(0).unwrap().extra_data().get("Lock"),
            Some(&Tag::String("key".to_string()))
        );
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut palette = Palette::new();
        palette.intern(&Block::new("minecraft:air"));
        palette.intern(&Block::new("minecraft:kelp"));
        let wet = Block::new("minecraft:kelp").with_waterlogged(true);

        assert!(palette.replace(1, wet.clone()));
        assert_eq!(palette.index_of(&wet), Some(1));
        assert_eq!(palette.index_of(&Block::new("minecraft:kelp")), None);
        assert!(!palette.replace(0, wet));
        assert_eq!(palette.get(0), Some(&Block::new("minecraft:air")));
    }

    #[test]
    fn test_retain_remaps_positions() {
        let mut palette = Palette::new();
        for name in ["minecraft:air", "minecraft:dirt", "minecraft:stone"] {
            palette.intern(&Block::new(name));
        }

        let mapping = palette.retain(|index| index != 1);
        assert_eq!(mapping, vec![0, VOID_INDEX, 1]);
        assert_eq!(palette.len(), 2);
        assert_eq!(palette.index_of(&Block::new("minecraft:stone")), Some(1));
        assert_eq!(palette.index_of(&Block::new("minecraft:dirt")), None);
    }
}
