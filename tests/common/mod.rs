use mcstructure::{Block, Structure, AIR};
use std::io::Cursor;

pub fn stone() -> Block {
    Block::new("minecraft:stone")
}

pub fn red_wool() -> Block {
    Block::new("minecraft:wool").with_state("color", "red")
}

pub fn wet_stairs() -> Block {
    Block::new("minecraft:oak_stairs")
        .with_state("weirdo_direction", 2)
        .with_waterlogged(true)
}

/// A small structure with void cells, states and a waterlogged block.
pub fn sample_structure() -> Structure {
    let mut structure = Structure::new((3, 2, 4), Some(&*AIR)).unwrap();
    structure
        .fill_blocks((0, 0, 0), (2, 0, 3), Some(&stone()))
        .unwrap()
        .set_block((1, 1, 2), Some(&red_wool()))
        .unwrap()
        .set_block((2, 1, 3), Some(&wet_stairs()))
        .unwrap()
        .set_block((0, 1, 0), None)
        .unwrap();
    structure
}

pub fn dump_to_vec(structure: &Structure) -> Vec<u8> {
    let mut buffer = Vec::new();
    structure.dump(&mut buffer).unwrap();
    buffer
}

pub fn load_from_slice(bytes: &[u8]) -> mcstructure::Result<Structure> {
    Structure::load(&mut Cursor::new(bytes))
}

pub fn assert_same_blocks(a: &Structure, b: &Structure) {
    assert_eq!(a.size(), b.size());
    let (sx, sy, sz) = a.size();
    for x in 0..sx as i32 {
        for y in 0..sy as i32 {
            for z in 0..sz as i32 {
                assert_eq!(
                    a.get_block((x, y, z)).unwrap(),
                    b.get_block((x, y, z)).unwrap(),
                    "at {:?}",
                    (x, y, z)
                );
            }
        }
    }
}
