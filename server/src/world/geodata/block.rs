// geodata_server/server/src/world/geodata/block.rs
use crate::core::types::ObjectId;
use std::io::Write;

use super::dynamic::{DynamicBlock, DynamicLayout};
use super::{complex, layer, multilayer, ComplexBlock, FlatBlock, MultilayerBlock, NullBlock};

/// One 8x8 tile of the geo grid.
///
/// Layer indices returned by the `index_*` queries are only meaningful for
/// the block that produced them and stay valid across obstacle updates.
#[derive(Debug)]
pub enum Block {
    Null(NullBlock),
    Flat(FlatBlock),
    Complex(ComplexBlock),
    Multilayer(MultilayerBlock),
    Dynamic(DynamicBlock),
}

impl Block {
    pub fn has_geo_pos(&self) -> bool {
        !matches!(self, Block::Null(_))
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, Block::Dynamic(_))
    }

    pub fn index_nearest(&self, geo_x: i32, geo_y: i32, z: i32, ignore: Option<ObjectId>) -> usize {
        match self {
            Block::Null(_) | Block::Flat(_) => 0,
            Block::Complex(_) => complex::cell_index(geo_x, geo_y),
            Block::Multilayer(b) => multilayer::index_nearest(b.buffer(), geo_x, geo_y, z),
            Block::Dynamic(b) => b.index_nearest(geo_x, geo_y, z, ignore),
        }
    }

    pub fn index_above(&self, geo_x: i32, geo_y: i32, z: i32, ignore: Option<ObjectId>) -> Option<usize> {
        match self {
            Block::Null(_) => Some(0),
            Block::Flat(b) => b.index_above(z),
            Block::Complex(b) => complex::index_above(b.buffer(), geo_x, geo_y, z),
            Block::Multilayer(b) => multilayer::index_above(b.buffer(), geo_x, geo_y, z),
            Block::Dynamic(b) => b.index_above(geo_x, geo_y, z, ignore),
        }
    }

    pub fn index_below(&self, geo_x: i32, geo_y: i32, z: i32, ignore: Option<ObjectId>) -> Option<usize> {
        match self {
            Block::Null(_) => Some(0),
            Block::Flat(b) => b.index_below(z),
            Block::Complex(b) => complex::index_below(b.buffer(), geo_x, geo_y, z),
            Block::Multilayer(b) => multilayer::index_below(b.buffer(), geo_x, geo_y, z),
            Block::Dynamic(b) => b.index_below(geo_x, geo_y, z, ignore),
        }
    }

    /// Height of a known layer. The null block has no layers and reports 0.
    pub fn height(&self, index: usize, ignore: Option<ObjectId>) -> i32 {
        match self {
            Block::Null(_) => 0,
            Block::Flat(b) => b.height(),
            Block::Complex(b) => layer::height(b.buffer(), index),
            Block::Multilayer(b) => layer::height(b.buffer(), index),
            Block::Dynamic(b) => b.height(index, ignore),
        }
    }

    pub fn nswe(&self, index: usize, ignore: Option<ObjectId>) -> u8 {
        match self {
            Block::Null(b) => b.nswe(),
            Block::Flat(b) => b.nswe(),
            Block::Complex(b) => layer::nswe(b.buffer(), index),
            Block::Multilayer(b) => layer::nswe(b.buffer(), index),
            Block::Dynamic(b) => b.nswe(index, ignore),
        }
    }

    pub fn height_nearest(&self, geo_x: i32, geo_y: i32, z: i32, ignore: Option<ObjectId>) -> i32 {
        match self {
            Block::Null(_) => z,
            Block::Dynamic(b) => b.height_nearest(geo_x, geo_y, z, ignore),
            _ => self.height(self.index_nearest(geo_x, geo_y, z, ignore), ignore),
        }
    }

    pub fn nswe_nearest(&self, geo_x: i32, geo_y: i32, z: i32, ignore: Option<ObjectId>) -> u8 {
        match self {
            Block::Dynamic(b) => b.nswe_nearest(geo_x, geo_y, z, ignore),
            _ => self.nswe(self.index_nearest(geo_x, geo_y, z, ignore), ignore),
        }
    }

    /// Copy of a static block with one layer's flags replaced. `None` for
    /// null blocks (nothing to edit) and dynamic blocks (edited in place).
    pub fn with_nswe(&self, index: usize, nswe: u8) -> Option<Block> {
        match self {
            Block::Null(_) | Block::Dynamic(_) => None,
            Block::Flat(b) => Some(Block::Flat(b.with_nswe(nswe))),
            Block::Complex(b) => Some(Block::Complex(b.with_nswe(index, nswe))),
            Block::Multilayer(b) => Some(Block::Multilayer(b.with_nswe(index, nswe))),
        }
    }

    /// Dynamic copy of a static block, used on first obstacle registration.
    pub fn to_dynamic(&self, block_x: usize, block_y: usize) -> Option<DynamicBlock> {
        let (layout, original): (DynamicLayout, Box<[u8]>) = match self {
            Block::Null(_) | Block::Dynamic(_) => return None,
            Block::Flat(b) => (
                DynamicLayout::Complex,
                ComplexBlock::from_flat(b.height(), b.nswe()).buffer().into(),
            ),
            Block::Complex(b) => (DynamicLayout::Complex, b.buffer().into()),
            Block::Multilayer(b) => (DynamicLayout::Multilayer, b.buffer().into()),
        };
        Some(DynamicBlock::new(block_x, block_y, layout, original))
    }

    /// L2D encoding of the block. Null blocks have no on-disk form and write nothing.
    pub fn serialize<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        match self {
            Block::Null(_) => Ok(()),
            Block::Flat(b) => b.serialize(writer),
            Block::Complex(b) => b.serialize(writer),
            Block::Multilayer(b) => b.serialize(writer),
            Block::Dynamic(b) => b.serialize(writer),
        }
    }
}
