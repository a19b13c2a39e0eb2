// geodata_server/server/src/world/geodata/flat.rs
use crate::core::constants::{BLOCK_TYPE_FLAT, NSWE_ALL};
use crate::core::error::GeoResult;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

use super::truncated;

/// Block where all 64 cells share one height and are fully passable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatBlock {
    height: i16,
    nswe: u8,
}

impl FlatBlock {
    pub fn new(height: i16) -> Self {
        FlatBlock { height, nswe: NSWE_ALL }
    }

    pub fn decode<R: Read>(reader: &mut R) -> GeoResult<Self> {
        let height = reader
            .read_i16::<LittleEndian>()
            .map_err(truncated("flat block height"))?;
        Ok(FlatBlock::new(height))
    }

    pub fn height(&self) -> i32 {
        self.height as i32
    }

    pub fn nswe(&self) -> u8 {
        self.nswe
    }

    pub fn index_above(&self, z: i32) -> Option<usize> {
        (self.height() > z).then_some(0)
    }

    pub fn index_below(&self, z: i32) -> Option<usize> {
        (self.height() < z).then_some(0)
    }

    pub(crate) fn with_nswe(&self, nswe: u8) -> Self {
        FlatBlock { height: self.height, nswe }
    }

    pub fn serialize<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_u8(BLOCK_TYPE_FLAT)?;
        writer.write_i16::<LittleEndian>(self.height)
    }
}
