// geodata_server/server/src/world/geodata/complex.rs
use crate::core::constants::{BLOCK_CELLS, BLOCK_CELLS_X, BLOCK_CELLS_Y, BLOCK_TYPE_COMPLEX, LAYER_SIZE};
use crate::core::error::GeoResult;
use byteorder::WriteBytesExt;
use std::io::{Read, Write};

use super::{layer, truncated};

pub const COMPLEX_BUFFER_SIZE: usize = BLOCK_CELLS * LAYER_SIZE;

/// Block with one layer per cell, stored as 64 packed layers (X major).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexBlock {
    buffer: Box<[u8]>,
}

impl ComplexBlock {
    pub fn decode<R: Read>(reader: &mut R) -> GeoResult<Self> {
        let mut buffer = vec![0u8; COMPLEX_BUFFER_SIZE];
        reader
            .read_exact(&mut buffer)
            .map_err(truncated("complex block cells"))?;
        Ok(ComplexBlock { buffer: buffer.into_boxed_slice() })
    }

    /// Expands a flat block into per-cell storage.
    pub fn from_flat(height: i32, nswe: u8) -> Self {
        let mut buffer = vec![0u8; COMPLEX_BUFFER_SIZE];
        for index in (0..COMPLEX_BUFFER_SIZE).step_by(LAYER_SIZE) {
            layer::write(&mut buffer, index, nswe, height);
        }
        ComplexBlock { buffer: buffer.into_boxed_slice() }
    }

    pub fn from_buffer(buffer: Box<[u8]>) -> Option<Self> {
        (buffer.len() == COMPLEX_BUFFER_SIZE).then_some(ComplexBlock { buffer })
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub(crate) fn with_nswe(&self, index: usize, nswe: u8) -> Self {
        let mut buffer = self.buffer.clone();
        layer::set_nswe(&mut buffer, index, nswe);
        ComplexBlock { buffer }
    }

    pub fn serialize<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        serialize_buffer(&self.buffer, writer)
    }
}

pub(crate) fn serialize_buffer<W: Write>(buffer: &[u8], writer: &mut W) -> std::io::Result<()> {
    writer.write_u8(BLOCK_TYPE_COMPLEX)?;
    writer.write_all(buffer)
}

#[inline]
pub fn cell_index(geo_x: i32, geo_y: i32) -> usize {
    let cx = geo_x.rem_euclid(BLOCK_CELLS_X as i32) as usize;
    let cy = geo_y.rem_euclid(BLOCK_CELLS_Y as i32) as usize;
    (cx * BLOCK_CELLS_Y + cy) * LAYER_SIZE
}

pub fn index_above(buffer: &[u8], geo_x: i32, geo_y: i32, z: i32) -> Option<usize> {
    let index = cell_index(geo_x, geo_y);
    (layer::height(buffer, index) > z).then_some(index)
}

pub fn index_below(buffer: &[u8], geo_x: i32, geo_y: i32, z: i32) -> Option<usize> {
    let index = cell_index(geo_x, geo_y);
    (layer::height(buffer, index) < z).then_some(index)
}
