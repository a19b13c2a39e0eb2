// geodata_server/server/src/world/geodata/multilayer.rs
use crate::core::constants::{BLOCK_CELLS, BLOCK_CELLS_X, BLOCK_CELLS_Y, BLOCK_TYPE_MULTILAYER, LAYER_SIZE, MAX_CELL_LAYERS};
use crate::core::error::{GeoError, GeoResult};
use byteorder::{ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

use super::{layer, truncated};

/// Block with a variable number of layers per cell (bridges, caves, multi-floor
/// buildings). Each cell is stored as `[count, layer * count]`, layers ordered
/// from the top down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultilayerBlock {
    buffer: Box<[u8]>,
}

impl MultilayerBlock {
    pub fn decode<R: Read>(reader: &mut R) -> GeoResult<Self> {
        let mut buffer = Vec::with_capacity(BLOCK_CELLS * (1 + 2 * LAYER_SIZE));
        for cell in 0..BLOCK_CELLS {
            let count = reader.read_u8().map_err(truncated("multilayer cell header"))?;
            if count == 0 || count > MAX_CELL_LAYERS {
                return Err(GeoError::InvalidLayerCount { cell, count });
            }
            buffer.push(count);
            let start = buffer.len();
            buffer.resize(start + count as usize * LAYER_SIZE, 0);
            reader
                .read_exact(&mut buffer[start..])
                .map_err(truncated("multilayer cell layers"))?;
        }
        Ok(MultilayerBlock { buffer: buffer.into_boxed_slice() })
    }

    /// Builds a block from per-cell layer lists `(nswe, height)`, top layer first.
    pub fn from_cells(cells: &[Vec<(u8, i16)>]) -> GeoResult<Self> {
        if cells.len() != BLOCK_CELLS {
            return Err(GeoError::Internal(format!("expected {} cells, got {}", BLOCK_CELLS, cells.len())));
        }
        let mut buffer = Vec::new();
        for (cell, layers) in cells.iter().enumerate() {
            if layers.is_empty() || layers.len() > MAX_CELL_LAYERS as usize {
                return Err(GeoError::InvalidLayerCount { cell, count: layers.len().min(u8::MAX as usize) as u8 });
            }
            buffer.push(layers.len() as u8);
            for &(nswe, height) in layers {
                buffer.push(nswe);
                buffer.extend_from_slice(&height.to_le_bytes());
            }
        }
        Ok(MultilayerBlock { buffer: buffer.into_boxed_slice() })
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub(crate) fn with_nswe(&self, index: usize, nswe: u8) -> Self {
        let mut buffer = self.buffer.clone();
        layer::set_nswe(&mut buffer, index, nswe);
        MultilayerBlock { buffer }
    }

    pub fn serialize<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        serialize_buffer(&self.buffer, writer)
    }
}

pub(crate) fn serialize_buffer<W: Write>(buffer: &[u8], writer: &mut W) -> std::io::Result<()> {
    writer.write_u8(BLOCK_TYPE_MULTILAYER)?;
    writer.write_all(buffer)
}

/// Offset of the cell's layer-count byte. Walks every preceding cell header.
fn cell_start(buffer: &[u8], geo_x: i32, geo_y: i32) -> usize {
    let cx = geo_x.rem_euclid(BLOCK_CELLS_X as i32) as usize;
    let cy = geo_y.rem_euclid(BLOCK_CELLS_Y as i32) as usize;
    let mut index = 0;
    for _ in 0..cx * BLOCK_CELLS_Y + cy {
        index += buffer[index] as usize * LAYER_SIZE + 1;
    }
    index
}

/// Layer closest to `z`. Scans top down and stops once the distance grows,
/// so a tie between two layers resolves to the lower one.
pub fn index_nearest(buffer: &[u8], geo_x: i32, geo_y: i32, z: i32) -> usize {
    let start = cell_start(buffer, geo_x, geo_y);
    let layers = buffer[start] as usize;
    let mut best = start + 1;
    let mut limit = i32::MAX;
    for n in 0..layers {
        let index = start + 1 + n * LAYER_SIZE;
        let distance = (layer::height(buffer, index) - z).abs();
        if distance > limit {
            break;
        }
        limit = distance;
        best = index;
    }
    best
}

/// First layer strictly above `z`, scanning bottom up.
pub fn index_above(buffer: &[u8], geo_x: i32, geo_y: i32, z: i32) -> Option<usize> {
    let start = cell_start(buffer, geo_x, geo_y);
    let layers = buffer[start] as usize;
    (0..layers)
        .rev()
        .map(|n| start + 1 + n * LAYER_SIZE)
        .find(|&index| layer::height(buffer, index) > z)
}

/// First layer strictly below `z`, scanning top down.
pub fn index_below(buffer: &[u8], geo_x: i32, geo_y: i32, z: i32) -> Option<usize> {
    let start = cell_start(buffer, geo_x, geo_y);
    let layers = buffer[start] as usize;
    (0..layers)
        .map(|n| start + 1 + n * LAYER_SIZE)
        .find(|&index| layer::height(buffer, index) < z)
}
