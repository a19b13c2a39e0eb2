// geodata_server/server/src/world/region_loader.rs
use crate::core::config::WorldBounds;
use crate::core::constants::*;
use crate::core::error::{GeoError, GeoResult};
use crate::world::geodata::{truncated, Block, ComplexBlock, FlatBlock, MultilayerBlock};
use byteorder::ReadBytesExt;
use rayon::prelude::*;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error};

pub fn region_file_name(tile_x: i32, tile_y: i32) -> String {
    format!("{}_{}.{}", tile_x, tile_y, REGION_FILE_EXTENSION)
}

/// Decodes one L2D region: `region_blocks^2` records, X major. The whole input
/// must be consumed; leftover bytes mean the file does not match the layout.
pub fn decode_region(bytes: &[u8], region_blocks: usize) -> GeoResult<Vec<Block>> {
    let total = region_blocks * region_blocks;
    let mut reader = Cursor::new(bytes);
    let mut blocks = Vec::with_capacity(total);

    for _ in 0..total {
        let block_type = reader.read_u8().map_err(truncated("block type"))?;
        let block = match block_type {
            BLOCK_TYPE_FLAT => Block::Flat(FlatBlock::decode(&mut reader)?),
            BLOCK_TYPE_COMPLEX => Block::Complex(ComplexBlock::decode(&mut reader)?),
            BLOCK_TYPE_MULTILAYER => Block::Multilayer(MultilayerBlock::decode(&mut reader)?),
            other => return Err(GeoError::UnknownBlockType(other)),
        };
        blocks.push(block);
    }

    let remaining = bytes.len() - reader.position() as usize;
    if remaining > 0 {
        return Err(GeoError::TrailingBytes(remaining));
    }
    Ok(blocks)
}

/// Encodes blocks (X major) back into an L2D region.
pub fn encode_region<'a, W, I>(blocks: I, writer: &mut W) -> GeoResult<()>
where
    W: Write,
    I: IntoIterator<Item = &'a Block>,
{
    for block in blocks {
        if !block.has_geo_pos() {
            return Err(GeoError::Internal("null blocks have no region encoding".into()));
        }
        block.serialize(writer)?;
    }
    Ok(())
}

pub enum RegionOutcome {
    Loaded(Vec<Block>),
    Missing,
    Failed(GeoError),
}

pub struct RegionLoad {
    pub tile_x: i32,
    pub tile_y: i32,
    pub path: PathBuf,
    pub outcome: RegionOutcome,
}

/// Reads and decodes every region file of `bounds` in parallel.
pub fn load_regions(geodata_path: &Path, bounds: &WorldBounds) -> Vec<RegionLoad> {
    let tiles: Vec<(i32, i32)> = (bounds.tile_x_min..=bounds.tile_x_max)
        .flat_map(|x| (bounds.tile_y_min..=bounds.tile_y_max).map(move |y| (x, y)))
        .collect();

    tiles
        .into_par_iter()
        .map(|(tile_x, tile_y)| {
            let path = geodata_path.join(region_file_name(tile_x, tile_y));
            let outcome = load_region(&path, bounds.region_blocks);
            RegionLoad { tile_x, tile_y, path, outcome }
        })
        .collect()
}

fn load_region(path: &Path, region_blocks: usize) -> RegionOutcome {
    if !path.is_file() {
        return RegionOutcome::Missing;
    }
    let decoded = std::fs::read(path)
        .map_err(GeoError::from)
        .and_then(|bytes| decode_region(&bytes, region_blocks));
    match decoded {
        Ok(blocks) => {
            debug!("[GeoLoad] Decoded region {} ({} blocks)", path.display(), blocks.len());
            RegionOutcome::Loaded(blocks)
        }
        Err(e) => {
            error!("[GeoLoad] Error loading region file {}: {}", path.display(), e);
            RegionOutcome::Failed(e)
        }
    }
}
