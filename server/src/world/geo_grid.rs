// geodata_server/server/src/world/geo_grid.rs
use crate::core::config::{GeoEngineConfig, WorldBounds};
use crate::core::constants::*;
use crate::core::error::GeoResult;
use crate::core::types::{Location, ObjectId};
use crate::world::geo_object::GeoObject;
use crate::world::geodata::{Block, NullBlock};
use crate::world::region_loader::{self, RegionOutcome};
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use serde::Serialize;
use std::io::Write;
use std::ops::Range;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Summary of a grid load.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    pub loaded: usize,
    pub missing: usize,
    pub failed: Vec<String>,
}

impl LoadReport {
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }
}

/// World-wide array of blocks.
///
/// Slots are swapped atomically: readers never lock, and the only writers are
/// static-to-dynamic conversion and flag edits, both under `conversion_lock`.
pub struct GeoGrid {
    bounds: WorldBounds,
    blocks_x: usize,
    blocks_y: usize,
    cells_x: i32,
    cells_y: i32,
    world_min_x: i32,
    world_min_y: i32,
    slots: Box<[ArcSwap<Block>]>,
    null_block: Arc<Block>,
    conversion_lock: Mutex<()>,
}

impl GeoGrid {
    /// Grid with every block set to the null block.
    pub fn new(bounds: WorldBounds, null_block_nswe: u8) -> Self {
        let null_block = Arc::new(Block::Null(NullBlock::new(null_block_nswe)));
        let blocks_x = bounds.blocks_x();
        let blocks_y = bounds.blocks_y();
        let slots = (0..blocks_x * blocks_y)
            .map(|_| ArcSwap::new(null_block.clone()))
            .collect();
        GeoGrid {
            bounds,
            blocks_x,
            blocks_y,
            cells_x: bounds.cells_x(),
            cells_y: bounds.cells_y(),
            world_min_x: bounds.world_min_x(),
            world_min_y: bounds.world_min_y(),
            slots,
            null_block,
            conversion_lock: Mutex::new(()),
        }
    }

    /// Builds a grid from explicit blocks; unlisted and out-of-range positions stay null.
    pub fn from_blocks<I>(bounds: WorldBounds, null_block_nswe: u8, blocks: I) -> Self
    where
        I: IntoIterator<Item = ((usize, usize), Block)>,
    {
        let mut grid = GeoGrid::new(bounds, null_block_nswe);
        for ((bx, by), block) in blocks {
            grid.set_block(bx, by, block);
        }
        grid
    }

    /// Loads every region file configured in `config`. Regions that fail to
    /// decode are left as null blocks and listed in the report.
    pub fn load(config: &GeoEngineConfig) -> (Self, LoadReport) {
        let mut grid = GeoGrid::new(config.world, config.null_block_nswe);
        let mut report = LoadReport::default();

        info!("[GeoLoad] Loading L2D regions from {}", config.geodata_path.display());
        for region in region_loader::load_regions(&config.geodata_path, &config.world) {
            match region.outcome {
                RegionOutcome::Loaded(blocks) => {
                    grid.place_region(region.tile_x, region.tile_y, blocks);
                    report.loaded += 1;
                }
                RegionOutcome::Missing => report.missing += 1,
                RegionOutcome::Failed(e) => {
                    report.failed.push(format!("{}: {}", region.path.display(), e));
                }
            }
        }

        info!("[GeoLoad] Loaded {} L2D region files ({} without geodata).", report.loaded, report.missing);
        if report.failed_count() > 0 {
            warn!(
                "[GeoLoad] Failed to load {} L2D region files; those regions are open space. Check the geodata path and files.",
                report.failed_count()
            );
        }
        (grid, report)
    }

    /// Stores a decoded region (X major) at its tile position.
    pub fn place_region(&mut self, tile_x: i32, tile_y: i32, blocks: Vec<Block>) {
        let region_blocks = self.bounds.region_blocks;
        let origin_x = (tile_x - self.bounds.tile_x_min) as usize * region_blocks;
        let origin_y = (tile_y - self.bounds.tile_y_min) as usize * region_blocks;
        for (i, block) in blocks.into_iter().enumerate() {
            self.set_block(origin_x + i / region_blocks, origin_y + i % region_blocks, block);
        }
    }

    pub fn set_block(&mut self, block_x: usize, block_y: usize, block: Block) {
        if block_x >= self.blocks_x || block_y >= self.blocks_y {
            return;
        }
        let slot = &self.slots[block_x * self.blocks_y + block_y];
        if block.has_geo_pos() {
            slot.store(Arc::new(block));
        } else {
            slot.store(self.null_block.clone());
        }
    }

    pub fn bounds(&self) -> &WorldBounds {
        &self.bounds
    }

    pub fn cells_x(&self) -> i32 {
        self.cells_x
    }

    pub fn cells_y(&self) -> i32 {
        self.cells_y
    }

    pub fn geo_x(&self, world_x: i32) -> i32 {
        (world_x - self.world_min_x) >> CELL_SIZE_SHIFT
    }

    pub fn geo_y(&self, world_y: i32) -> i32 {
        (world_y - self.world_min_y) >> CELL_SIZE_SHIFT
    }

    /// World coordinate of the cell center.
    pub fn world_x(&self, geo_x: i32) -> i32 {
        (geo_x << CELL_SIZE_SHIFT) + self.world_min_x + CELL_SIZE / 2
    }

    pub fn world_y(&self, geo_y: i32) -> i32 {
        (geo_y << CELL_SIZE_SHIFT) + self.world_min_y + CELL_SIZE / 2
    }

    pub fn in_bounds(&self, geo_x: i32, geo_y: i32) -> bool {
        geo_x >= 0 && geo_y >= 0 && geo_x < self.cells_x && geo_y < self.cells_y
    }

    fn slot(&self, geo_x: i32, geo_y: i32) -> Option<&ArcSwap<Block>> {
        if !self.in_bounds(geo_x, geo_y) {
            return None;
        }
        let bx = geo_x as usize / BLOCK_CELLS_X;
        let by = geo_y as usize / BLOCK_CELLS_Y;
        Some(&self.slots[bx * self.blocks_y + by])
    }

    /// Block owning the cell. Cells outside the grid resolve to the null block.
    pub fn block(&self, geo_x: i32, geo_y: i32) -> Arc<Block> {
        match self.slot(geo_x, geo_y) {
            Some(slot) => slot.load_full(),
            None => self.null_block.clone(),
        }
    }

    pub fn block_at(&self, block_x: usize, block_y: usize) -> Arc<Block> {
        if block_x >= self.blocks_x || block_y >= self.blocks_y {
            return self.null_block.clone();
        }
        self.slots[block_x * self.blocks_y + block_y].load_full()
    }

    pub fn has_geo_pos(&self, geo_x: i32, geo_y: i32) -> bool {
        match self.slot(geo_x, geo_y) {
            Some(slot) => slot.load().has_geo_pos(),
            None => false,
        }
    }

    pub fn height_nearest(&self, geo_x: i32, geo_y: i32, z: i32, ignore: Option<ObjectId>) -> i32 {
        self.block(geo_x, geo_y).height_nearest(geo_x, geo_y, z, ignore)
    }

    pub fn nswe_nearest(&self, geo_x: i32, geo_y: i32, z: i32, ignore: Option<ObjectId>) -> u8 {
        self.block(geo_x, geo_y).nswe_nearest(geo_x, geo_y, z, ignore)
    }

    pub fn has_geo(&self, world_x: i32, world_y: i32) -> bool {
        self.has_geo_pos(self.geo_x(world_x), self.geo_y(world_y))
    }

    /// Geodata height nearest to the given world position.
    pub fn height(&self, world_x: i32, world_y: i32, world_z: i32) -> i32 {
        let gx = self.geo_x(world_x);
        let gy = self.geo_y(world_y);
        self.height_nearest(gx, gy, world_z, None)
    }

    pub fn height_at(&self, location: Location) -> i32 {
        self.height(location.x, location.y, location.z)
    }

    /// Replaces the flags of one layer. Static blocks are copied and
    /// republished; dynamic blocks edit their pristine data and recomposite.
    pub fn set_nswe(&self, geo_x: i32, geo_y: i32, index: usize, nswe: u8) {
        let Some(slot) = self.slot(geo_x, geo_y) else {
            return;
        };
        let _guard = self.conversion_lock.lock();
        let block = slot.load_full();
        match &*block {
            Block::Dynamic(dynamic) => dynamic.set_nswe(index, nswe),
            other => {
                if let Some(edited) = other.with_nswe(index, nswe) {
                    slot.store(Arc::new(edited));
                }
            }
        }
    }

    fn object_blocks(&self, object: &dyn GeoObject) -> (Range<usize>, Range<usize>) {
        let footprint = object.footprint();
        let span = |min: i32, len: usize, cells: usize, limit: usize| {
            let first = min.max(0) as usize / cells;
            let last = (min + len as i32 - 1).max(-1);
            let end = if last < 0 { 0 } else { (last as usize / cells + 1).min(limit) };
            first.min(end)..end
        };
        (
            span(object.geo_x(), footprint.width(), BLOCK_CELLS_X, self.blocks_x),
            span(object.geo_y(), footprint.depth(), BLOCK_CELLS_Y, self.blocks_y),
        )
    }

    /// Registers the object with every block its footprint touches, converting
    /// static blocks to dynamic on first use. Returns the number of blocks whose
    /// composited data changed.
    pub fn add_geo_object(&self, object: &Arc<dyn GeoObject>) -> usize {
        let (xs, ys) = self.object_blocks(&**object);
        let mut changed = 0;
        for bx in xs {
            for by in ys.clone() {
                let slot = &self.slots[bx * self.blocks_y + by];
                let block = {
                    let _guard = self.conversion_lock.lock();
                    let current = slot.load_full();
                    if current.is_dynamic() {
                        current
                    } else {
                        // no geodata means nothing to overlay
                        let Some(dynamic) = current.to_dynamic(bx, by) else {
                            continue;
                        };
                        let converted = Arc::new(Block::Dynamic(dynamic));
                        slot.store(converted.clone());
                        debug!("[GeoObject] Converted block ({}, {}) to dynamic", bx, by);
                        converted
                    }
                };
                if let Block::Dynamic(dynamic) = &*block {
                    if dynamic.add_object(object.clone()) {
                        changed += 1;
                    }
                }
            }
        }
        changed
    }

    /// Unregisters the object. Blocks stay dynamic.
    pub fn remove_geo_object(&self, object: &dyn GeoObject) -> usize {
        let (xs, ys) = self.object_blocks(object);
        let id = object.object_id();
        let mut changed = 0;
        for bx in xs {
            for by in ys.clone() {
                let block = self.slots[bx * self.blocks_y + by].load_full();
                if let Block::Dynamic(dynamic) = &*block {
                    if dynamic.remove_object(id) {
                        changed += 1;
                    }
                }
            }
        }
        changed
    }

    /// Encodes one region tile back to L2D.
    pub fn write_region<W: Write>(&self, tile_x: i32, tile_y: i32, writer: &mut W) -> GeoResult<()> {
        let region_blocks = self.bounds.region_blocks;
        let origin_x = (tile_x - self.bounds.tile_x_min).max(0) as usize * region_blocks;
        let origin_y = (tile_y - self.bounds.tile_y_min).max(0) as usize * region_blocks;
        let blocks: Vec<Arc<Block>> = (0..region_blocks)
            .flat_map(|ix| (0..region_blocks).map(move |iy| (ix, iy)))
            .map(|(ix, iy)| self.block_at(origin_x + ix, origin_y + iy))
            .collect();
        region_loader::encode_region(blocks.iter().map(|b| b.as_ref()), writer)
    }
}
