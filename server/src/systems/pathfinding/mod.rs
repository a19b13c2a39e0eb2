// geodata_server/server/src/systems/pathfinding/mod.rs
pub mod node_buffer;
pub mod path;

pub use node_buffer::NodeBuffer;
pub use path::{construct_path, string_pull};

use crate::concurrent::node_buffer_pool::{BufferClassStats, NodeBufferPool};
use crate::core::config::PathfindingConfig;
use crate::core::constants::PATH_BUFFER_PADDING;
use crate::core::types::Location;
use crate::operational::monitoring::GeoMetrics;
use crate::world::geo_grid::GeoGrid;
use serde::Serialize;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, error};

/// Counters kept by the [`Pathfinder`]; "filter" counts the string pulling
/// pass, which runs for paths of three or more waypoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PathfindingCounters {
    pub success: u64,
    pub fail: u64,
    pub filter_uses: u64,
    pub filter_playable_uses: u64,
    pub filter_elapsed_ms: u64,
}

/// A* search over the geo grid with pooled search buffers.
pub struct Pathfinder {
    params: PathfindingConfig,
    pool: NodeBufferPool,
    success: AtomicU64,
    fail: AtomicU64,
    filter_uses: AtomicU64,
    filter_playable_uses: AtomicU64,
    filter_elapsed_ms: AtomicU64,
}

impl Pathfinder {
    pub fn new(params: PathfindingConfig) -> Self {
        let pool = NodeBufferPool::new(&params.buffers);
        Pathfinder {
            params,
            pool,
            success: AtomicU64::new(0),
            fail: AtomicU64::new(0),
            filter_uses: AtomicU64::new(0),
            filter_playable_uses: AtomicU64::new(0),
            filter_elapsed_ms: AtomicU64::new(0),
        }
    }

    pub fn pool(&self) -> &NodeBufferPool {
        &self.pool
    }

    /// Finds a walkable path and returns its waypoints, excluding the origin
    /// and ending on the target cell. `playable` only affects statistics.
    ///
    /// Returns `None` when either end has no geodata, the target is too far for
    /// the largest buffer, or no path exists within the search budget.
    pub fn find_path(&self, grid: &GeoGrid, origin: Location, target: Location, playable: bool) -> Option<Vec<Location>> {
        let gox = grid.geo_x(origin.x);
        let goy = grid.geo_y(origin.y);
        let gtx = grid.geo_x(target.x);
        let gty = grid.geo_y(target.y);
        if !grid.has_geo_pos(gox, goy) || !grid.has_geo_pos(gtx, gty) {
            debug!(%origin, %target, "Pathfinding without geodata");
            return self.failed();
        }
        let goz = grid.height_nearest(gox, goy, origin.z, None);
        let gtz = grid.height_nearest(gtx, gty, target.z, None);

        let distance = (gox - gtx).unsigned_abs().max((goy - gty).unsigned_abs()) as usize;
        let required = PATH_BUFFER_PADDING + 2 * distance;
        let Some(mut buffer) = self.pool.acquire(required, playable) else {
            debug!(%origin, %target, required, "Path too long for any buffer");
            return self.failed();
        };

        let searching = Instant::now();
        let search = catch_unwind(AssertUnwindSafe(|| {
            buffer
                .find_path(grid, &self.params, gox, goy, goz, gtx, gty, gtz)
                .map(|terminal| construct_path(grid, &buffer, terminal))
        }));
        drop(buffer);
        GeoMetrics::record_search_time(searching.elapsed());

        let path = match search {
            Ok(Some(path)) => path,
            Ok(None) => {
                debug!(%origin, %target, "No path found");
                return self.failed();
            }
            Err(_) => {
                error!(%origin, %target, "Pathfinding panicked, treating as no path");
                return self.failed();
            }
        };
        self.success.fetch_add(1, Ordering::Relaxed);
        GeoMetrics::record_pathfind(true);

        if path.len() < 3 {
            return Some(path);
        }

        let started = Instant::now();
        self.filter_uses.fetch_add(1, Ordering::Relaxed);
        if playable {
            self.filter_playable_uses.fetch_add(1, Ordering::Relaxed);
        }
        let anchor = Location::new(grid.world_x(gox), grid.world_y(goy), goz);
        let path = string_pull(grid, anchor, path);
        let elapsed = started.elapsed();
        self.filter_elapsed_ms.fetch_add(elapsed.as_millis() as u64, Ordering::Relaxed);
        GeoMetrics::record_filter_time(elapsed);
        Some(path)
    }

    fn failed(&self) -> Option<Vec<Location>> {
        self.fail.fetch_add(1, Ordering::Relaxed);
        GeoMetrics::record_pathfind(false);
        None
    }

    pub fn counters(&self) -> PathfindingCounters {
        PathfindingCounters {
            success: self.success.load(Ordering::Relaxed),
            fail: self.fail.load(Ordering::Relaxed),
            filter_uses: self.filter_uses.load(Ordering::Relaxed),
            filter_playable_uses: self.filter_playable_uses.load(Ordering::Relaxed),
            filter_elapsed_ms: self.filter_elapsed_ms.load(Ordering::Relaxed),
        }
    }

    pub fn buffer_stats(&self) -> Vec<BufferClassStats> {
        self.pool.stats()
    }
}
