// geodata_server/server/src/server/engine.rs
use crate::core::config::GeoEngineConfig;
use crate::core::error::{GeoError, GeoResult};
use crate::core::types::{Location, MovableEntity, ObjectId};
use crate::operational::bug_report::{format_bug_line, GeoBugReporter};
use crate::operational::monitoring::GeoMetrics;
use crate::operational::stats::GeoStats;
use crate::systems::geometry;
use crate::systems::pathfinding::Pathfinder;
use crate::world::geo_grid::{GeoGrid, LoadReport};
use crate::world::geo_object::GeoObject;

use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, error, info};

/// The geodata engine: the loaded grid, its obstacles and the pathfinder.
///
/// Built once at start-up and shared by reference (usually an `Arc`); every
/// query is synchronous and safe to call from any thread.
pub struct GeoEngine {
    config: GeoEngineConfig,
    grid: GeoGrid,
    pathfinder: Pathfinder,
    obstacles: DashMap<ObjectId, Arc<dyn GeoObject>>,
    bug_reporter: GeoBugReporter,
    load_report: LoadReport,
}

impl GeoEngine {
    /// Loads all region files named by `config`.
    ///
    /// Malformed regions become open space. When `max_region_failures` is set
    /// and exceeded, the whole load is rejected.
    pub fn load(config: GeoEngineConfig) -> GeoResult<Self> {
        config.validate()?;
        let (grid, report) = GeoGrid::load(&config);
        GeoMetrics::record_regions(report.loaded, report.failed_count());

        if let Some(allowed) = config.max_region_failures {
            let failed = report.failed_count();
            if failed > allowed {
                for region in &report.failed {
                    error!("[GeoLoad] {}", region);
                }
                return Err(GeoError::TooManyFailedRegions { failed, allowed });
            }
        }

        let mut engine = GeoEngine::with_grid(config, grid);
        engine.load_report = report;
        Ok(engine)
    }

    /// Wraps an already built grid, for tools and tests.
    pub fn with_grid(config: GeoEngineConfig, grid: GeoGrid) -> Self {
        let bug_reporter = GeoBugReporter::new(config.bug_report_path());
        let pathfinder = Pathfinder::new(config.pathfinding.clone());
        info!(
            "[GeoEngine] Ready: {}x{} cells, {} path buffer classes",
            grid.cells_x(),
            grid.cells_y(),
            config.pathfinding.buffers.len()
        );
        GeoEngine {
            config,
            grid,
            pathfinder,
            obstacles: DashMap::new(),
            bug_reporter,
            load_report: LoadReport::default(),
        }
    }

    pub fn config(&self) -> &GeoEngineConfig {
        &self.config
    }

    pub fn grid(&self) -> &GeoGrid {
        &self.grid
    }

    pub fn pathfinder(&self) -> &Pathfinder {
        &self.pathfinder
    }

    pub fn load_report(&self) -> &LoadReport {
        &self.load_report
    }

    // Coordinates and lookups

    pub fn geo_x(&self, world_x: i32) -> i32 {
        self.grid.geo_x(world_x)
    }

    pub fn geo_y(&self, world_y: i32) -> i32 {
        self.grid.geo_y(world_y)
    }

    pub fn world_x(&self, geo_x: i32) -> i32 {
        self.grid.world_x(geo_x)
    }

    pub fn world_y(&self, geo_y: i32) -> i32 {
        self.grid.world_y(geo_y)
    }

    pub fn has_geo(&self, world_x: i32, world_y: i32) -> bool {
        self.grid.has_geo(world_x, world_y)
    }

    pub fn has_geo_pos(&self, geo_x: i32, geo_y: i32) -> bool {
        self.grid.has_geo_pos(geo_x, geo_y)
    }

    pub fn height(&self, location: Location) -> i32 {
        self.grid.height_at(location)
    }

    pub fn height_nearest(&self, geo_x: i32, geo_y: i32, z: i32) -> i32 {
        self.grid.height_nearest(geo_x, geo_y, z, None)
    }

    pub fn nswe_nearest(&self, geo_x: i32, geo_y: i32, z: i32) -> u8 {
        self.grid.nswe_nearest(geo_x, geo_y, z, None)
    }

    // Geometry

    pub fn can_see_target(&self, object: &dyn MovableEntity, target: &dyn MovableEntity) -> bool {
        geometry::can_see_target(&self.grid, object, target)
    }

    pub fn can_see_location(&self, object: &dyn MovableEntity, position: Location) -> bool {
        geometry::can_see_location(&self.grid, object, position)
    }

    pub fn can_see(
        &self,
        origin: Location,
        origin_height: f64,
        target: Location,
        target_height: f64,
        ignore: Option<ObjectId>,
    ) -> bool {
        geometry::can_see(&self.grid, origin, origin_height, target, target_height, ignore)
    }

    pub fn can_move(&self, origin: Location, target: Location) -> bool {
        geometry::can_move(&self.grid, origin, target)
    }

    pub fn valid_location(&self, origin: Location, target: Location) -> Location {
        geometry::valid_location(&self.grid, origin, target)
    }

    pub fn valid_swim_location(&self, origin: Location, target: Location) -> Location {
        geometry::valid_swim_location(&self.grid, origin, target)
    }

    pub fn can_fly(&self, origin: Location, body_height: f64, target: Location) -> bool {
        geometry::can_fly(&self.grid, origin, body_height, target)
    }

    pub fn valid_fly_location(&self, origin: Location, body_height: f64, target: Location) -> Location {
        geometry::valid_fly_location(&self.grid, origin, body_height, target)
    }

    // Pathfinding

    pub fn find_path(&self, origin: Location, target: Location, playable: bool) -> Option<Vec<Location>> {
        self.pathfinder.find_path(&self.grid, origin, target, playable)
    }

    // Obstacles

    /// Applies the object's footprint to the grid. Registering an id that is
    /// already active replaces the previous object.
    pub fn register_obstacle(&self, object: Arc<dyn GeoObject>) -> usize {
        let id = object.object_id();
        if let Some(previous) = self.obstacles.insert(id, object.clone()) {
            self.grid.remove_geo_object(&*previous);
        }
        let changed = self.grid.add_geo_object(&object);
        debug!("[GeoObject] Registered obstacle {} ({} blocks changed)", id, changed);
        GeoMetrics::record_obstacle_update(true, self.obstacles.len());
        changed
    }

    /// Removes a registered object. Returns `false` for unknown ids.
    pub fn unregister_obstacle(&self, id: ObjectId) -> bool {
        let Some((_, object)) = self.obstacles.remove(&id) else {
            return false;
        };
        let changed = self.grid.remove_geo_object(&*object);
        debug!("[GeoObject] Unregistered obstacle {} ({} blocks changed)", id, changed);
        GeoMetrics::record_obstacle_update(false, self.obstacles.len());
        true
    }

    pub fn is_obstacle_registered(&self, id: ObjectId) -> bool {
        self.obstacles.contains_key(&id)
    }

    // Operations

    pub fn stats(&self) -> GeoStats {
        GeoStats {
            buffers: self.pathfinder.buffer_stats(),
            pathfinding: self.pathfinder.counters(),
            active_obstacles: self.obstacles.len(),
        }
    }

    pub fn stats_lines(&self) -> Vec<String> {
        self.stats().lines()
    }

    /// Appends a geodata bug report for the cell under `location`.
    pub fn add_geo_bug(&self, location: Location, comment: &str) -> bool {
        let line = format_bug_line(
            self.grid.bounds(),
            self.grid.geo_x(location.x),
            self.grid.geo_y(location.y),
            location.z,
            comment,
        );
        self.bug_reporter.append(&line)
    }
}
