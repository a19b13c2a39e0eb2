// geodata_server/server/src/core/config.rs
use super::constants::*;
use super::error::{GeoError, GeoResult};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Region tiles covered by the grid and the size of one region in blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldBounds {
    pub tile_x_min: i32,
    pub tile_x_max: i32,
    pub tile_y_min: i32,
    pub tile_y_max: i32,
    pub region_blocks: usize,
}

impl Default for WorldBounds {
    fn default() -> Self {
        WorldBounds {
            tile_x_min: TILE_X_MIN,
            tile_x_max: TILE_X_MAX,
            tile_y_min: TILE_Y_MIN,
            tile_y_max: TILE_Y_MAX,
            region_blocks: DEFAULT_REGION_BLOCKS,
        }
    }
}

impl WorldBounds {
    /// A single region containing the world origin, handy for small worlds and tests.
    pub fn single_region(region_blocks: usize) -> Self {
        WorldBounds {
            tile_x_min: TILE_ZERO_COORD_X,
            tile_x_max: TILE_ZERO_COORD_X,
            tile_y_min: TILE_ZERO_COORD_Y,
            tile_y_max: TILE_ZERO_COORD_Y,
            region_blocks,
        }
    }

    pub fn regions_x(&self) -> usize {
        (self.tile_x_max - self.tile_x_min + 1).max(0) as usize
    }

    pub fn regions_y(&self) -> usize {
        (self.tile_y_max - self.tile_y_min + 1).max(0) as usize
    }

    pub fn region_cells(&self) -> usize {
        self.region_blocks * BLOCK_CELLS_X
    }

    pub fn region_world_size(&self) -> i32 {
        (self.region_cells() as i32) * CELL_SIZE
    }

    pub fn blocks_x(&self) -> usize {
        self.regions_x() * self.region_blocks
    }

    pub fn blocks_y(&self) -> usize {
        self.regions_y() * self.region_blocks
    }

    pub fn cells_x(&self) -> i32 {
        (self.blocks_x() * BLOCK_CELLS_X) as i32
    }

    pub fn cells_y(&self) -> i32 {
        (self.blocks_y() * BLOCK_CELLS_Y) as i32
    }

    pub fn world_min_x(&self) -> i32 {
        (self.tile_x_min - TILE_ZERO_COORD_X) * self.region_world_size()
    }

    pub fn world_min_y(&self) -> i32 {
        (self.tile_y_min - TILE_ZERO_COORD_Y) * self.region_world_size()
    }

    fn validate(&self) -> GeoResult<()> {
        if self.tile_x_min > self.tile_x_max || self.tile_y_min > self.tile_y_max {
            return Err(GeoError::Config(format!(
                "empty tile range x={}..={} y={}..={}",
                self.tile_x_min, self.tile_x_max, self.tile_y_min, self.tile_y_max
            )));
        }
        if self.region_blocks == 0 {
            return Err(GeoError::Config("region_blocks must be positive".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferClassConfig {
    pub size: usize,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathfindingConfig {
    /// Buffer ladder, ascending by size. Each size is the side of the square search window in cells.
    pub buffers: Vec<BufferClassConfig>,
    pub base_weight: u32,
    pub diagonal_weight: u32,
    pub obstacle_multiplier: u32,
    pub heuristic_weight: u32,
    pub max_iterations: usize,
}

impl Default for PathfindingConfig {
    fn default() -> Self {
        PathfindingConfig {
            buffers: DEFAULT_PATH_BUFFERS
                .iter()
                .map(|&(size, count)| BufferClassConfig { size, count })
                .collect(),
            base_weight: DEFAULT_BASE_WEIGHT,
            diagonal_weight: DEFAULT_DIAGONAL_WEIGHT,
            obstacle_multiplier: DEFAULT_OBSTACLE_MULTIPLIER,
            heuristic_weight: DEFAULT_HEURISTIC_WEIGHT,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl PathfindingConfig {
    fn validate(&self) -> GeoResult<()> {
        if self.buffers.is_empty() {
            return Err(GeoError::Config("at least one path buffer class is required".into()));
        }
        if self.buffers.windows(2).any(|w| w[0].size >= w[1].size) {
            return Err(GeoError::Config("path buffer sizes must be strictly ascending".into()));
        }
        if self.buffers.iter().any(|b| b.size == 0) {
            return Err(GeoError::Config("path buffer size must be positive".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoEngineConfig {
    pub geodata_path: PathBuf,
    pub world: WorldBounds,
    /// Flags reported by cells without geodata.
    pub null_block_nswe: u8,
    /// Load is aborted when more region files than this fail to decode. `None` only warns.
    pub max_region_failures: Option<usize>,
    /// Relative paths resolve against `geodata_path`.
    pub bug_report_file: PathBuf,
    pub pathfinding: PathfindingConfig,
    pub metrics_listen: Option<SocketAddr>,
    pub stats_log_interval_secs: u64,
}

impl Default for GeoEngineConfig {
    fn default() -> Self {
        GeoEngineConfig {
            geodata_path: PathBuf::from(DEFAULT_GEODATA_PATH),
            world: WorldBounds::default(),
            null_block_nswe: NSWE_ALL,
            max_region_failures: Some(0),
            bug_report_file: PathBuf::from(DEFAULT_BUG_REPORT_FILE),
            pathfinding: PathfindingConfig::default(),
            metrics_listen: None,
            stats_log_interval_secs: DEFAULT_STATS_LOG_INTERVAL_SECS,
        }
    }
}

impl GeoEngineConfig {
    pub fn from_yaml_str(source: &str) -> GeoResult<Self> {
        let config: GeoEngineConfig = serde_yaml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> GeoResult<Self> {
        let source = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&source)
    }

    pub fn validate(&self) -> GeoResult<()> {
        self.world.validate()?;
        self.pathfinding.validate()
    }

    pub fn bug_report_path(&self) -> PathBuf {
        if self.bug_report_file.is_absolute() {
            self.bug_report_file.clone()
        } else {
            self.geodata_path.join(&self.bug_report_file)
        }
    }
}
