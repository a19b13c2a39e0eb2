// geodata_server/server/src/core/constants.rs

// Cell geometry (world units)
pub const CELL_SIZE: i32 = 16;
pub const CELL_SIZE_SHIFT: u32 = 4;
pub const CELL_HEIGHT: i32 = 8;
/// Height delta a walker may step up or down without it counting as a wall.
pub const CELL_IGNORE_HEIGHT: i32 = CELL_HEIGHT * 6;

// Block geometry
pub const BLOCK_CELLS_X: usize = 8;
pub const BLOCK_CELLS_Y: usize = 8;
pub const BLOCK_CELLS: usize = BLOCK_CELLS_X * BLOCK_CELLS_Y;
pub const DEFAULT_REGION_BLOCKS: usize = 256;

// NSWE passability flags, one bit per direction a walker may leave the cell
pub const NSWE_E: u8 = 1 << 0;
pub const NSWE_W: u8 = 1 << 1;
pub const NSWE_S: u8 = 1 << 2;
pub const NSWE_N: u8 = 1 << 3;
pub const NSWE_SE: u8 = 1 << 4;
pub const NSWE_SW: u8 = 1 << 5;
pub const NSWE_NE: u8 = 1 << 6;
pub const NSWE_NW: u8 = 1 << 7;
pub const NSWE_NONE: u8 = 0x00;
pub const NSWE_ALL: u8 = 0xFF;

// L2D region file
pub const BLOCK_TYPE_FLAT: u8 = 0xD0;
pub const BLOCK_TYPE_COMPLEX: u8 = 0xD1;
pub const BLOCK_TYPE_MULTILAYER: u8 = 0xD2;
pub const MAX_CELL_LAYERS: u8 = 127;
/// Packed layer record: 1 byte flags followed by a little-endian i16 height.
pub const LAYER_SIZE: usize = 3;
pub const REGION_FILE_EXTENSION: &str = "l2d";

// World tiles covered by geodata; tile (20, 18) holds the world origin
pub const TILE_X_MIN: i32 = 11;
pub const TILE_X_MAX: i32 = 26;
pub const TILE_Y_MIN: i32 = 10;
pub const TILE_Y_MAX: i32 = 26;
pub const TILE_ZERO_COORD_X: i32 = 20;
pub const TILE_ZERO_COORD_Y: i32 = 18;

// Line of sight
pub const EYE_HEIGHT_FACTOR: f64 = 2.0 * 0.75;
pub const SIGHT_LINE_OFFSET: i32 = 32;

// Pathfinding defaults
pub const PATH_BUFFER_PADDING: usize = 64;
pub const DEFAULT_PATH_BUFFERS: [(usize, usize); 7] = [
    (100, 6),
    (128, 6),
    (192, 6),
    (256, 4),
    (320, 4),
    (384, 4),
    (500, 2),
];
pub const DEFAULT_BASE_WEIGHT: u32 = 10;
pub const DEFAULT_DIAGONAL_WEIGHT: u32 = 14;
pub const DEFAULT_OBSTACLE_MULTIPLIER: u32 = 10;
pub const DEFAULT_HEURISTIC_WEIGHT: u32 = 20;
pub const DEFAULT_MAX_ITERATIONS: usize = 3500;

// Operational
pub const DEFAULT_GEODATA_PATH: &str = "./data/geodata";
pub const DEFAULT_BUG_REPORT_FILE: &str = "geo_bugs.txt";
pub const DEFAULT_STATS_LOG_INTERVAL_SECS: u64 = 300;
