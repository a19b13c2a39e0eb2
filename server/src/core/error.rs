// geodata_server/server/src/core/error.rs
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeoError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Unknown block type 0x{0:02X}")]
    UnknownBlockType(u8),

    #[error("Invalid layer count {count} in cell {cell}")]
    InvalidLayerCount { cell: usize, count: u8 },

    #[error("Region data truncated: {0}")]
    TruncatedRegion(String),

    #[error("Region data has {0} trailing bytes")]
    TrailingBytes(usize),

    #[error("Region {region} is malformed: {reason}")]
    RegionFormat { region: String, reason: String },

    #[error("Failed to load {failed} region files (allowed: {allowed})")]
    TooManyFailedRegions { failed: usize, allowed: usize },

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type GeoResult<T> = Result<T, GeoError>;
