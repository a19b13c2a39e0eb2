// geodata_server/server/src/server/mod.rs
pub mod engine;

pub use engine::GeoEngine;
