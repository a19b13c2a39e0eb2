// geodata_server/server/src/systems/mod.rs
pub mod geometry;
pub mod pathfinding;
