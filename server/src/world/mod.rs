// geodata_server/server/src/world/mod.rs
pub mod geo_grid;
pub mod geo_object;
pub mod geodata;
pub mod region_loader;
