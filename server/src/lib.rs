// geodata_server/server/src/lib.rs

pub mod concurrent;
pub mod core;
pub mod operational;
pub mod server;
pub mod systems;
pub mod world;

pub use crate::core::config::GeoEngineConfig;
pub use crate::core::error::{GeoError, GeoResult};
pub use crate::core::types::{Location, MovableEntity, ObjectId};
pub use crate::server::engine::GeoEngine;
pub use crate::world::geo_object::{GeoFootprint, GeoObject, StaticGeoObject};
