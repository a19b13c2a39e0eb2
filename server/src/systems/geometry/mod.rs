// geodata_server/server/src/systems/geometry/mod.rs
pub mod fly;
pub mod movement;
pub mod sight;
pub mod swim;
pub mod traversal;

pub use fly::{can_fly, valid_fly_location};
pub use movement::{can_move, valid_location};
pub use sight::{can_see, can_see_location, can_see_target};
pub use swim::valid_swim_location;
