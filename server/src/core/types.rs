// geodata_server/server/src/core/types.rs
use crate::core::constants::*;
use crate::world::geo_object::GeoObject;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type ObjectId = u64;

/// World position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Location {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Location {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Location { x, y, z }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Cell coordinates with the resolved layer height and flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeoLocation {
    pub geo_x: i32,
    pub geo_y: i32,
    pub z: i32,
    pub nswe: u8,
}

impl GeoLocation {
    pub const fn new(geo_x: i32, geo_y: i32, z: i32, nswe: u8) -> Self {
        GeoLocation { geo_x, geo_y, z, nswe }
    }
}

/// Direction of a straight walk across the grid, derived from the world delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveDirection {
    N,
    S,
    W,
    E,
    NW,
    SW,
    NE,
    SE,
}

impl MoveDirection {
    pub fn from_delta(dx: i32, dy: i32) -> Self {
        if dx == 0 {
            return if dy < 0 { MoveDirection::N } else { MoveDirection::S };
        }
        if dy == 0 {
            return if dx < 0 { MoveDirection::W } else { MoveDirection::E };
        }
        match (dx > 0, dy < 0) {
            (true, true) => MoveDirection::NE,
            (true, false) => MoveDirection::SE,
            (false, true) => MoveDirection::NW,
            (false, false) => MoveDirection::SW,
        }
    }

    pub fn signum_x(self) -> i32 {
        match self {
            MoveDirection::W | MoveDirection::NW | MoveDirection::SW => -1,
            MoveDirection::E | MoveDirection::NE | MoveDirection::SE => 1,
            MoveDirection::N | MoveDirection::S => 0,
        }
    }

    pub fn signum_y(self) -> i32 {
        match self {
            MoveDirection::N | MoveDirection::NW | MoveDirection::NE => -1,
            MoveDirection::S | MoveDirection::SW | MoveDirection::SE => 1,
            MoveDirection::W | MoveDirection::E => 0,
        }
    }

    /// World step when crossing one cell border along X.
    pub fn step_x(self) -> i32 {
        self.signum_x() * CELL_SIZE
    }

    pub fn step_y(self) -> i32 {
        self.signum_y() * CELL_SIZE
    }

    /// Offset from the cell's grid corner to the border in the direction of travel.
    pub fn offset_x(self) -> i32 {
        if self.signum_x() >= 0 { CELL_SIZE - 1 } else { 0 }
    }

    pub fn offset_y(self) -> i32 {
        if self.signum_y() >= 0 { CELL_SIZE - 1 } else { 0 }
    }

    /// NSWE bit required to cross an X border.
    pub fn direction_x(self) -> u8 {
        match self.signum_x() {
            -1 => NSWE_W,
            1 => NSWE_E,
            _ => NSWE_NONE,
        }
    }

    pub fn direction_y(self) -> u8 {
        match self.signum_y() {
            -1 => NSWE_N,
            1 => NSWE_S,
            _ => NSWE_NONE,
        }
    }
}

/// Anything placed in the world that can issue or be the target of geodata queries.
pub trait MovableEntity {
    fn location(&self) -> Location;

    /// Collision height of creatures; `None` for plain objects.
    fn collision_height(&self) -> Option<f64> {
        None
    }

    /// Entities that modify geodata themselves (doors, walls) expose their obstacle here.
    fn as_geo_object(&self) -> Option<&dyn GeoObject> {
        None
    }

    fn eye_height(&self) -> f64 {
        self.collision_height().map_or(0.0, |h| h * EYE_HEIGHT_FACTOR)
    }
}

impl MovableEntity for Location {
    fn location(&self) -> Location {
        *self
    }
}
