// geodata_server/server/src/systems/geometry/fly.rs
use crate::core::types::Location;
use crate::world::geo_grid::GeoGrid;

use super::traversal::{planar_distance, CellWalk};

/// Outcome of checking one crossed border against the flight corridor.
enum Corridor {
    Clear(i32),
    Blocked,
}

/// Checks the floor and ceiling of the cell entered at `bottom_z`. The body
/// occupies `[bottom_z, bottom_z + body_height]`.
fn corridor(grid: &GeoGrid, geo_x: i32, geo_y: i32, bottom_z: i32, body_height: i32) -> Corridor {
    let block = grid.block(geo_x, geo_y);

    let Some(floor) = block.index_below(geo_x, geo_y, bottom_z + body_height, None) else {
        return Corridor::Blocked;
    };
    let floor_z = block.height(floor, None);
    if floor_z > bottom_z {
        return Corridor::Blocked;
    }

    if let Some(ceiling) = block.index_above(geo_x, geo_y, bottom_z, None) {
        if block.height(ceiling, None) < bottom_z + body_height {
            return Corridor::Blocked;
        }
    }
    Corridor::Clear(floor_z)
}

/// Whether a flyer with `body_height` fits along the straight 3D line from
/// `origin` to `target`.
pub fn can_fly(grid: &GeoGrid, origin: Location, body_height: f64, target: Location) -> bool {
    if !grid.has_geo(target.x, target.y) {
        return false;
    }

    let mz = (target.z - origin.z) as f64 / planar_distance(origin.x, origin.y, target.x, target.y);
    let body = body_height as i32;

    let mut walk = CellWalk::new(grid, origin.x, origin.y, target.x, target.y);
    for crossing in walk.by_ref() {
        let bottom_z =
            origin.z + (mz * planar_distance(origin.x, origin.y, crossing.check_x, crossing.check_y)) as i32;
        if let Corridor::Blocked = corridor(grid, crossing.geo_x, crossing.geo_y, bottom_z, body) {
            return false;
        }
    }
    walk.arrived()
}

/// Clips a straight flight at the first border where the body does not fit,
/// returning that border point at the last valid flight height.
pub fn valid_fly_location(grid: &GeoGrid, origin: Location, body_height: f64, target: Location) -> Location {
    let mz = (target.z - origin.z) as f64 / planar_distance(origin.x, origin.y, target.x, target.y);
    let body = body_height as i32;
    let mut last_z = origin.z;
    let mut ground_z = grid.height_at(origin);

    let mut walk = CellWalk::new(grid, origin.x, origin.y, target.x, target.y);
    for crossing in walk.by_ref() {
        if !grid.in_bounds(crossing.geo_x, crossing.geo_y) {
            return Location::new(crossing.check_x, crossing.check_y, ground_z);
        }
        let bottom_z =
            origin.z + (mz * planar_distance(origin.x, origin.y, crossing.check_x, crossing.check_y)) as i32;
        match corridor(grid, crossing.geo_x, crossing.geo_y, bottom_z, body) {
            Corridor::Clear(floor_z) => ground_z = floor_z,
            Corridor::Blocked => return Location::new(crossing.check_x, crossing.check_y, last_z),
        }
        last_z = bottom_z;
    }

    if walk.arrived() {
        target
    } else {
        Location::new(origin.x, origin.y, last_z)
    }
}
