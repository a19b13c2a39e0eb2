// geodata_server/server/src/systems/geometry/sight.rs
use crate::core::constants::{CELL_HEIGHT, CELL_IGNORE_HEIGHT, SIGHT_LINE_OFFSET};
use crate::core::types::{Location, MovableEntity, ObjectId};
use crate::world::geo_grid::GeoGrid;

use super::traversal::{planar_distance, CellWalk};

/// Line of sight between two entities, checked in both directions. A target
/// that is itself a geo object (a door) does not block its own visibility.
pub fn can_see_target(grid: &GeoGrid, object: &dyn MovableEntity, target: &dyn MovableEntity) -> bool {
    let origin = object.location();
    let destination = target.location();
    let origin_height = object.eye_height();
    let target_height = target.eye_height();
    let ignore = target.as_geo_object().map(|o| o.object_id());

    can_see(grid, origin, origin_height, destination, target_height, ignore)
        && can_see(grid, destination, target_height, origin, origin_height, ignore)
}

/// Line of sight from an entity to a point, using the point's own Z rather
/// than the ground below it.
pub fn can_see_location(grid: &GeoGrid, object: &dyn MovableEntity, position: Location) -> bool {
    let origin = object.location();
    let origin_height = object.eye_height();
    can_see(grid, origin, origin_height, position, 0.0, None)
        && can_see(grid, position, 0.0, origin, origin_height, None)
}

/// One-way sight check from `origin` (eye at `origin_height`) to `target`.
///
/// The walk follows the ground under the line: through an open border it
/// continues on the layer below the current ground plus the step tolerance,
/// through a wall it looks for the layer above the current ground. Sight is
/// blocked when no such layer exists or the layer rises over the sight line.
pub fn can_see(
    grid: &GeoGrid,
    origin: Location,
    origin_height: f64,
    target: Location,
    target_height: f64,
    ignore: Option<ObjectId>,
) -> bool {
    if !grid.has_geo(origin.x, origin.y) || !grid.has_geo(target.x, target.y) {
        return false;
    }

    let gox = grid.geo_x(origin.x);
    let goy = grid.geo_y(origin.y);
    let gtx = grid.geo_x(target.x);
    let gty = grid.geo_y(target.y);

    let block = grid.block(gox, goy);
    let Some(index) = block.index_below(gox, goy, origin.z + CELL_HEIGHT, ignore) else {
        return false;
    };

    if gox == gtx && goy == gty {
        return Some(index) == block.index_below(gtx, gty, target.z + CELL_HEIGHT, ignore);
    }

    let mut ground_z = block.height(index, ignore);
    let mut nswe = block.nswe(index, ignore);

    let dz = (target.z as f64 + target_height) - (origin.z as f64 + origin_height);
    let mz = dz / planar_distance(origin.x, origin.y, target.x, target.y);
    let eye_z = origin.z as f64 + origin_height + SIGHT_LINE_OFFSET as f64;

    let mut walk = CellWalk::new(grid, origin.x, origin.y, target.x, target.y);
    for crossing in walk.by_ref() {
        let block = grid.block(crossing.geo_x, crossing.geo_y);
        let sight_z = eye_z + mz * planar_distance(origin.x, origin.y, crossing.check_x, crossing.check_y);

        let index = if nswe & crossing.direction != 0 {
            block.index_below(crossing.geo_x, crossing.geo_y, ground_z + CELL_IGNORE_HEIGHT, ignore)
        } else {
            block.index_above(crossing.geo_x, crossing.geo_y, ground_z - 2 * CELL_HEIGHT, ignore)
        };
        let Some(index) = index else {
            return false;
        };

        let z = block.height(index, ignore);
        if z as f64 > sight_z {
            return false;
        }
        ground_z = z;
        nswe = block.nswe(index, ignore);
    }
    walk.arrived()
}
