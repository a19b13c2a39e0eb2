// geodata_server/server/src/systems/geometry/swim.rs
use crate::core::constants::{CELL_HEIGHT, CELL_IGNORE_HEIGHT};
use crate::core::types::Location;
use crate::world::geo_grid::GeoGrid;

use super::traversal::{planar_distance, CellWalk};

/// Clips a straight swim from `origin` to `target`.
///
/// The swimmer follows a straight line in 3D (the swim line). Ground above
/// the swim line is accepted while the border is open, so the swimmer may
/// surface onto a shore; a wall whose top rises over the swim line stops the
/// swim at the border.
pub fn valid_swim_location(grid: &GeoGrid, origin: Location, target: Location) -> Location {
    if !grid.has_geo(target.x, target.y) {
        return origin;
    }

    let mut gox = grid.geo_x(origin.x);
    let mut goy = grid.geo_y(origin.y);
    let gtx = grid.geo_x(target.x);
    let gty = grid.geo_y(target.y);

    let block = grid.block(gox, goy);
    let start = block.index_below(gox, goy, origin.z + CELL_HEIGHT, None);
    if gox == gtx && goy == gty {
        return if start.is_some() && start == block.index_below(gox, goy, target.z + CELL_HEIGHT, None) {
            target
        } else {
            origin
        };
    }
    let Some(start) = start else {
        return origin;
    };

    let mut ground_z = block.height(start, None);
    let mut nswe = block.nswe(start, None);

    let dz = (target.z - origin.z) as f64;
    let mz = dz / planar_distance(origin.x, origin.y, target.x, target.y);

    let mut walk = CellWalk::new(grid, origin.x, origin.y, target.x, target.y);
    let mut last_border = (origin.x, origin.y);
    for crossing in walk.by_ref() {
        gox = crossing.geo_x;
        goy = crossing.geo_y;
        let block = grid.block(gox, goy);
        let swim_z = origin.z as f64 + mz * planar_distance(origin.x, origin.y, crossing.check_x, crossing.check_y);
        let border = Location::new(crossing.check_x, crossing.check_y, swim_z as i32);

        let open = nswe & crossing.direction != 0;
        let index = if open {
            block.index_below(gox, goy, ground_z + CELL_IGNORE_HEIGHT, None)
        } else {
            block.index_above(gox, goy, ground_z - 2 * CELL_HEIGHT, None)
        };
        let Some(index) = index else {
            return border;
        };

        let z = block.height(index, None);
        if open {
            if z as f64 >= swim_z {
                ground_z = z;
                nswe = block.nswe(index, None);
                last_border = (crossing.check_x, crossing.check_y);
                continue;
            }
        } else if z as f64 > swim_z {
            return border;
        }

        // keep swimming: follow the floor under the swim line
        let Some(index) = block.index_below(gox, goy, swim_z as i32, None) else {
            return border;
        };
        ground_z = block.height(index, None);
        nswe = block.nswe(index, None);
        last_border = (crossing.check_x, crossing.check_y);
    }

    if walk.arrived() {
        target
    } else {
        Location::new(last_border.0, last_border.1, origin.z)
    }
}
