// geodata_server/server/src/systems/geometry/movement.rs
use crate::core::constants::CELL_IGNORE_HEIGHT;
use crate::core::types::Location;
use crate::world::geo_grid::GeoGrid;

use super::traversal::CellWalk;

/// Whether a walker can go straight from `origin` to `target`.
///
/// Every crossed border must be open in the current cell's flags and the next
/// cell must have a layer under the current height plus the step tolerance.
/// The walk must end on the layer nearest to `target.z`. Not symmetric:
/// one-way flags make A to B and B to A independent questions.
pub fn can_move(grid: &GeoGrid, origin: Location, target: Location) -> bool {
    if !grid.has_geo(target.x, target.y) {
        return false;
    }

    let gox = grid.geo_x(origin.x);
    let goy = grid.geo_y(origin.y);
    let mut goz = grid.height_nearest(gox, goy, origin.z, None);
    let gtx = grid.geo_x(target.x);
    let gty = grid.geo_y(target.y);

    if gox == gtx && goy == gty {
        return goz == grid.height_at(target);
    }

    let mut nswe = grid.nswe_nearest(gox, goy, goz, None);
    let mut walk = CellWalk::new(grid, origin.x, origin.y, target.x, target.y);
    for crossing in walk.by_ref() {
        if nswe & crossing.direction == 0 {
            return false;
        }
        let block = grid.block(crossing.geo_x, crossing.geo_y);
        let Some(index) = block.index_below(crossing.geo_x, crossing.geo_y, goz + CELL_IGNORE_HEIGHT, None) else {
            return false;
        };
        goz = block.height(index, None);
        nswe = block.nswe(index, None);
    }
    walk.arrived() && goz == grid.height_at(target)
}

/// Clips a straight walk at the first obstruction.
///
/// Returns the target (with geodata Z) when it is reached on the same floor,
/// the origin when the walk ends on another floor, and otherwise the border
/// point in front of the obstruction at the last valid height.
pub fn valid_location(grid: &GeoGrid, origin: Location, target: Location) -> Location {
    let gox = grid.geo_x(origin.x);
    let goy = grid.geo_y(origin.y);
    let mut goz = grid.height_nearest(gox, goy, origin.z, None);
    let mut nswe = grid.nswe_nearest(gox, goy, goz, None);
    let gtx = grid.geo_x(target.x);
    let gty = grid.geo_y(target.y);
    let gtz = grid.height_nearest(gtx, gty, target.z, None);

    let mut walk = CellWalk::new(grid, origin.x, origin.y, target.x, target.y);
    for crossing in walk.by_ref() {
        let blocked = Location::new(crossing.check_x, crossing.check_y, goz);
        if !grid.in_bounds(crossing.geo_x, crossing.geo_y) || nswe & crossing.direction == 0 {
            return blocked;
        }
        let block = grid.block(crossing.geo_x, crossing.geo_y);
        let Some(index) = block.index_below(crossing.geo_x, crossing.geo_y, goz + CELL_IGNORE_HEIGHT, None) else {
            return blocked;
        };
        goz = block.height(index, None);
        nswe = block.nswe(index, None);
    }

    if walk.arrived() && goz == gtz {
        Location::new(target.x, target.y, gtz)
    } else {
        origin
    }
}
