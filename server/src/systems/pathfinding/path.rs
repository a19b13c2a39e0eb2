// geodata_server/server/src/systems/pathfinding/path.rs
use super::node_buffer::NodeBuffer;
use crate::core::types::{GeoLocation, Location};
use crate::systems::geometry::can_move;
use crate::world::geo_grid::GeoGrid;

/// Walks the parent chain back from `terminal` and keeps only the nodes where
/// the walking direction changes. The terminal node is always kept, the origin
/// never is.
pub fn construct_path(grid: &GeoGrid, buffer: &NodeBuffer, terminal: u32) -> Vec<Location> {
    let mut path = Vec::new();
    let (mut dx, mut dy) = (0, 0);
    let Some((mut current, mut parent)) = buffer.node(terminal) else {
        return path;
    };
    while let Some((previous, next_parent)) = parent.and_then(|index| buffer.node(index)) {
        let nx = previous.geo_x - current.geo_x;
        let ny = previous.geo_y - current.geo_y;
        if (nx, ny) != (dx, dy) {
            path.push(to_world(grid, current));
            dx = nx;
            dy = ny;
        }
        current = previous;
        parent = next_parent;
    }
    path.reverse();
    path
}

/// Drops every waypoint that the walker can skip by moving straight from the
/// last kept point (starting at `origin`) to the waypoint after it.
pub fn string_pull(grid: &GeoGrid, origin: Location, path: Vec<Location>) -> Vec<Location> {
    let mut points = path.into_iter();
    let Some(mut pending) = points.next() else {
        return Vec::new();
    };
    let mut anchor = origin;
    let mut pulled = Vec::new();
    for next in points {
        if !can_move(grid, anchor, next) {
            pulled.push(pending);
            anchor = pending;
        }
        pending = next;
    }
    pulled.push(pending);
    pulled
}

fn to_world(grid: &GeoGrid, loc: GeoLocation) -> Location {
    Location::new(grid.world_x(loc.geo_x), grid.world_y(loc.geo_y), loc.z)
}
