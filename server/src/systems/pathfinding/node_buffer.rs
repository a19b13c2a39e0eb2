// geodata_server/server/src/systems/pathfinding/node_buffer.rs
use crate::core::config::PathfindingConfig;
use crate::core::constants::*;
use crate::core::types::GeoLocation;
use crate::world::geo_grid::GeoGrid;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default)]
struct Node {
    loc: Option<GeoLocation>,
    parent: Option<u32>,
    cost: f64,
}

/// Open list entry. Ordered so that `BinaryHeap` pops the lowest estimate
/// first and, among equal estimates, the earliest discovered node.
#[derive(Debug, Clone, Copy)]
struct OpenNode {
    estimate: f64,
    sequence: u32,
    index: u32,
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenNode {}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .estimate
            .total_cmp(&self.estimate)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Scratch memory for one A* search: a `size` x `size` window of cells
/// placed around the origin and target.
pub struct NodeBuffer {
    size: usize,
    nodes: Box<[Node]>,
    touched: Vec<u32>,
    open: BinaryHeap<OpenNode>,
    sequence: u32,
    base_x: i32,
    base_y: i32,
    target: GeoLocation,
    last_elapsed: Duration,
}

impl NodeBuffer {
    pub fn new(size: usize) -> Self {
        NodeBuffer {
            size,
            nodes: vec![Node::default(); size * size].into_boxed_slice(),
            touched: Vec::new(),
            open: BinaryHeap::new(),
            sequence: 0,
            base_x: 0,
            base_y: 0,
            target: GeoLocation::new(0, 0, 0, NSWE_NONE),
            last_elapsed: Duration::ZERO,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Duration of the last search that ran in this buffer.
    pub fn last_elapsed(&self) -> Duration {
        self.last_elapsed
    }

    pub(crate) fn set_last_elapsed(&mut self, elapsed: Duration) {
        self.last_elapsed = elapsed;
    }

    /// Clears every node touched by the previous search.
    pub fn reset(&mut self) {
        for &index in &self.touched {
            self.nodes[index as usize] = Node::default();
        }
        self.touched.clear();
        self.open.clear();
        self.sequence = 0;
    }

    /// Runs the search from `(gox, goy, goz)` to `(gtx, gty, gtz)` and returns
    /// the index of the node that reached the target cell. The buffer is
    /// reset first, so it can be reused without an explicit release.
    #[allow(clippy::too_many_arguments)]
    pub fn find_path(
        &mut self,
        grid: &GeoGrid,
        params: &PathfindingConfig,
        gox: i32,
        goy: i32,
        goz: i32,
        gtx: i32,
        gty: i32,
        gtz: i32,
    ) -> Option<u32> {
        self.reset();
        let size = self.size as i32;
        self.base_x = gox + (gtx - gox - size) / 2;
        self.base_y = goy + (gty - goy - size) / 2;
        self.target = GeoLocation::new(gtx, gty, gtz, NSWE_NONE);

        let origin = self.slot(gox, goy)?;
        let nswe = grid.nswe_nearest(gox, goy, goz, None);
        let loc = GeoLocation::new(gox, goy, goz, nswe);
        self.discover(origin, loc, None, 0.0, params);

        let mut iterations = 0;
        while let Some(OpenNode { index, .. }) = self.open.pop() {
            let Some(current) = self.nodes[index as usize].loc else {
                continue;
            };
            if current.geo_x == gtx && current.geo_y == gty && (current.z - gtz).abs() < CELL_HEIGHT {
                return Some(index);
            }
            iterations += 1;
            if iterations > params.max_iterations {
                return None;
            }
            self.expand(grid, params, index, current);
        }
        None
    }

    /// Location of a node and of its parent, for walking the chain back from
    /// the index returned by [`NodeBuffer::find_path`].
    pub fn node(&self, index: u32) -> Option<(GeoLocation, Option<u32>)> {
        let node = self.nodes.get(index as usize)?;
        node.loc.map(|loc| (loc, node.parent))
    }

    fn slot(&self, geo_x: i32, geo_y: i32) -> Option<u32> {
        let ix = geo_x - self.base_x;
        let iy = geo_y - self.base_y;
        let size = self.size as i32;
        if ix < 0 || iy < 0 || ix >= size || iy >= size {
            return None;
        }
        Some((ix * size + iy) as u32)
    }

    fn expand(&mut self, grid: &GeoGrid, params: &PathfindingConfig, index: u32, current: GeoLocation) {
        let GeoLocation { geo_x: x, geo_y: y, z, nswe } = current;
        if nswe == NSWE_NONE {
            return;
        }
        let cost = self.nodes[index as usize].cost;

        let mut step = |dx: i32, dy: i32, diagonal: bool| -> Option<GeoLocation> {
            self.visit(grid, params, index, cost, x + dx, y + dy, z, diagonal)
        };

        let north = if nswe & NSWE_N != 0 { step(0, -1, false) } else { None };
        let south = if nswe & NSWE_S != 0 { step(0, 1, false) } else { None };
        let west = if nswe & NSWE_W != 0 { step(-1, 0, false) } else { None };
        let east = if nswe & NSWE_E != 0 { step(1, 0, false) } else { None };

        let corner = |side_x: Option<GeoLocation>, side_y: Option<GeoLocation>, flag_x: u8, flag_y: u8| {
            matches!((side_x, side_y), (Some(sx), Some(sy)) if sx.nswe & flag_y != 0 && sy.nswe & flag_x != 0)
        };

        if corner(west, north, NSWE_W, NSWE_N) {
            step(-1, -1, true);
        }
        if corner(east, north, NSWE_E, NSWE_N) {
            step(1, -1, true);
        }
        if corner(west, south, NSWE_W, NSWE_S) {
            step(-1, 1, true);
        }
        if corner(east, south, NSWE_E, NSWE_S) {
            step(1, 1, true);
        }
    }

    /// Resolves the neighbour cell on the layer reachable from `parent_z` and
    /// queues it when seen for the first time. Returns the neighbour's
    /// location whether it is new or already known.
    #[allow(clippy::too_many_arguments)]
    fn visit(
        &mut self,
        grid: &GeoGrid,
        params: &PathfindingConfig,
        parent: u32,
        parent_cost: f64,
        geo_x: i32,
        geo_y: i32,
        parent_z: i32,
        diagonal: bool,
    ) -> Option<GeoLocation> {
        if !grid.in_bounds(geo_x, geo_y) {
            return None;
        }
        let slot = self.slot(geo_x, geo_y)?;
        if let Some(known) = self.nodes[slot as usize].loc {
            return Some(known);
        }

        let block = grid.block(geo_x, geo_y);
        let index = block.index_below(geo_x, geo_y, parent_z + CELL_IGNORE_HEIGHT, None)?;
        let loc = GeoLocation::new(geo_x, geo_y, block.height(index, None), block.nswe(index, None));

        let mut weight = if diagonal { params.diagonal_weight } else { params.base_weight } as f64;
        if loc.nswe != NSWE_ALL {
            weight *= params.obstacle_multiplier as f64;
        }
        self.discover(slot, loc, Some(parent), parent_cost + weight, params);
        Some(loc)
    }

    fn discover(&mut self, slot: u32, loc: GeoLocation, parent: Option<u32>, cost: f64, params: &PathfindingConfig) {
        self.nodes[slot as usize] = Node { loc: Some(loc), parent, cost };
        self.touched.push(slot);
        let estimate = cost + self.heuristic(loc, params);
        self.open.push(OpenNode { estimate, sequence: self.sequence, index: slot });
        self.sequence = self.sequence.wrapping_add(1);
    }

    fn heuristic(&self, loc: GeoLocation, params: &PathfindingConfig) -> f64 {
        let dx = (loc.geo_x - self.target.geo_x) as f64;
        let dy = (loc.geo_y - self.target.geo_y) as f64;
        let dz = (loc.z - self.target.z) as f64 / CELL_HEIGHT as f64;
        params.heuristic_weight as f64 * (dx * dx + dy * dy + dz * dz).sqrt()
    }
}
