// geodata_server/server/src/systems/geometry/traversal.rs
use crate::core::constants::CELL_SIZE;
use crate::core::types::MoveDirection;
use crate::world::geo_grid::GeoGrid;

// World coordinates fit well inside this; it keeps float-to-int casts of
// near-vertical slopes from overflowing.
const MAX_OFFSET: f64 = (1 << 28) as f64;

#[inline]
fn to_offset(value: f64) -> i32 {
    value.clamp(-MAX_OFFSET, MAX_OFFSET) as i32
}

/// One cell border crossed by a [`CellWalk`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorderCrossing {
    /// World point where the line meets the border.
    pub check_x: i32,
    pub check_y: i32,
    /// Cell entered.
    pub geo_x: i32,
    pub geo_y: i32,
    /// NSWE bit the previous cell must allow for this crossing.
    pub direction: u8,
}

/// Walks the cells under a straight line between two world points, yielding
/// every border crossing in order (a DDA over the 16 unit cell grid).
///
/// Each step moves along X when the line still lies in the current row at the
/// next X border, otherwise along Y. The walk ends on the target cell, or
/// after `|dx| + |dy| + 2` steps if rounding ever leads it astray; check
/// [`CellWalk::arrived`] afterwards.
pub struct CellWalk<'a> {
    grid: &'a GeoGrid,
    ox: i32,
    oy: i32,
    m: f64,
    direction: MoveDirection,
    grid_x: i32,
    grid_y: i32,
    geo_x: i32,
    geo_y: i32,
    target_x: i32,
    target_y: i32,
    steps_left: u32,
}

impl<'a> CellWalk<'a> {
    pub fn new(grid: &'a GeoGrid, ox: i32, oy: i32, tx: i32, ty: i32) -> Self {
        let geo_x = grid.geo_x(ox);
        let geo_y = grid.geo_y(oy);
        let target_x = grid.geo_x(tx);
        let target_y = grid.geo_y(ty);
        let dx = tx - ox;
        let dy = ty - oy;
        CellWalk {
            grid,
            ox,
            oy,
            m: dy as f64 / dx as f64,
            direction: MoveDirection::from_delta(dx, dy),
            grid_x: ox & !(CELL_SIZE - 1),
            grid_y: oy & !(CELL_SIZE - 1),
            geo_x,
            geo_y,
            target_x,
            target_y,
            steps_left: (target_x - geo_x).unsigned_abs() + (target_y - geo_y).unsigned_abs() + 2,
        }
    }

    pub fn arrived(&self) -> bool {
        self.geo_x == self.target_x && self.geo_y == self.target_y
    }

    pub fn direction(&self) -> MoveDirection {
        self.direction
    }
}

impl Iterator for CellWalk<'_> {
    type Item = BorderCrossing;

    fn next(&mut self) -> Option<BorderCrossing> {
        if self.arrived() || self.steps_left == 0 {
            return None;
        }
        self.steps_left -= 1;
        let mdt = self.direction;

        if mdt.step_x() != 0 {
            let check_x = self.grid_x + mdt.offset_x();
            let check_y = self.oy + to_offset(self.m * (check_x - self.ox) as f64);
            if self.grid.geo_y(check_y) == self.geo_y {
                self.grid_x += mdt.step_x();
                self.geo_x += mdt.signum_x();
                return Some(BorderCrossing {
                    check_x,
                    check_y,
                    geo_x: self.geo_x,
                    geo_y: self.geo_y,
                    direction: mdt.direction_x(),
                });
            }
        }

        let check_y = self.grid_y + mdt.offset_y();
        let check_x = (self.ox + to_offset((check_y - self.oy) as f64 / self.m))
            .clamp(self.grid_x, self.grid_x + CELL_SIZE - 1);
        self.grid_y += mdt.step_y();
        self.geo_y += mdt.signum_y();
        Some(BorderCrossing {
            check_x,
            check_y,
            geo_x: self.geo_x,
            geo_y: self.geo_y,
            direction: mdt.direction_y(),
        })
    }
}

/// Euclidean distance in the XY plane.
#[inline]
pub fn planar_distance(ax: i32, ay: i32, bx: i32, by: i32) -> f64 {
    ((bx - ax) as f64).hypot((by - ay) as f64)
}
