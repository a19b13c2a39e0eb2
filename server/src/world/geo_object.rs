// geodata_server/server/src/world/geo_object.rs
use crate::core::constants::*;
use crate::core::types::ObjectId;

/// Placeable entity whose footprint overrides terrain passability while it is
/// registered with the grid (doors, siege walls). The grid only keeps a shared
/// reference; the owner decides when to register and unregister it.
pub trait GeoObject: Send + Sync {
    fn object_id(&self) -> ObjectId;

    /// Cell coordinates of the footprint's first cell.
    fn geo_x(&self) -> i32;
    fn geo_y(&self) -> i32;

    /// Base height of the object.
    fn geo_z(&self) -> i32;

    /// Vertical extent above `geo_z`.
    fn height(&self) -> i32;

    fn footprint(&self) -> &GeoFootprint;
}

/// Per-cell flag overrides of a geo object, X major.
///
/// `NSWE_ALL` leaves the cell as is, `NSWE_NONE` marks a cell inside the
/// object and anything else masks the terrain flags of a bordering cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoFootprint {
    width: usize,
    depth: usize,
    cells: Box<[u8]>,
}

impl GeoFootprint {
    /// `cells` holds `width * depth` flags, X major. Returns `None` on a size mismatch or empty footprint.
    pub fn from_cells(width: usize, depth: usize, cells: Vec<u8>) -> Option<Self> {
        if width == 0 || depth == 0 || cells.len() != width * depth {
            return None;
        }
        Some(GeoFootprint { width, depth, cells: cells.into_boxed_slice() })
    }

    /// Derives flags from an occupancy mask indexed `[x][y]`.
    ///
    /// Cells inside get `NSWE_NONE`. Outside cells start as `NSWE_ALL` and lose
    /// each axial direction leading into the object, and each diagonal whose
    /// corner cell or either adjacent axial cell is inside. Returns `None` for
    /// an empty or ragged mask.
    pub fn from_inside_mask(inside: &[Vec<bool>]) -> Option<Self> {
        let width = inside.len();
        let depth = inside.first().map_or(0, Vec::len);
        if depth == 0 || inside.iter().any(|column| column.len() != depth) {
            return None;
        }

        let at = |x: usize, y: usize| inside[x][y];
        let mut cells = vec![NSWE_NONE; width * depth];
        for ix in 0..width {
            for iy in 0..depth {
                if at(ix, iy) {
                    continue;
                }
                let mut nswe = NSWE_ALL;
                let east = ix + 1 < width;
                let south = iy + 1 < depth;
                let west = ix > 0;
                let north = iy > 0;

                if south && at(ix, iy + 1) {
                    nswe &= !NSWE_S;
                }
                if north && at(ix, iy - 1) {
                    nswe &= !NSWE_N;
                }
                if east && at(ix + 1, iy) {
                    nswe &= !NSWE_E;
                }
                if west && at(ix - 1, iy) {
                    nswe &= !NSWE_W;
                }
                if east && south && (at(ix + 1, iy + 1) || at(ix, iy + 1) || at(ix + 1, iy)) {
                    nswe &= !NSWE_SE;
                }
                if east && north && (at(ix + 1, iy - 1) || at(ix, iy - 1) || at(ix + 1, iy)) {
                    nswe &= !NSWE_NE;
                }
                if west && south && (at(ix - 1, iy + 1) || at(ix, iy + 1) || at(ix - 1, iy)) {
                    nswe &= !NSWE_SW;
                }
                if west && north && (at(ix - 1, iy - 1) || at(ix, iy - 1) || at(ix - 1, iy)) {
                    nswe &= !NSWE_NW;
                }
                cells[ix * depth + iy] = nswe;
            }
        }
        Some(GeoFootprint { width, depth, cells: cells.into_boxed_slice() })
    }

    /// A solid `width x depth` rectangle surrounded by a one cell border of
    /// blocking-inward flags. The footprint's first cell is the border corner.
    pub fn solid_with_border(width: usize, depth: usize) -> Self {
        let mask: Vec<Vec<bool>> = (0..width + 2)
            .map(|x| (0..depth + 2).map(|y| x > 0 && x <= width && y > 0 && y <= depth).collect())
            .collect();
        match Self::from_inside_mask(&mask) {
            Some(footprint) => footprint,
            None => GeoFootprint { width: 1, depth: 1, cells: vec![NSWE_NONE].into_boxed_slice() },
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    pub fn get(&self, ix: usize, iy: usize) -> u8 {
        self.cells[ix * self.depth + iy]
    }
}

/// Owned geo object with fixed placement.
#[derive(Debug, Clone)]
pub struct StaticGeoObject {
    id: ObjectId,
    geo_x: i32,
    geo_y: i32,
    geo_z: i32,
    height: i32,
    footprint: GeoFootprint,
}

impl StaticGeoObject {
    pub fn new(id: ObjectId, geo_x: i32, geo_y: i32, geo_z: i32, height: i32, footprint: GeoFootprint) -> Self {
        StaticGeoObject { id, geo_x, geo_y, geo_z, height, footprint }
    }
}

impl GeoObject for StaticGeoObject {
    fn object_id(&self) -> ObjectId {
        self.id
    }

    fn geo_x(&self) -> i32 {
        self.geo_x
    }

    fn geo_y(&self) -> i32 {
        self.geo_y
    }

    fn geo_z(&self) -> i32 {
        self.geo_z
    }

    fn height(&self) -> i32 {
        self.height
    }

    fn footprint(&self) -> &GeoFootprint {
        &self.footprint
    }
}
