// geodata_server/server/src/world/geodata/dynamic.rs
use crate::core::constants::{BLOCK_CELLS_X, BLOCK_CELLS_Y, CELL_IGNORE_HEIGHT, NSWE_ALL, NSWE_NONE};
use crate::core::types::ObjectId;
use crate::world::geo_object::GeoObject;
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;

use super::{complex, layer, multilayer};

/// Storage layout of a dynamic block. Flat blocks are expanded to complex on conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DynamicLayout {
    Complex,
    Multilayer,
}

impl DynamicLayout {
    fn index_nearest(self, buffer: &[u8], geo_x: i32, geo_y: i32, z: i32) -> usize {
        match self {
            DynamicLayout::Complex => complex::cell_index(geo_x, geo_y),
            DynamicLayout::Multilayer => multilayer::index_nearest(buffer, geo_x, geo_y, z),
        }
    }

    fn index_above(self, buffer: &[u8], geo_x: i32, geo_y: i32, z: i32) -> Option<usize> {
        match self {
            DynamicLayout::Complex => complex::index_above(buffer, geo_x, geo_y, z),
            DynamicLayout::Multilayer => multilayer::index_above(buffer, geo_x, geo_y, z),
        }
    }

    fn index_below(self, buffer: &[u8], geo_x: i32, geo_y: i32, z: i32) -> Option<usize> {
        match self {
            DynamicLayout::Complex => complex::index_below(buffer, geo_x, geo_y, z),
            DynamicLayout::Multilayer => multilayer::index_below(buffer, geo_x, geo_y, z),
        }
    }
}

/// Published view of a dynamic block. Readers always see one complete rebuild.
pub struct DynamicState {
    original: Arc<[u8]>,
    current: Box<[u8]>,
    object_ids: SmallVec<[ObjectId; 4]>,
}

impl DynamicState {
    /// Pristine geodata when `ignore` is one of the registered objects, composited data otherwise.
    pub fn buffer(&self, ignore: Option<ObjectId>) -> &[u8] {
        match ignore {
            Some(id) if self.object_ids.contains(&id) => &self.original,
            _ => &self.current,
        }
    }

    pub fn original(&self) -> &[u8] {
        &self.original
    }

    pub fn current(&self) -> &[u8] {
        &self.current
    }

    pub fn object_ids(&self) -> &[ObjectId] {
        &self.object_ids
    }
}

/// Block overlaid by runtime geo objects (doors, siege walls).
pub struct DynamicBlock {
    block_x: usize,
    block_y: usize,
    layout: DynamicLayout,
    objects: Mutex<Vec<Arc<dyn GeoObject>>>,
    state: ArcSwap<DynamicState>,
}

impl fmt::Debug for DynamicBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.load();
        f.debug_struct("DynamicBlock")
            .field("block_x", &self.block_x)
            .field("block_y", &self.block_y)
            .field("layout", &self.layout)
            .field("objects", &state.object_ids)
            .finish()
    }
}

impl DynamicBlock {
    pub fn new(block_x: usize, block_y: usize, layout: DynamicLayout, original: Box<[u8]>) -> Self {
        let current = original.clone();
        DynamicBlock {
            block_x,
            block_y,
            layout,
            objects: Mutex::new(Vec::new()),
            state: ArcSwap::from_pointee(DynamicState {
                original: Arc::from(original),
                current,
                object_ids: SmallVec::new(),
            }),
        }
    }

    pub fn layout(&self) -> DynamicLayout {
        self.layout
    }

    pub fn block_coords(&self) -> (usize, usize) {
        (self.block_x, self.block_y)
    }

    pub fn state(&self) -> Arc<DynamicState> {
        self.state.load_full()
    }

    /// Returns false when an object with the same id is already registered.
    pub fn add_object(&self, object: Arc<dyn GeoObject>) -> bool {
        let mut objects = self.objects.lock();
        let id = object.object_id();
        if objects.iter().any(|o| o.object_id() == id) {
            return false;
        }
        objects.push(object);
        let original = self.state.load().original.clone();
        self.publish(&objects, original);
        true
    }

    pub fn remove_object(&self, id: ObjectId) -> bool {
        let mut objects = self.objects.lock();
        let before = objects.len();
        objects.retain(|o| o.object_id() != id);
        if objects.len() == before {
            return false;
        }
        let original = self.state.load().original.clone();
        self.publish(&objects, original);
        true
    }

    /// Edits the pristine data and re-applies all registered objects on top.
    pub fn set_nswe(&self, index: usize, nswe: u8) {
        let objects = self.objects.lock();
        let mut original = self.state.load().original.to_vec();
        layer::set_nswe(&mut original, index, nswe);
        self.publish(&objects, Arc::from(original));
    }

    fn publish(&self, objects: &[Arc<dyn GeoObject>], original: Arc<[u8]>) {
        let current = rebuild(self.layout, self.block_x, self.block_y, &original, objects);
        let object_ids = objects.iter().map(|o| o.object_id()).collect();
        self.state.store(Arc::new(DynamicState { original, current, object_ids }));
    }

    pub fn index_nearest(&self, geo_x: i32, geo_y: i32, z: i32, ignore: Option<ObjectId>) -> usize {
        let state = self.state.load();
        self.layout.index_nearest(state.buffer(ignore), geo_x, geo_y, z)
    }

    pub fn index_above(&self, geo_x: i32, geo_y: i32, z: i32, ignore: Option<ObjectId>) -> Option<usize> {
        let state = self.state.load();
        self.layout.index_above(state.buffer(ignore), geo_x, geo_y, z)
    }

    pub fn index_below(&self, geo_x: i32, geo_y: i32, z: i32, ignore: Option<ObjectId>) -> Option<usize> {
        let state = self.state.load();
        self.layout.index_below(state.buffer(ignore), geo_x, geo_y, z)
    }

    pub fn height_nearest(&self, geo_x: i32, geo_y: i32, z: i32, ignore: Option<ObjectId>) -> i32 {
        let state = self.state.load();
        let buffer = state.buffer(ignore);
        layer::height(buffer, self.layout.index_nearest(buffer, geo_x, geo_y, z))
    }

    pub fn nswe_nearest(&self, geo_x: i32, geo_y: i32, z: i32, ignore: Option<ObjectId>) -> u8 {
        let state = self.state.load();
        let buffer = state.buffer(ignore);
        layer::nswe(buffer, self.layout.index_nearest(buffer, geo_x, geo_y, z))
    }

    pub fn height(&self, index: usize, ignore: Option<ObjectId>) -> i32 {
        layer::height(self.state.load().buffer(ignore), index)
    }

    pub fn nswe(&self, index: usize, ignore: Option<ObjectId>) -> u8 {
        layer::nswe(self.state.load().buffer(ignore), index)
    }

    /// Writes the pristine data; overlays are runtime state only.
    pub fn serialize<W: std::io::Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let state = self.state.load();
        match self.layout {
            DynamicLayout::Complex => complex::serialize_buffer(&state.original, writer),
            DynamicLayout::Multilayer => multilayer::serialize_buffer(&state.original, writer),
        }
    }
}

/// Composites `objects` over `original`, in registration order.
///
/// Per cell of the object footprint inside this block:
/// * `NSWE_ALL` leaves the cell untouched;
/// * a cell whose height already differs from the original belongs to an
///   earlier object and is skipped;
/// * `NSWE_NONE` marks the cell as inside the object: flags cleared, height
///   lifted to the object's top, or just under the next layer above if that
///   layer is lower than the top;
/// * any other value is ANDed into the flags, unless the cell lies on another
///   floor (height further than `CELL_IGNORE_HEIGHT` from the object base).
pub fn rebuild(
    layout: DynamicLayout,
    block_x: usize,
    block_y: usize,
    original: &[u8],
    objects: &[Arc<dyn GeoObject>],
) -> Box<[u8]> {
    let mut current = original.to_vec();

    let min_bx = (block_x * BLOCK_CELLS_X) as i32;
    let min_by = (block_y * BLOCK_CELLS_Y) as i32;
    let max_bx = min_bx + BLOCK_CELLS_X as i32;
    let max_by = min_by + BLOCK_CELLS_Y as i32;

    for object in objects {
        let min_ox = object.geo_x();
        let min_oy = object.geo_y();
        let min_oz = object.geo_z();
        let max_oz = min_oz + object.height();
        let footprint = object.footprint();

        let min_gx = min_bx.max(min_ox);
        let min_gy = min_by.max(min_oy);
        let max_gx = max_bx.min(min_ox + footprint.width() as i32);
        let max_gy = max_by.min(min_oy + footprint.depth() as i32);

        for gx in min_gx..max_gx {
            for gy in min_gy..max_gy {
                let object_nswe = footprint.get((gx - min_ox) as usize, (gy - min_oy) as usize);
                if object_nswe == NSWE_ALL {
                    continue;
                }

                let ib = layout.index_nearest(&current, gx, gy, min_oz);
                if !layer::same_height(&current, original, ib) {
                    continue;
                }

                if object_nswe == NSWE_NONE {
                    let mut z = max_oz;
                    if layout == DynamicLayout::Multilayer {
                        let floor = layer::height(&current, ib);
                        if let Some(above) = multilayer::index_above(&current, gx, gy, floor) {
                            let above_z = layer::height(&current, above);
                            if above_z <= max_oz {
                                z = above_z - CELL_IGNORE_HEIGHT;
                            }
                        }
                    }
                    layer::write(&mut current, ib, NSWE_NONE, z);
                } else {
                    let z = layer::height(&current, ib);
                    if (z - min_oz).abs() > CELL_IGNORE_HEIGHT {
                        continue;
                    }
                    current[ib] &= object_nswe;
                }
            }
        }
    }

    current.into_boxed_slice()
}
