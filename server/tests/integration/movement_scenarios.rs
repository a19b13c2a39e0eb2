// geodata_server/server/tests/integration/movement_scenarios.rs

use geodata_server_core::core::config::WorldBounds;
use geodata_server_core::core::constants::*;
use geodata_server_core::world::geo_grid::GeoGrid;
use geodata_server_core::world::geodata::{layer, Block, ComplexBlock, FlatBlock};
use geodata_server_core::{GeoEngine, GeoEngineConfig, GeoFootprint, GeoObject, Location, MovableEntity, StaticGeoObject};

use std::sync::Arc;

const BLOCKS: usize = 4;

fn config(world: WorldBounds) -> GeoEngineConfig {
    let mut config = GeoEngineConfig { world, ..GeoEngineConfig::default() };
    config.pathfinding.buffers.truncate(1);
    config
}

fn engine_with(cell: impl Fn(i32, i32) -> (u8, i32)) -> GeoEngine {
    let world = WorldBounds::single_region(BLOCKS);
    let mut blocks = Vec::new();
    for bx in 0..BLOCKS {
        for by in 0..BLOCKS {
            let mut buffer = vec![0u8; BLOCK_CELLS * LAYER_SIZE];
            for cx in 0..BLOCK_CELLS_X {
                for cy in 0..BLOCK_CELLS_Y {
                    let (nswe, height) = cell((bx * 8 + cx) as i32, (by * 8 + cy) as i32);
                    layer::write(&mut buffer, (cx * BLOCK_CELLS_Y + cy) * LAYER_SIZE, nswe, height);
                }
            }
            let block = ComplexBlock::from_buffer(buffer.into_boxed_slice()).expect("complex buffer size");
            blocks.push(((bx, by), Block::Complex(block)));
        }
    }
    GeoEngine::with_grid(config(world), GeoGrid::from_blocks(world, NSWE_ALL, blocks))
}

fn at(engine: &GeoEngine, geo_x: i32, geo_y: i32, z: i32) -> Location {
    Location::new(engine.world_x(geo_x), engine.world_y(geo_y), z)
}

#[test]
fn single_flat_block_adjacent_move() {
    let world = WorldBounds::single_region(1);
    let grid = GeoGrid::from_blocks(world, NSWE_ALL, vec![((0, 0), Block::Flat(FlatBlock::new(0)))]);
    let engine = GeoEngine::with_grid(config(world), grid);

    let origin = at(&engine, 0, 0, 0);
    let target = at(&engine, 0, 1, 0);
    assert!(engine.has_geo_pos(0, 0));
    assert!(engine.can_move(origin, target));
    assert_eq!(engine.valid_location(origin, target), Location::new(target.x, target.y, 0));
}

#[test]
fn blocking_object_cannot_be_entered_from_any_side() {
    let engine = engine_with(|_, _| (NSWE_ALL, 0));
    let object: Arc<dyn GeoObject> =
        Arc::new(StaticGeoObject::new(77, 9, 9, 0, 40, GeoFootprint::solid_with_border(1, 1)));
    engine.register_obstacle(object);

    // the object occupies cell (10, 10)
    assert!(engine.has_geo_pos(10, 10));
    assert!(engine.height_nearest(10, 10, 0) >= 40);
    let inside = at(&engine, 10, 10, 0);
    for (dx, dy) in [(-1, -1), (0, -1), (1, -1), (-1, 0), (1, 0), (-1, 1), (0, 1), (1, 1)] {
        let from = at(&engine, 10 + 3 * dx, 10 + 3 * dy, 0);
        assert!(!engine.can_move(from, inside), "entered from direction ({dx}, {dy})");
    }

    // walking past the object is still fine
    assert!(engine.can_move(at(&engine, 2, 2, 0), at(&engine, 20, 2, 0)));
}

#[test]
fn drop_off_ledge_is_one_way() {
    let engine = engine_with(|gx, _| (NSWE_ALL, if gx < 8 { 100 } else { 0 }));
    let high = at(&engine, 4, 6, 100);
    let low = at(&engine, 12, 6, 0);
    assert!(engine.can_move(high, low));
    assert!(!engine.can_move(low, high));

    let clipped = engine.valid_location(low, high);
    assert_eq!(engine.geo_x(clipped.x), 8);
    assert_eq!(clipped.z, 0);
}

#[test]
fn valid_location_snaps_to_ground() {
    let engine = engine_with(|_, _| (NSWE_ALL, 0));
    let origin = at(&engine, 3, 3, 0);
    // the only floor under the target is the ground
    let target = at(&engine, 6, 3, 200);
    assert_eq!(engine.valid_location(origin, target), Location::new(target.x, target.y, 0));
}

struct Creature {
    location: Location,
    height: f64,
}

impl MovableEntity for Creature {
    fn location(&self) -> Location {
        self.location
    }

    fn collision_height(&self) -> Option<f64> {
        Some(self.height)
    }
}

#[test]
fn line_of_sight_over_low_and_tall_walls() {
    let engine = engine_with(|gx, gy| {
        let height = match (gx, gy) {
            (10, _) => 40,
            (_, 20) => 400,
            _ => 0,
        };
        (NSWE_ALL, height)
    });

    let a = Creature { location: at(&engine, 5, 5, 0), height: 20.0 };
    let b = Creature { location: at(&engine, 15, 5, 0), height: 20.0 };
    assert!(engine.can_see_target(&a, &b));
    assert!(!engine.can_see(a.location, 0.0, b.location, 0.0, None));

    let c = Creature { location: at(&engine, 5, 25, 0), height: 20.0 };
    assert!(!engine.can_see_target(&a, &c));
}

#[test]
fn swim_and_fly_clip_at_obstruction() {
    let engine = engine_with(|gx, _| (NSWE_ALL, if gx == 16 { 0 } else { -300 }));
    let origin = at(&engine, 10, 10, -150);
    let target = at(&engine, 22, 10, -150);
    let stop = engine.valid_swim_location(origin, target);
    assert_eq!(engine.geo_x(stop.x), 15);
    assert_eq!(stop.z, -150);

    assert!(!engine.can_fly(origin, 60.0, target));
    let high = Location::new(origin.x, origin.y, 100);
    let high_target = Location::new(target.x, target.y, 100);
    assert!(engine.can_fly(high, 60.0, high_target));
    assert_eq!(engine.valid_fly_location(high, 60.0, high_target), high_target);
}
