// geodata_server/server/tests/integration/pathfinding.rs

use geodata_server_core::core::config::{BufferClassConfig, WorldBounds};
use geodata_server_core::core::constants::*;
use geodata_server_core::world::geo_grid::GeoGrid;
use geodata_server_core::world::geodata::{layer, Block, ComplexBlock};
use geodata_server_core::{GeoEngine, GeoEngineConfig, Location};

const BLOCKS: usize = 4;

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
    let mut config = GeoEngineConfig { world, ..GeoEngineConfig::default() };
    config.pathfinding.buffers = vec![
        BufferClassConfig { size: 100, count: 2 },
        BufferClassConfig { size: 128, count: 1 },
    ];
    GeoEngine::with_grid(config, GeoGrid::from_blocks(world, NSWE_ALL, blocks))
}

fn at(engine: &GeoEngine, geo_x: i32, geo_y: i32, z: i32) -> Location {
    Location::new(engine.world_x(geo_x), engine.world_y(geo_y), z)
}

fn assert_walkable(engine: &GeoEngine, origin: Location, path: &[Location]) {
    let mut from = origin;
    for &point in path {
        assert!(engine.can_move(from, point), "{from} -> {point} in {path:?}");
        from = point;
    }
}

#[test]
fn path_around_wall_is_walkable() {
    // wall along x = 12 with a gap at the bottom
    let engine = engine_with(|gx, gy| (NSWE_ALL, if gx == 12 && gy < 26 { 400 } else { 0 }));
    let origin = at(&engine, 6, 6, 0);
    let target = at(&engine, 18, 6, 0);
    assert!(!engine.can_move(origin, target));

    let path = engine.find_path(origin, target, true).expect("path around the wall");
    assert!(path.len() >= 2);
    assert_eq!(path.last(), Some(&target));
    assert!(path.iter().any(|p| engine.geo_y(p.y) >= 25));
    assert_walkable(&engine, origin, &path);
}

#[test]
fn path_through_door_gap() {
    // closed room with one door on the west side
    let room = |gx: i32, gy: i32| (8..=20).contains(&gx) && (8..=20).contains(&gy);
    let wall = |gx: i32, gy: i32| room(gx, gy) && !((9..=19).contains(&gx) && (9..=19).contains(&gy)) && (gx, gy) != (8, 14);
    let engine = engine_with(|gx, gy| (NSWE_ALL, if wall(gx, gy) { 300 } else { 0 }));

    let origin = at(&engine, 2, 2, 0);
    let target = at(&engine, 15, 15, 0);
    let path = engine.find_path(origin, target, false).expect("path through the door");
    assert_walkable(&engine, origin, &path);
    assert_eq!(path.last(), Some(&target));
}

#[test]
fn sealed_room_is_unreachable() {
    let room = |gx: i32, gy: i32| (8..=20).contains(&gx) && (8..=20).contains(&gy);
    let wall = |gx: i32, gy: i32| room(gx, gy) && !((9..=19).contains(&gx) && (9..=19).contains(&gy));
    let engine = engine_with(|gx, gy| (NSWE_ALL, if wall(gx, gy) { 300 } else { 0 }));
    let idle_before = engine.pathfinder().pool().idle_count();

    let before = engine.stats().pathfinding.fail;
    assert!(engine.find_path(at(&engine, 2, 2, 0), at(&engine, 14, 14, 0), false).is_none());
    assert_eq!(engine.stats().pathfinding.fail, before + 1);
    assert_eq!(engine.pathfinder().pool().idle_count(), idle_before);

    // the released buffer serves the next search
    let path = engine.find_path(at(&engine, 2, 2, 0), at(&engine, 2, 14, 0), false);
    assert!(path.is_some());
    assert_eq!(engine.stats().buffers[0].uses, 2);
    assert_eq!(engine.stats().buffers[0].overflows, 0);
}

#[test]
fn one_way_flags_steer_the_search() {
    // cells on column 10 cannot be left to the east, except at the bottom row
    let engine = engine_with(|gx, gy| {
        let nswe = if gx == 10 && gy < 28 { NSWE_ALL & !(NSWE_E | NSWE_NE | NSWE_SE) } else { NSWE_ALL };
        (nswe, 0)
    });
    let origin = at(&engine, 6, 6, 0);
    let target = at(&engine, 14, 6, 0);
    let path = engine.find_path(origin, target, true).expect("detour to the open row");
    assert!(path.iter().any(|p| engine.geo_y(p.y) >= 27));
    assert_walkable(&engine, origin, &path);

    // the opposite direction crosses column 10 directly
    let back = engine.find_path(target, origin, true).expect("direct path back");
    assert_eq!(back, vec![origin]);
}

#[test]
fn exhausted_pool_still_finds_paths() {
    let engine = engine_with(|_, _| (NSWE_ALL, 0));
    let pool = engine.pathfinder().pool();
    let mut held: Vec<_> = pool.acquire(101, false).into_iter().collect();
    held.extend((0..2).filter_map(|_| pool.acquire(10, false)));
    assert_eq!(held.len(), 3);
    assert!(held.iter().all(|b| !b.is_temporary()));

    let path = engine.find_path(at(&engine, 1, 1, 0), at(&engine, 9, 4, 0), true);
    assert!(path.is_some());
    drop(held);

    let stats = engine.stats();
    assert_eq!((stats.buffers[0].overflows, stats.buffers[0].playable_overflows), (1, 1));
    assert_eq!(stats.buffers[1].overflows, 1);
    assert!(engine.stats_lines()[0].starts_with("Buffer 100x100: count=2 uses=0/2"));
    assert!(engine.stats_lines()[0].ends_with("ovf=1/1"));
    assert_eq!(pool.idle_count(), 3);
}

#[test]
fn distant_target_and_missing_geodata_fail() {
    let engine = engine_with(|_, _| (NSWE_ALL, 0));
    let outside = Location::new(engine.world_x(40), engine.world_y(40), 0);
    assert!(engine.find_path(at(&engine, 1, 1, 0), outside, false).is_none());

    let lines = engine.stats_lines();
    assert_eq!(lines.last().map(String::as_str), Some("Pathfind: success=0, fail=1"));
    assert!(lines.iter().any(|l| l == "Use: playable=0 non-playable=0"));
    assert!(!lines.iter().any(|l| l.starts_with("Time (ms)")));
}
