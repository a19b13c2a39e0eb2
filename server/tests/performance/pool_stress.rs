// geodata_server/server/tests/performance/pool_stress.rs

use geodata_server_core::concurrent::NodeBufferPool;
use geodata_server_core::core::config::{BufferClassConfig, WorldBounds};
use geodata_server_core::core::constants::NSWE_ALL;
use geodata_server_core::world::geo_grid::GeoGrid;
use geodata_server_core::world::geodata::{Block, FlatBlock};
use geodata_server_core::{GeoEngine, GeoEngineConfig, Location};

use metrics::histogram;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn acquire_beyond_capacity_never_blocks() {
    let pool = Arc::new(NodeBufferPool::new(&[
        BufferClassConfig { size: 16, count: 2 },
        BufferClassConfig { size: 32, count: 2 },
    ]));

    let mut tasks = Vec::new();
    for worker in 0..16 {
        let pool = pool.clone();
        tasks.push(tokio::task::spawn_blocking(move || {
            let mut slowest = Duration::ZERO;
            for round in 0..200 {
                let start = Instant::now();
                let buffer = pool.acquire(8 + (worker + round) % 24, worker % 2 == 0);
                slowest = slowest.max(start.elapsed());
                assert!(buffer.is_some());
            }
            slowest
        }));
    }

    for task in tasks {
        let slowest = task.await.expect("worker panicked");
        histogram!("pool_acquire_slowest_us").record(slowest.as_micros() as f64);
        assert!(slowest < Duration::from_secs(1));
    }

    assert_eq!(pool.idle_count(), 4);
    let stats = pool.stats();
    let served: u64 = stats.iter().map(|c| c.uses).sum();
    assert!(served > 0);
    assert!(stats.iter().all(|c| c.playable_uses <= c.uses && c.playable_overflows <= c.overflows));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_searches_share_pool() {
    let world = WorldBounds::single_region(4);
    let blocks = (0..4usize).flat_map(|bx| (0..4usize).map(move |by| ((bx, by), Block::Flat(FlatBlock::new(0)))));
    let mut config = GeoEngineConfig { world, ..GeoEngineConfig::default() };
    config.pathfinding.buffers = vec![BufferClassConfig { size: 100, count: 2 }];
    let engine = Arc::new(GeoEngine::with_grid(config, GeoGrid::from_blocks(world, NSWE_ALL, blocks)));

    let mut tasks = Vec::new();
    for worker in 0..8 {
        let engine = engine.clone();
        tasks.push(tokio::task::spawn_blocking(move || {
            let mut found = 0;
            for round in 0..20 {
                let from = (worker + round) % 12;
                let origin = Location::new(engine.world_x(from), engine.world_y(1), 0);
                let target = Location::new(engine.world_x(from + 6), engine.world_y(18), 0);
                let start = Instant::now();
                if engine.find_path(origin, target, round % 2 == 0).is_some() {
                    found += 1;
                }
                histogram!("path_search_ms").record(start.elapsed().as_secs_f64() * 1000.0);
            }
            found
        }));
    }

    let mut found = 0;
    for task in tasks {
        found += task.await.expect("worker panicked");
    }

    let stats = engine.stats();
    assert_eq!(found, 160);
    assert_eq!(stats.pathfinding.success, 160);
    assert_eq!(stats.pathfinding.fail, 0);
    assert_eq!(stats.buffers[0].uses + stats.buffers[0].overflows, 160);
    assert_eq!(engine.pathfinder().pool().idle_count(), 2);
}
