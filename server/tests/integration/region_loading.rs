// geodata_server/server/tests/integration/region_loading.rs

use geodata_server_core::core::config::WorldBounds;
use geodata_server_core::core::constants::*;
use geodata_server_core::world::region_loader::region_file_name;
use geodata_server_core::{GeoEngine, GeoEngineConfig, GeoError};

use std::fs;
use std::path::PathBuf;

const REGION_BLOCKS: usize = 2;

struct TempGeodata {
    dir: PathBuf,
}

impl TempGeodata {
    fn new(name: &str) -> Self {
        let dir = std::env::temp_dir().join(format!("geodata_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("create temp geodata dir");
        TempGeodata { dir }
    }

    fn write(&self, tile_x: i32, tile_y: i32, bytes: &[u8]) {
        fs::write(self.dir.join(region_file_name(tile_x, tile_y)), bytes).expect("write region file");
    }

    fn config(&self, world: WorldBounds, max_region_failures: Option<usize>) -> GeoEngineConfig {
        let mut config = GeoEngineConfig {
            geodata_path: self.dir.clone(),
            world,
            max_region_failures,
            ..GeoEngineConfig::default()
        };
        config.pathfinding.buffers.truncate(1);
        config
    }
}

impl Drop for TempGeodata {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.dir);
    }
}

fn flat(height: i16) -> Vec<u8> {
    let mut bytes = vec![BLOCK_TYPE_FLAT];
    bytes.extend_from_slice(&height.to_le_bytes());
    bytes
}

fn flat_region(heights: [i16; 4]) -> Vec<u8> {
    heights.iter().flat_map(|&h| flat(h)).collect()
}

fn multilayer_bridge_block() -> Vec<u8> {
    let mut bytes = vec![BLOCK_TYPE_MULTILAYER];
    for _ in 0..BLOCK_CELLS {
        bytes.push(2);
        for height in [200i16, -100] {
            bytes.push(NSWE_ALL);
            bytes.extend_from_slice(&height.to_le_bytes());
        }
    }
    bytes
}

fn world() -> WorldBounds {
    WorldBounds::single_region(REGION_BLOCKS)
}

#[test]
fn loads_mixed_block_types() {
    let geo = TempGeodata::new("mixed");
    let mut bytes = multilayer_bridge_block();
    bytes.extend(flat(10));
    bytes.push(BLOCK_TYPE_COMPLEX);
    for cell in 0..BLOCK_CELLS {
        bytes.push(if cell == 0 { NSWE_N } else { NSWE_ALL });
        bytes.extend_from_slice(&(cell as i16).to_le_bytes());
    }
    bytes.extend(flat(30));
    geo.write(TILE_ZERO_COORD_X, TILE_ZERO_COORD_Y, &bytes);

    let engine = GeoEngine::load(geo.config(world(), Some(0))).unwrap();
    assert_eq!(engine.load_report().loaded, 1);
    assert_eq!(engine.load_report().failed_count(), 0);

    // block (0, 0): bridge over a tunnel
    assert_eq!(engine.height_nearest(3, 3, 150), 200);
    assert_eq!(engine.height_nearest(3, 3, -50), -100);
    // block (0, 1) is the second record
    assert_eq!(engine.height_nearest(2, 12, 0), 10);
    // block (1, 0): complex, cell index = cx * 8 + cy
    assert_eq!(engine.height_nearest(8, 2, 0), 2);
    assert_eq!(engine.nswe_nearest(8, 0, 0), NSWE_N);
    assert_eq!(engine.height_nearest(12, 12, 0), 30);

    let mut encoded = Vec::new();
    engine.grid().write_region(TILE_ZERO_COORD_X, TILE_ZERO_COORD_Y, &mut encoded).unwrap();
    assert_eq!(encoded, bytes);
}

#[test]
fn truncated_multilayer_fails_one_region() {
    let geo = TempGeodata::new("truncated");
    let mut bytes = vec![BLOCK_TYPE_MULTILAYER, 5];
    for height in [0i16, 50] {
        bytes.push(NSWE_ALL);
        bytes.extend_from_slice(&height.to_le_bytes());
    }
    geo.write(TILE_ZERO_COORD_X, TILE_ZERO_COORD_Y, &bytes);

    let engine = GeoEngine::load(geo.config(world(), None)).unwrap();
    assert_eq!(engine.load_report().failed_count(), 1);
    assert_eq!(engine.load_report().loaded, 0);
    for gx in 0..16 {
        for gy in 0..16 {
            assert!(!engine.has_geo_pos(gx, gy));
        }
    }
    // open space: heights pass through
    assert_eq!(engine.height_nearest(1, 1, 777), 777);
}

#[test]
fn too_many_failures_is_fatal() {
    let geo = TempGeodata::new("fatal");
    let mut bytes = flat_region([0, 0, 0, 0]);
    bytes.push(0);
    geo.write(TILE_ZERO_COORD_X, TILE_ZERO_COORD_Y, &bytes);

    match GeoEngine::load(geo.config(world(), Some(0))) {
        Err(GeoError::TooManyFailedRegions { failed, allowed }) => assert_eq!((failed, allowed), (1, 0)),
        Err(e) => panic!("unexpected error: {e}"),
        Ok(_) => panic!("load should fail"),
    }
    assert!(GeoEngine::load(geo.config(world(), Some(1))).is_ok());
}

#[test]
fn missing_regions_are_open_space() {
    let geo = TempGeodata::new("missing");
    let world = WorldBounds {
        tile_x_max: TILE_ZERO_COORD_X + 1,
        ..WorldBounds::single_region(REGION_BLOCKS)
    };
    geo.write(TILE_ZERO_COORD_X + 1, TILE_ZERO_COORD_Y, &flat_region([5, 6, 7, 8]));

    let engine = GeoEngine::load(geo.config(world, Some(0))).unwrap();
    let report = engine.load_report();
    assert_eq!((report.loaded, report.missing, report.failed_count()), (1, 1, 0));
    assert!(!engine.has_geo_pos(0, 0));
    // second tile starts at cell 16
    assert!(engine.has_geo_pos(16, 0));
    assert_eq!(engine.height_nearest(16 + 8, 0, 0), 7);
}

#[test]
fn invalid_layer_count_and_unknown_tag() {
    let geo = TempGeodata::new("invalid");
    let mut bytes = vec![BLOCK_TYPE_MULTILAYER, 0];
    bytes.resize(400, 0);
    geo.write(TILE_ZERO_COORD_X, TILE_ZERO_COORD_Y, &bytes);
    let engine = GeoEngine::load(geo.config(world(), None)).unwrap();
    assert_eq!(engine.load_report().failed_count(), 1);

    geo.write(TILE_ZERO_COORD_X, TILE_ZERO_COORD_Y, &[0x7F]);
    let engine = GeoEngine::load(geo.config(world(), None)).unwrap();
    assert!(engine.load_report().failed[0].contains("0x7F"));
}
