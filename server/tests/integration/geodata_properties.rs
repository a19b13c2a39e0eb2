// geodata_server/server/tests/integration/geodata_properties.rs

use geodata_server_core::core::config::WorldBounds;
use geodata_server_core::core::constants::*;
use geodata_server_core::world::geo_grid::GeoGrid;
use geodata_server_core::world::geodata::{Block, ComplexBlock, FlatBlock, MultilayerBlock};
use geodata_server_core::{GeoFootprint, GeoObject, StaticGeoObject};

use proptest::prelude::*;
use std::sync::Arc;

const BLOCKS: usize = 3;

fn complex_grid(heights: &[i16]) -> GeoGrid {
    let world = WorldBounds::single_region(BLOCKS);
    let blocks = (0..BLOCKS).flat_map(|bx| {
        (0..BLOCKS).map(move |by| {
            let height = heights[(bx * BLOCKS + by) % heights.len()] as i32;
            ((bx, by), Block::Complex(ComplexBlock::from_flat(height, NSWE_ALL)))
        })
    });
    GeoGrid::from_blocks(world, NSWE_ALL, blocks)
}

fn composited(grid: &GeoGrid, block_x: usize, block_y: usize) -> Vec<u8> {
    match &*grid.block_at(block_x, block_y) {
        Block::Dynamic(dynamic) => dynamic.state().current().to_vec(),
        Block::Complex(complex) => complex.buffer().to_vec(),
        _ => panic!("block ({block_x}, {block_y}) has no per-cell data"),
    }
}

proptest! {
    #[test]
    fn flat_block_height_ignores_position_and_z(
        height in any::<i16>(),
        geo_x in 0i32..8,
        geo_y in 0i32..8,
        z in -20_000i32..20_000,
    ) {
        let block = Block::Flat(FlatBlock::new(height));
        prop_assert_eq!(block.height_nearest(geo_x, geo_y, z, None), height as i32);
        prop_assert_eq!(block.nswe_nearest(geo_x, geo_y, z, None), NSWE_ALL);
        prop_assert_eq!(block.index_above(geo_x, geo_y, z, None).is_some(), height as i32 > z);
        prop_assert_eq!(block.index_below(geo_x, geo_y, z, None).is_some(), (height as i32) < z);
    }

    #[test]
    fn multilayer_above_and_below_never_coincide(
        top in 0i16..4000,
        gap in 1i16..2000,
        cell in 0usize..BLOCK_CELLS,
        z in -3000i32..5000,
    ) {
        let bottom = top - gap;
        let mut cells = vec![vec![(NSWE_ALL, 0i16)]; BLOCK_CELLS];
        cells[cell] = vec![(NSWE_ALL, top), (NSWE_N | NSWE_S, bottom)];
        let block = Block::Multilayer(MultilayerBlock::from_cells(&cells).expect("valid layers"));
        let geo_x = (cell / BLOCK_CELLS_Y) as i32;
        let geo_y = (cell % BLOCK_CELLS_Y) as i32;

        let above = block.index_above(geo_x, geo_y, z, None);
        let below = block.index_below(geo_x, geo_y, z, None);
        if let (Some(a), Some(b)) = (above, below) {
            prop_assert_ne!(a, b);
        }
        if let Some(a) = above {
            prop_assert!(block.height(a, None) > z);
        }
        if let Some(b) = below {
            prop_assert!(block.height(b, None) < z);
        }
        let nearest = block.height_nearest(geo_x, geo_y, z, None);
        prop_assert!(nearest == top as i32 || nearest == bottom as i32);
    }

    #[test]
    fn adding_then_removing_object_restores_blocks(
        heights in prop::collection::vec(-500i16..500, 1..4),
        geo_x in -3i32..24,
        geo_y in -3i32..24,
        width in 1usize..6,
        depth in 1usize..6,
        object_height in 1i32..200,
    ) {
        let grid = complex_grid(&heights);
        let pristine: Vec<Vec<u8>> = (0..BLOCKS * BLOCKS)
            .map(|i| composited(&grid, i / BLOCKS, i % BLOCKS))
            .collect();

        let object: Arc<dyn GeoObject> = Arc::new(StaticGeoObject::new(
            7,
            geo_x,
            geo_y,
            heights[0] as i32,
            object_height,
            GeoFootprint::solid_with_border(width, depth),
        ));
        grid.add_geo_object(&object);
        grid.remove_geo_object(&*object);

        for i in 0..BLOCKS * BLOCKS {
            prop_assert_eq!(&composited(&grid, i / BLOCKS, i % BLOCKS), &pristine[i]);
        }
    }
}
