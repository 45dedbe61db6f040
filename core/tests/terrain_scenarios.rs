use std::sync::Arc;

use worldgen::{
    BlockId, BlockRegistry, BlockTable, ChunkData, ChunkKey, ChunkRequest, NoiseField,
    TerrainClassifier, WorldDataHandler, WorldHost,
};

fn demo_world() -> TerrainClassifier {
    let mut registry = BlockRegistry::new();
    let blocks = BlockTable::register(&mut registry).expect("register blocks");
    TerrainClassifier::with_defaults(NoiseField::new(12345), blocks)
}

#[test]
fn surface_ordering_at_height_five() {
    let world = demo_world();
    let b = *world.blocks();

    // Columns of height 5 exist in this window for seed 12345
    let (x, z) = (-512..512)
        .step_by(4)
        .flat_map(|x| (-512..512).step_by(4).map(move |z| (x, z)))
        .find(|&(x, z)| world.terrain_height(x, z) == 5)
        .expect("no column with terrain height 5");

    assert_eq!(world.classify(x, 5, z), BlockId::EMPTY);
    assert_eq!(world.classify(x, 6, z), BlockId::EMPTY);
    assert_eq!(world.classify(x, 4, z), b.grass);
    let deep = world.classify(x, 1, z);
    let sample = world.sample(x, 1, z);
    if sample.is_cave {
        assert_eq!(deep, BlockId::EMPTY);
    } else {
        assert!(deep == b.dirt || deep == b.stone, "got {deep}");
    }
}

#[test]
fn layer_order_holds_everywhere() {
    let world = demo_world();
    let b = *world.blocks();

    for x in (-200..200).step_by(13) {
        for z in (-200..200).step_by(17) {
            let h = world.terrain_height(x, z);
            assert!(h > -15, "surface {h} reached bedrock at ({x}, {z})");

            assert_eq!(world.classify(x, h, z), BlockId::EMPTY);
            assert_eq!(world.classify(x, h - 1, z), b.grass);
            assert_eq!(world.classify(x, h - 2, z), b.dirt);

            for y in -15..h - 1 {
                let block = world.classify(x, y, z);
                assert_ne!(block, b.grass, "grass below the surface at ({x}, {y}, {z})");
                assert_ne!(block, b.bedrock, "bedrock above the floor at ({x}, {y}, {z})");
                if y >= h - 4 {
                    assert!(block == b.dirt || block.is_empty());
                }
                if block == b.stone {
                    assert!(world.sample(x, y, z).stone_noise > 0.1);
                }
            }
            for y in -40..-15 {
                assert_eq!(world.classify(x, y, z), b.bedrock);
            }
        }
    }
}

#[test]
fn caves_carve_out_solid_ground() {
    let world = demo_world();

    let mut carved = 0;
    for x in (-128..128).step_by(2) {
        for z in (-128..128).step_by(2) {
            let h = world.terrain_height(x, z);
            for y in -9..h - 2 {
                let sample = world.sample(x, y, z);
                if sample.cave_noise > 0.3 {
                    assert!(sample.is_cave);
                    assert_eq!(world.classify(x, y, z), BlockId::EMPTY);
                    carved += 1;
                }
            }
        }
    }
    assert!(carved > 0, "no cave voxels found");
}

#[test]
fn caves_never_reach_the_floor_or_surface() {
    let world = demo_world();
    for x in (-64..64).step_by(3) {
        for z in (-64..64).step_by(3) {
            let h = world.terrain_height(x, z);
            assert!(!world.sample(x, -10, z).is_cave);
            assert!(!world.sample(x, h - 2, z).is_cave);
        }
    }
}

struct LastChunk(Option<(ChunkKey, ChunkData)>);

impl WorldHost for LastChunk {
    fn set_chunk_data(&mut self, key: ChunkKey, data: ChunkData) {
        self.0 = Some((key, data));
    }
}

#[test]
fn chunk_requests_are_repeatable() {
    let handler = WorldDataHandler::new(Arc::new(demo_world()));
    let request = ChunkRequest::for_key(ChunkKey::new(-1, -1, 3), 32);

    let mut first = LastChunk(None);
    let mut second = LastChunk(None);
    handler.on_world_data_needed(&request, ChunkData::cube(32), &mut first);
    handler.on_world_data_needed(&request, ChunkData::cube(32), &mut second);

    let (key, data) = first.0.expect("chunk delivered");
    assert_eq!(key, request.key);
    assert_eq!(Some((key, data.clone())), second.0);

    // y from -32 to -1: bedrock floor and solid ground both present
    let b = *handler.classifier().blocks();
    assert!(data.count(b.bedrock) > 0);
    assert!(data.count(b.stone) + data.count(b.dirt) > 0);
}

#[test]
fn independent_fields_agree() {
    let a = demo_world();
    let b = demo_world();
    for x in -30..30 {
        for y in -20..10 {
            assert_eq!(a.classify(x, y, 2 * x + 1), b.classify(x, y, 2 * x + 1));
        }
    }
}
