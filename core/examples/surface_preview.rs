// Renders the top-down surface of the demo world around the origin.
// Optional arguments: seed, size.

use std::env;
use std::path::Path;

use worldgen::{BlockRegistry, BlockTable, SurfaceRegion, WorldConfig, scan_surface};

fn main() {
    let mut args = env::args().skip(1);
    let mut config = WorldConfig::default();
    if let Some(seed) = args.next() {
        config.seed = seed.parse().expect("seed must be an integer");
    }
    let size: u32 = args
        .next()
        .map(|s| s.parse().expect("size must be a positive integer"))
        .unwrap_or(256);

    let mut registry = BlockRegistry::new();
    let blocks = BlockTable::register(&mut registry).unwrap();
    let classifier = config.classifier(blocks);

    let region = SurfaceRegion {
        origin_x: -(size as i32) / 2,
        origin_z: -(size as i32) / 2,
        width: size,
        depth: size,
        y_min: config.terrain.bedrock_below - 1,
        y_max: config.terrain.height_amplitude.ceil() as i32,
    };
    let map = scan_surface(&classifier, region);
    if let Some((lo, hi)) = map.height_range() {
        println!("surface between y={} and y={}", lo, hi);
    }

    let filename = format!("surface_{}.png", config.seed);
    map.to_image(&registry).save(Path::new(&filename)).unwrap();
    println!("Saved {}", filename);
}
