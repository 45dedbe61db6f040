use worldgen::{BlockId, BlockRegistry, BlockTable, NoiseField, TerrainClassifier};

// Print a vertical x/y slice of the demo world at z = 0.
fn main() {
    let mut registry = BlockRegistry::new();
    let blocks = BlockTable::register(&mut registry).unwrap();
    let world = TerrainClassifier::with_defaults(NoiseField::new(12345), blocks);

    let glyph = |id: BlockId| match id {
        id if id == blocks.grass => '"',
        id if id == blocks.dirt => ':',
        id if id == blocks.stone => '#',
        id if id == blocks.bedrock => '=',
        _ => ' ',
    };

    for y in (-18..12).rev() {
        let row: String = (-60..60).map(|x| glyph(world.classify(x, y, 0))).collect();
        println!("{:>4} |{}|", y, row);
    }
}
